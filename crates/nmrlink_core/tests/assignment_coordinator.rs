use nmrlink_core::{
    ActiveAssignmentTarget, AssignmentError, AssignmentService, Axis, InMemoryAssignmentRepository,
    StoredAssignment, ToggleOutcome,
};

fn service() -> AssignmentService<InMemoryAssignmentRepository> {
    AssignmentService::new(InMemoryAssignmentRepository::new())
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn assert_single_owner(service: &AssignmentService<InMemoryAssignmentRepository>, id: &str) {
    let owners = service.owners_of(id);
    assert!(owners.len() <= 1, "{id} owned by {owners:?}");
}

#[test]
fn activate_is_idempotent_and_replaces_previous_target() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("range-a", Axis::X));
    service.activate(ActiveAssignmentTarget::new("range-a", Axis::X));
    assert_eq!(
        service.active_target(),
        Some(&ActiveAssignmentTarget::new("range-a", Axis::X))
    );

    service.activate(ActiveAssignmentTarget::new("zone-b", Axis::Y));
    assert_eq!(
        service.active_target().map(|t| t.entity_id.as_str()),
        Some("zone-b")
    );

    service.deactivate();
    assert!(!service.has_active_target());
    assert_eq!(
        service.toggle_atom("c1", 1).expect("no-op"),
        ToggleOutcome::Skipped
    );
}

#[test]
fn toggle_twice_restores_previous_list() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("range-a", Axis::X));
    service.toggle_atom("h1", 2).expect("seed");
    let before = service.assigned_ids("range-a", Axis::X);

    let added = service.toggle_atom("h2", 3).expect("add");
    assert!(matches!(added, ToggleOutcome::Added { occurrences: 3, .. }));
    assert_eq!(
        service.assigned_ids("range-a", Axis::X),
        ids(&["h1", "h1", "h2", "h2", "h2"])
    );

    let removed = service.toggle_atom("h2", 3).expect("remove");
    assert!(matches!(removed, ToggleOutcome::Removed { occurrences: 3, .. }));
    assert_eq!(service.assigned_ids("range-a", Axis::X), before);
}

#[test]
fn conflicting_toggle_is_rejected_without_mutation() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("range-a", Axis::X));
    service.toggle_atom("c1", 1).expect("assign to A");
    let snapshot = service.snapshot();

    service.activate(ActiveAssignmentTarget::new("range-b", Axis::X));
    let err = service.toggle_atom("c1", 1).expect_err("conflict");
    assert_eq!(
        err,
        AssignmentError::Conflict {
            atom_group_id: "c1".to_string(),
            owner: "range-a".to_string(),
            owner_axis: Axis::X,
        }
    );

    assert_eq!(service.snapshot(), snapshot);
    assert!(service.entry("range-b").is_none());
    assert_single_owner(&service, "c1");
}

#[test]
fn other_axis_of_same_entity_counts_as_conflict() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("zone-a", Axis::X));
    service.toggle_atom("c1", 1).expect("x assignment");

    service.activate(ActiveAssignmentTarget::new("zone-a", Axis::Y));
    let err = service.toggle_atom("c1", 1).expect_err("axis conflict");
    assert!(matches!(err, AssignmentError::Conflict { owner_axis: Axis::X, .. }));
    assert!(service.assigned_ids("zone-a", Axis::Y).is_empty());
}

#[test]
fn multi_group_click_is_all_or_nothing() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("range-a", Axis::X));
    service.toggle_atom("h2", 1).expect("h2 on A");

    service.activate(ActiveAssignmentTarget::new("range-b", Axis::X));
    let err = service
        .toggle_atoms(&ids(&["h1", "h2", "h3"]), 3)
        .expect_err("h2 conflicts");
    assert!(matches!(err, AssignmentError::Conflict { ref atom_group_id, .. } if atom_group_id == "h2"));
    assert!(service.assigned_ids("range-b", Axis::X).is_empty());

    service
        .toggle_atoms(&ids(&["h4", "h5", "h6"]), 3)
        .expect("free groups");
    assert_eq!(
        service.assigned_ids("range-b", Axis::X),
        ids(&["h4", "h5", "h6"])
    );

    let removed = service
        .toggle_atoms(&ids(&["h4", "h5", "h6"]), 3)
        .expect("toggle off");
    assert!(matches!(removed, ToggleOutcome::Removed { .. }));
    assert!(service.entry("range-b").is_none());
}

#[test]
fn empty_click_payload_is_unassignable() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("range-a", Axis::X));
    let err = service.toggle_atoms(&[], 0).expect_err("unassignable");
    assert_eq!(err, AssignmentError::Unassignable);
    assert!(service.entries().is_empty());
}

#[test]
fn purge_removes_nested_entries_and_disarms_target() {
    let mut service = service();
    service.activate(ActiveAssignmentTarget::new("zone-a", Axis::X));
    service.toggle_atom("c1", 1).expect("zone x");
    service.activate(ActiveAssignmentTarget::new("sig-1", Axis::Y).nested_in("zone-a"));
    service.toggle_atom("h1", 1).expect("signal y");
    service.activate(ActiveAssignmentTarget::new("zone-b", Axis::X));
    service.toggle_atom("c2", 1).expect("zone b");
    service.activate(ActiveAssignmentTarget::new("sig-1", Axis::Y).nested_in("zone-a"));

    let mut purged = service.purge_entity("zone-a");
    purged.sort();
    assert_eq!(purged, ids(&["sig-1", "zone-a"]));
    assert!(!service.has_active_target());
    assert!(service.owners_of("c1").is_empty());
    assert!(service.owners_of("h1").is_empty());
    assert_eq!(service.owners_of("c2"), vec![("zone-b".to_string(), Axis::X)]);
}

#[test]
fn load_drops_occurrences_violating_single_owner() {
    let mut service = service();
    let dropped = service
        .load(vec![
            StoredAssignment {
                entity_id: "range-a".to_string(),
                parent_id: None,
                axis: Axis::X,
                dia_ids: ids(&["h1", "h1"]),
            },
            StoredAssignment {
                entity_id: "range-b".to_string(),
                parent_id: None,
                axis: Axis::X,
                dia_ids: ids(&["h1", "h2"]),
            },
        ])
        .expect("load");

    assert_eq!(dropped, 1);
    assert_eq!(service.assigned_ids("range-a", Axis::X), ids(&["h1", "h1"]));
    assert_eq!(service.assigned_ids("range-b", Axis::X), ids(&["h2"]));
    assert_single_owner(&service, "h1");
}

#[test]
fn single_owner_holds_across_a_click_sequence() {
    let mut service = service();
    let targets = [
        ActiveAssignmentTarget::new("range-a", Axis::X),
        ActiveAssignmentTarget::new("range-b", Axis::X),
        ActiveAssignmentTarget::new("zone-c", Axis::Y),
    ];
    let groups = ["c1", "c2", "h1", "h2"];

    for step in 0..24 {
        service.activate(targets[step % targets.len()].clone());
        let _ = service.toggle_atom(groups[(step * 7) % groups.len()], 1 + (step % 3) as u32);
        for group in groups {
            assert_single_owner(&service, group);
        }
    }
}
