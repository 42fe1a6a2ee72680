use nmrlink_core::{HighlightError, HighlightKind, HighlightSource, HighlightStore};

#[test]
fn hover_set_is_union_of_observers() {
    let mut store = HighlightStore::new();
    let spectrum = store.register();
    let molecule = store.register();

    store.show(spectrum, ["k1", "k2"], None).unwrap();
    store.show(molecule, ["k2", "k3"], None).unwrap();
    assert_eq!(
        store.highlighted_keys().into_iter().collect::<Vec<_>>(),
        vec!["k1", "k2", "k3"]
    );

    store.hide(spectrum, ["k2"]).unwrap();
    assert!(store.is_active("k2"), "still shown by the molecule observer");
    store.hide_all(molecule).unwrap();
    assert!(!store.is_active("k2"));
    assert!(store.is_active("k1"));
}

#[test]
fn releasing_an_observer_drops_its_hover_and_pin() {
    let mut store = HighlightStore::new();
    let observer = store.register();
    let other = store.register();

    store.show(observer, ["k1", "k2"], None).unwrap();
    assert!(store.pin(observer, ["k1", "k2"]).unwrap());
    store.show(other, ["k9"], None).unwrap();

    store.release(observer).unwrap();
    assert!(!store.is_active("k1"));
    assert!(!store.is_active("k2"));
    assert!(!store.is_active_permanently("k1"));
    assert!(!store.is_active_permanently("k2"));
    assert!(store.is_active("k9"));
    assert_eq!(store.observer_count(), 1);

    let err = store.show(observer, ["k1"], None).unwrap_err();
    assert_eq!(err, HighlightError::UnknownObserver(observer));
}

#[test]
fn pinning_same_group_twice_unpins() {
    let mut store = HighlightStore::new();
    let observer = store.register();

    assert!(store.pin(observer, ["range-1", "h1"]).unwrap());
    assert!(store.is_active_permanently("h1"));
    assert!(!store.is_active("h1"), "pin does not imply hover");

    assert!(store.pin(observer, ["range-2"]).unwrap());
    assert!(!store.is_active_permanently("range-1"));
    assert!(store.is_active_permanently("range-2"));

    assert!(!store.pin(observer, ["range-2"]).unwrap());
    assert!(store.pinned_keys().is_empty());
}

#[test]
fn source_follows_the_latest_hover() {
    let mut store = HighlightStore::new();
    let observer = store.register();

    store
        .show(
            observer,
            ["range-1", "h1"],
            Some(HighlightSource::entity(HighlightKind::Range, "range-1")),
        )
        .unwrap();
    let source = store.source().expect("source set");
    assert_eq!(source.kind, HighlightKind::Range);
    assert_eq!(source.entity_id.as_deref(), Some("range-1"));

    store.hide_all(observer).unwrap();
    assert!(store.source().is_none());
}

#[test]
fn forgetting_keys_scrubs_hover_pin_and_source() {
    let mut store = HighlightStore::new();
    let observer = store.register();
    store
        .show(
            observer,
            ["zone-1", "c1"],
            Some(HighlightSource::entity(HighlightKind::Zone, "zone-1")),
        )
        .unwrap();
    store.pin(observer, ["zone-1"]).unwrap();

    store.forget_keys(&["zone-1".to_string()]);
    assert!(!store.is_active("zone-1"));
    assert!(store.is_active("c1"));
    assert!(store.pinned_keys().is_empty());
    assert!(store.source().is_none());
}

#[test]
fn releasing_an_observer_strips_its_keys_from_a_foreign_pin() {
    let mut store = HighlightStore::new();
    let spectrum = store.register();
    let molecule = store.register();

    store.show(spectrum, ["k1", "k2"], None).unwrap();
    assert!(store.pin(molecule, ["k1", "k2", "k3"]).unwrap());

    store.release(spectrum).unwrap();
    assert!(!store.is_active_permanently("k1"));
    assert!(!store.is_active_permanently("k2"));
    assert!(store.is_active_permanently("k3"));

    let other = store.register();
    store.show(other, ["k3"], None).unwrap();
    store.release(other).unwrap();
    assert!(store.pinned_keys().is_empty());
}
