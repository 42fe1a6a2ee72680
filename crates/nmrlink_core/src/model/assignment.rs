//! Assignment domain model.
//!
//! # Responsibility
//! - Define the per-entity atom-group lists stored by the assignment store.
//! - Define the armed (active) and hovered (highlighted) target pointers.
//!
//! # Invariants
//! - Repeated ids inside one axis list encode stoichiometric atom count.
//! - An entry with both axis lists empty is never stored.
//! - Targets hold ids only; no back-pointers into the document.

use super::axis::{AtomGroupId, Axis, SpectralEntityId};

/// Atom-group lists assigned to one spectral entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentEntry {
    /// Parent range/zone id when the owner is a nested signal.
    pub parent_id: Option<SpectralEntityId>,
    pub x: Vec<AtomGroupId>,
    pub y: Vec<AtomGroupId>,
}

impl AssignmentEntry {
    pub fn new(parent_id: Option<SpectralEntityId>) -> Self {
        Self {
            parent_id,
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    /// Returns the list for one axis.
    pub fn axis(&self, axis: Axis) -> &[AtomGroupId] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Replaces the list for one axis as a whole value.
    pub fn set_axis(&mut self, axis: Axis, ids: Vec<AtomGroupId>) {
        match axis {
            Axis::X => self.x = ids,
            Axis::Y => self.y = ids,
        }
    }

    /// Returns whether `id` occurs on `axis`.
    pub fn contains(&self, axis: Axis, id: &str) -> bool {
        self.axis(axis).iter().any(|candidate| candidate == id)
    }

    /// Returns whether any axis list intersects `ids`.
    pub fn intersects(&self, ids: &[AtomGroupId]) -> bool {
        Axis::ALL
            .iter()
            .any(|axis| self.axis(*axis).iter().any(|id| ids.contains(id)))
    }

    /// Union of both axes, first-seen order, duplicates removed.
    pub fn union(&self) -> Vec<AtomGroupId> {
        let mut merged: Vec<AtomGroupId> = Vec::with_capacity(self.x.len() + self.y.len());
        for id in self.x.iter().chain(self.y.iter()) {
            if !merged.contains(id) {
                merged.push(id.clone());
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }
}

/// The entity/axis currently armed to receive atom clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAssignmentTarget {
    pub entity_id: SpectralEntityId,
    pub axis: Axis,
    /// Parent range/zone id when the target is a nested signal.
    pub parent_id: Option<SpectralEntityId>,
}

impl ActiveAssignmentTarget {
    pub fn new(entity_id: impl Into<SpectralEntityId>, axis: Axis) -> Self {
        Self {
            entity_id: entity_id.into(),
            axis,
            parent_id: None,
        }
    }

    /// Marks the target as a signal nested under `parent_id`.
    pub fn nested_in(mut self, parent_id: impl Into<SpectralEntityId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Returns whether deleting `entity_id` invalidates this target.
    pub fn is_owned_by(&self, entity_id: &str) -> bool {
        self.entity_id == entity_id || self.parent_id.as_deref() == Some(entity_id)
    }
}

/// Transient hover pointer; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedTarget {
    pub entity_id: SpectralEntityId,
    /// `None` means both axes of the entity.
    pub axis: Option<Axis>,
}

impl HighlightedTarget {
    pub fn new(entity_id: impl Into<SpectralEntityId>, axis: Option<Axis>) -> Self {
        Self {
            entity_id: entity_id.into(),
            axis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveAssignmentTarget, AssignmentEntry};
    use crate::model::axis::Axis;

    #[test]
    fn union_keeps_first_seen_order_without_duplicates() {
        let mut entry = AssignmentEntry::new(None);
        entry.set_axis(Axis::X, vec!["c1".into(), "c1".into(), "c2".into()]);
        entry.set_axis(Axis::Y, vec!["h1".into(), "c2".into()]);

        assert_eq!(entry.union(), vec!["c1", "c2", "h1"]);
        assert!(entry.intersects(&["h1".to_string()]));
        assert!(!entry.intersects(&["h9".to_string()]));
    }

    #[test]
    fn nested_target_is_owned_by_parent() {
        let target = ActiveAssignmentTarget::new("signal-1", Axis::X).nested_in("range-1");
        assert!(target.is_owned_by("signal-1"));
        assert!(target.is_owned_by("range-1"));
        assert!(!target.is_owned_by("range-2"));
    }
}
