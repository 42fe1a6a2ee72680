//! Cross-domain resolution between structure atoms and spectral entities.
//!
//! # Responsibility
//! - Turn a hovered/clicked atom into the atom-group ids relevant for the
//!   active nucleus.
//! - Turn hovered atom groups into the spectral entities that own them.
//! - Turn a hovered spectral entity into the atom groups it owns.
//!
//! # Invariants
//! - Resolution is read-only; nothing here mutates the store or document.
//! - Entries whose owner is missing from the document are skipped silently.

use crate::model::assignment::{AssignmentEntry, HighlightedTarget};
use crate::model::axis::{AtomGroupId, Axis, SpectralEntityId};
use crate::model::document::{EntityLocation, SpectralDocument};
use crate::model::molecule::AtomDescriptor;
use crate::model::nucleus::NucleusContext;

/// Atom groups selected by one atom event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedAtoms {
    pub ocl_ids: Vec<AtomGroupId>,
    pub nb_atoms: u32,
}

impl ExtractedAtoms {
    /// Empty result signals "not assignable".
    pub fn is_assignable(&self) -> bool {
        !self.ocl_ids.is_empty()
    }
}

/// Resolves the atom groups an atom stands for under the active nucleus.
///
/// Policy, first match wins:
/// 1. nucleus on `axis` is the atom's own element: the atom itself;
/// 2. nucleus on `axis` is hydrogen and the atom carries hydrogens: those;
/// 3. no axis: atom plus hydrogens with summed count;
/// 4. otherwise nothing.
pub fn extract_from_atom(
    atom: &AtomDescriptor,
    context: &NucleusContext,
    axis: Option<Axis>,
) -> ExtractedAtoms {
    let hydrogen_atoms = atom.equivalent_count.saturating_mul(atom.hydrogen_count);
    let Some(axis) = axis else {
        let mut ocl_ids = vec![atom.id.clone()];
        ocl_ids.extend(atom.hydrogen_ids.iter().cloned());
        return ExtractedAtoms {
            ocl_ids,
            nb_atoms: atom.equivalent_count.saturating_add(hydrogen_atoms),
        };
    };
    let Some(nucleus) = context.nucleus(axis) else {
        return ExtractedAtoms::default();
    };

    if nucleus.element == atom.element {
        ExtractedAtoms {
            ocl_ids: vec![atom.id.clone()],
            nb_atoms: atom.equivalent_count,
        }
    } else if nucleus.is_hydrogen() && atom.has_hydrogens() {
        ExtractedAtoms {
            ocl_ids: atom.hydrogen_ids.clone(),
            nb_atoms: hydrogen_atoms,
        }
    } else {
        ExtractedAtoms::default()
    }
}

/// Finds an entity among top-level records first, then nested signals.
pub fn locate(document: &SpectralDocument, entity_id: &str) -> Option<EntityLocation> {
    document.locate(entity_id)
}

/// Entities (and parents of nested signals) owning any hovered atom group.
///
/// Result keeps first-seen order and holds no duplicates.
pub fn highlights_on_hover<'a>(
    hovered: &[AtomGroupId],
    entries: impl IntoIterator<Item = (&'a SpectralEntityId, &'a AssignmentEntry)>,
    document: &SpectralDocument,
) -> Vec<SpectralEntityId> {
    let mut highlights: Vec<SpectralEntityId> = Vec::new();
    if hovered.is_empty() {
        return highlights;
    }
    for (entity_id, entry) in entries {
        if !entry.intersects(hovered) {
            continue;
        }
        let Some(location) = document.locate(entity_id) else {
            continue;
        };
        push_unique(&mut highlights, entity_id.clone());
        if let Some(parent_id) = location.parent_id() {
            push_unique(&mut highlights, parent_id.clone());
        }
    }
    highlights
}

/// Atom groups to highlight for a hovered entity.
///
/// With an axis, that axis's list only; otherwise both axes merged.
pub fn current_dia_ids_to_highlight(
    target: &HighlightedTarget,
    entry: Option<&AssignmentEntry>,
) -> Vec<AtomGroupId> {
    let Some(entry) = entry else {
        return Vec::new();
    };
    match target.axis {
        Some(axis) => entry.axis(axis).to_vec(),
        None => entry.union(),
    }
}

/// Key set a renderer registers for a hovered entity: the entity id first,
/// then its assigned atom groups.
pub fn entity_highlight_keys(
    target: &HighlightedTarget,
    entry: Option<&AssignmentEntry>,
) -> Vec<String> {
    let mut keys = vec![target.entity_id.clone()];
    for id in current_dia_ids_to_highlight(target, entry) {
        push_unique(&mut keys, id);
    }
    keys
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::{current_dia_ids_to_highlight, entity_highlight_keys, extract_from_atom};
    use crate::model::assignment::{AssignmentEntry, HighlightedTarget};
    use crate::model::axis::Axis;
    use crate::model::molecule::AtomDescriptor;
    use crate::model::nucleus::NucleusContext;

    #[test]
    fn axis_in_missing_dimension_is_not_assignable() {
        let context = NucleusContext::parse("1H").expect("1H");
        let atom = AtomDescriptor::new("c1", "C", 1).with_hydrogens(["h1"], 1);
        let extracted = extract_from_atom(&atom, &context, Some(Axis::Y));
        assert!(!extracted.is_assignable());
        assert_eq!(extracted.nb_atoms, 0);
    }

    #[test]
    fn entity_keys_start_with_entity_id() {
        let mut entry = AssignmentEntry::new(None);
        entry.set_axis(Axis::X, vec!["c1".into()]);
        entry.set_axis(Axis::Y, vec!["h1".into(), "h1".into()]);

        let both = HighlightedTarget::new("zone-1", None);
        assert_eq!(entity_highlight_keys(&both, Some(&entry)), vec!["zone-1", "c1", "h1"]);

        let y_only = HighlightedTarget::new("zone-1", Some(Axis::Y));
        assert_eq!(
            current_dia_ids_to_highlight(&y_only, Some(&entry)),
            vec!["h1", "h1"]
        );
        assert!(current_dia_ids_to_highlight(&y_only, None).is_empty());
    }
}
