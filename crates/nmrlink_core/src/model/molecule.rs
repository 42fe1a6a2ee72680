//! Structure-side atom descriptor.
//!
//! The structure editor owns the molecule; the engine only sees this flat
//! projection of one atom, handed over on hover/click.

use serde::{Deserialize, Serialize};

use super::axis::AtomGroupId;

/// Projection of one structure atom used for cross-domain resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomDescriptor {
    /// Atom group id (diaID) of the atom itself.
    pub id: AtomGroupId,
    /// Element symbol, e.g. `C`.
    pub element: String,
    /// Number of symmetry-equivalent atoms sharing `id`.
    pub equivalent_count: u32,
    /// Atom group ids of the attached hydrogens (empty for none).
    #[serde(default)]
    pub hydrogen_ids: Vec<AtomGroupId>,
    /// Hydrogens attached to each atom of the group.
    #[serde(default)]
    pub hydrogen_count: u32,
}

impl AtomDescriptor {
    /// Creates a descriptor without attached hydrogens.
    pub fn new(
        id: impl Into<AtomGroupId>,
        element: impl Into<String>,
        equivalent_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            element: element.into(),
            equivalent_count,
            hydrogen_ids: Vec::new(),
            hydrogen_count: 0,
        }
    }

    /// Attaches hydrogen group ids and the per-atom hydrogen count.
    pub fn with_hydrogens(
        mut self,
        hydrogen_ids: impl IntoIterator<Item = impl Into<AtomGroupId>>,
        hydrogen_count: u32,
    ) -> Self {
        self.hydrogen_ids = hydrogen_ids.into_iter().map(Into::into).collect();
        self.hydrogen_count = hydrogen_count;
        self
    }

    pub fn has_hydrogens(&self) -> bool {
        !self.hydrogen_ids.is_empty() && self.hydrogen_count > 0
    }
}
