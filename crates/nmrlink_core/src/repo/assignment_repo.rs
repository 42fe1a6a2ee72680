//! Assignment store contracts and in-memory implementation.
//!
//! # Responsibility
//! - Hold the flat `entity id -> per-axis atom-group list` map.
//! - Apply whole-value replacements so readers only see committed states.
//!
//! # Invariants
//! - Entries are created lazily on the first non-empty list.
//! - An entry whose axis lists are both empty is dropped immediately.
//! - A nested signal entry keeps the parent id it was created with.
//!
//! Ownership (one pair per atom group) is validated one layer up, in
//! `AssignmentService`; this store only persists what it is given.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::assignment::AssignmentEntry;
use crate::model::axis::{AtomGroupId, Axis, SpectralEntityId};

pub type RepoResult<T> = Result<T, RepoError>;

/// Assignment store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// Entity id is blank after trim.
    InvalidEntityId,
    /// Atom group id is blank after trim.
    InvalidAtomGroupId,
    /// Entry already exists under a different parent.
    ParentMismatch {
        entity_id: SpectralEntityId,
        stored: Option<SpectralEntityId>,
        requested: Option<SpectralEntityId>,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntityId => write!(f, "entity id must not be blank"),
            Self::InvalidAtomGroupId => write!(f, "atom group id must not be blank"),
            Self::ParentMismatch {
                entity_id,
                stored,
                requested,
            } => write!(
                f,
                "entry {entity_id} is stored under parent {stored:?}, not {requested:?}"
            ),
        }
    }
}

impl Error for RepoError {}

/// Immutable copy of the whole store at one point in time.
pub type AssignmentSnapshot = BTreeMap<SpectralEntityId, AssignmentEntry>;

/// Store interface for assignment entries.
pub trait AssignmentRepository {
    fn get_entry(&self, entity_id: &str) -> Option<&AssignmentEntry>;
    fn list_entries(&self) -> Vec<(&SpectralEntityId, &AssignmentEntry)>;
    /// Replaces one axis list as a whole value, creating or dropping the entry.
    fn replace_axis(
        &mut self,
        entity_id: &str,
        parent_id: Option<&str>,
        axis: Axis,
        ids: Vec<AtomGroupId>,
    ) -> RepoResult<()>;
    /// Removes the entry of `entity_id` and every entry nested under it.
    fn purge_owned_by(&mut self, entity_id: &str) -> Vec<SpectralEntityId>;
    fn snapshot(&self) -> AssignmentSnapshot;
}

/// In-memory assignment store; one instance per open document.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssignmentRepository {
    entries: BTreeMap<SpectralEntityId, AssignmentEntry>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssignmentRepository for InMemoryAssignmentRepository {
    fn get_entry(&self, entity_id: &str) -> Option<&AssignmentEntry> {
        self.entries.get(entity_id)
    }

    fn list_entries(&self) -> Vec<(&SpectralEntityId, &AssignmentEntry)> {
        self.entries.iter().collect()
    }

    fn replace_axis(
        &mut self,
        entity_id: &str,
        parent_id: Option<&str>,
        axis: Axis,
        ids: Vec<AtomGroupId>,
    ) -> RepoResult<()> {
        let entity_id = entity_id.trim();
        if entity_id.is_empty() {
            return Err(RepoError::InvalidEntityId);
        }
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err(RepoError::InvalidAtomGroupId);
        }

        let mut next = match self.entries.get(entity_id) {
            Some(current) => {
                if parent_id.is_some() && current.parent_id.as_deref() != parent_id {
                    return Err(RepoError::ParentMismatch {
                        entity_id: entity_id.to_string(),
                        stored: current.parent_id.clone(),
                        requested: parent_id.map(str::to_string),
                    });
                }
                current.clone()
            }
            None if ids.is_empty() => return Ok(()),
            None => AssignmentEntry::new(parent_id.map(str::to_string)),
        };

        next.set_axis(axis, ids);
        if next.is_empty() {
            self.entries.remove(entity_id);
        } else {
            self.entries.insert(entity_id.to_string(), next);
        }
        Ok(())
    }

    fn purge_owned_by(&mut self, entity_id: &str) -> Vec<SpectralEntityId> {
        let doomed: Vec<SpectralEntityId> = self
            .entries
            .iter()
            .filter(|(id, entry)| {
                id.as_str() == entity_id || entry.parent_id.as_deref() == Some(entity_id)
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &doomed {
            self.entries.remove(id);
        }
        doomed
    }

    fn snapshot(&self) -> AssignmentSnapshot {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentRepository, InMemoryAssignmentRepository, RepoError};
    use crate::model::axis::Axis;

    #[test]
    fn entries_are_created_lazily_and_dropped_when_empty() {
        let mut repo = InMemoryAssignmentRepository::new();
        repo.replace_axis("range-1", None, Axis::X, Vec::new())
            .expect("empty write");
        assert!(repo.is_empty());

        repo.replace_axis("range-1", None, Axis::X, vec!["c1".into()])
            .expect("first write");
        assert_eq!(repo.len(), 1);

        repo.replace_axis("range-1", None, Axis::X, Vec::new())
            .expect("clear write");
        assert!(repo.get_entry("range-1").is_none());
    }

    #[test]
    fn rejects_parent_change_for_existing_entry() {
        let mut repo = InMemoryAssignmentRepository::new();
        repo.replace_axis("sig-1", Some("range-1"), Axis::X, vec!["h1".into()])
            .expect("nested write");

        let err = repo
            .replace_axis("sig-1", Some("range-2"), Axis::X, vec!["h2".into()])
            .expect_err("parent must not change");
        assert!(matches!(err, RepoError::ParentMismatch { .. }));
        assert_eq!(repo.get_entry("sig-1").expect("entry").x, vec!["h1"]);
    }

    #[test]
    fn rejects_blank_ids() {
        let mut repo = InMemoryAssignmentRepository::new();
        assert_eq!(
            repo.replace_axis("  ", None, Axis::X, vec!["c1".into()]),
            Err(RepoError::InvalidEntityId)
        );
        assert_eq!(
            repo.replace_axis("range-1", None, Axis::X, vec![" ".into()]),
            Err(RepoError::InvalidAtomGroupId)
        );
    }

    #[test]
    fn purge_removes_owner_and_nested_entries() {
        let mut repo = InMemoryAssignmentRepository::new();
        repo.replace_axis("zone-1", None, Axis::Y, vec!["h1".into()])
            .expect("zone write");
        repo.replace_axis("sig-1", Some("zone-1"), Axis::X, vec!["c1".into()])
            .expect("signal write");
        repo.replace_axis("zone-2", None, Axis::X, vec!["c2".into()])
            .expect("other zone write");

        let mut purged = repo.purge_owned_by("zone-1");
        purged.sort();
        assert_eq!(purged, vec!["sig-1", "zone-1"]);
        assert_eq!(repo.len(), 1);
        assert!(repo.get_entry("zone-2").is_some());
    }
}
