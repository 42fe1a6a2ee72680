//! Assignment coordinator use-case service.
//!
//! # Responsibility
//! - Track the one armed `(entity, axis)` target receiving atom clicks.
//! - Toggle atom groups on the armed target with conflict rejection.
//! - Remove single occurrences, whole lists, and purge deleted entities.
//!
//! # Invariants
//! - An atom group is counted toward at most one `(entity, axis)` pair;
//!   repeats under the same pair encode atom count.
//! - A rejected toggle performs no mutation.
//! - Every mutation is one whole-list replacement in the store.

use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::assignment::{ActiveAssignmentTarget, AssignmentEntry};
use crate::model::axis::{AtomGroupId, Axis, SpectralEntityId};
use crate::model::document::StoredAssignment;
use crate::repo::assignment_repo::{AssignmentRepository, AssignmentSnapshot, RepoError};

/// Largest atom count one click may append.
pub const MAX_NB_ATOMS: u32 = 1024;

/// Successful result of one atom click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Groups were appended to the armed target.
    Added {
        entity_id: SpectralEntityId,
        axis: Axis,
        atom_group_ids: Vec<AtomGroupId>,
        occurrences: usize,
    },
    /// Groups were already assigned to the armed target and got removed.
    Removed {
        entity_id: SpectralEntityId,
        axis: Axis,
        atom_group_ids: Vec<AtomGroupId>,
        occurrences: usize,
    },
    /// No target is armed; the click is a no-op.
    Skipped,
}

impl ToggleOutcome {
    /// Returns the touched entity and axis, if any.
    pub fn target(&self) -> Option<(&SpectralEntityId, Axis)> {
        match self {
            Self::Added {
                entity_id, axis, ..
            }
            | Self::Removed {
                entity_id, axis, ..
            } => Some((entity_id, *axis)),
            Self::Skipped => None,
        }
    }
}

/// Recoverable assignment failures; none of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// Atom group is already owned by another `(entity, axis)` pair.
    Conflict {
        atom_group_id: AtomGroupId,
        owner: SpectralEntityId,
        owner_axis: Axis,
    },
    /// Clicked atom resolves to no group for the active nucleus.
    Unassignable,
    /// Store-level failure.
    Repo(RepoError),
}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict {
                atom_group_id,
                owner,
                owner_axis,
            } => write!(
                f,
                "atom {atom_group_id} is already assigned to {owner} on axis {owner_axis}"
            ),
            Self::Unassignable => write!(f, "atom cannot be assigned for the active nucleus"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssignmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AssignmentError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Assignment coordinator over one store instance.
pub struct AssignmentService<R: AssignmentRepository> {
    repo: R,
    active: Option<ActiveAssignmentTarget>,
}

impl<R: AssignmentRepository> AssignmentService<R> {
    /// Creates a coordinator with no armed target.
    pub fn new(repo: R) -> Self {
        Self { repo, active: None }
    }

    /// Arms `target`; replaces any previous target.
    pub fn activate(&mut self, target: ActiveAssignmentTarget) {
        if self.active.as_ref() == Some(&target) {
            return;
        }
        debug!(
            "event=assignment_activate module=assignment status=ok entity_id={} axis={}",
            target.entity_id, target.axis
        );
        self.active = Some(target);
    }

    /// Disarms the current target.
    pub fn deactivate(&mut self) {
        if self.active.take().is_some() {
            debug!("event=assignment_deactivate module=assignment status=ok");
        }
    }

    pub fn active_target(&self) -> Option<&ActiveAssignmentTarget> {
        self.active.as_ref()
    }

    pub fn has_active_target(&self) -> bool {
        self.active.is_some()
    }

    /// Toggles one atom group with its atom count on the armed target.
    pub fn toggle_atom(
        &mut self,
        atom_group_id: &str,
        nb_atoms: u32,
    ) -> Result<ToggleOutcome, AssignmentError> {
        self.toggle_atoms(&[atom_group_id.to_string()], nb_atoms)
    }

    /// Toggles one click worth of atom groups as a single unit.
    ///
    /// # Contract
    /// - No armed target: returns `Skipped`.
    /// - Empty `atom_group_ids`: returns `Unassignable`.
    /// - Any group already on the target: removes every occurrence of all groups.
    /// - Any group owned by another pair: returns `Conflict`, nothing changes.
    /// - `nb_atoms` above `MAX_NB_ATOMS`: returns `Unassignable`.
    /// - Otherwise appends `max(nb_atoms, 1)` occurrences spread over the groups
    ///   (each group at least once).
    pub fn toggle_atoms(
        &mut self,
        atom_group_ids: &[AtomGroupId],
        nb_atoms: u32,
    ) -> Result<ToggleOutcome, AssignmentError> {
        let Some(target) = self.active.clone() else {
            debug!("event=assignment_toggle module=assignment status=skipped reason=no_active_target");
            return Ok(ToggleOutcome::Skipped);
        };
        let ids = dedup_ids(atom_group_ids);
        if ids.is_empty() {
            warn!(
                "event=assignment_toggle module=assignment status=rejected reason=unassignable entity_id={}",
                target.entity_id
            );
            return Err(AssignmentError::Unassignable);
        }

        let current = self.assigned_ids(&target.entity_id, target.axis);
        let is_member = ids.iter().any(|id| current.contains(id));

        if is_member {
            let next: Vec<AtomGroupId> = current
                .iter()
                .filter(|id| !ids.contains(*id))
                .cloned()
                .collect();
            let occurrences = current.len() - next.len();
            self.commit(&target, next)?;
            info!(
                "event=assignment_toggle module=assignment status=ok action=remove entity_id={} axis={} occurrences={}",
                target.entity_id, target.axis, occurrences
            );
            return Ok(ToggleOutcome::Removed {
                entity_id: target.entity_id,
                axis: target.axis,
                atom_group_ids: ids,
                occurrences,
            });
        }

        if let Some((atom_group_id, owner, owner_axis)) = self.find_conflict(&ids, &target) {
            warn!(
                "event=assignment_toggle module=assignment status=rejected reason=conflict atom_group_id={} owner={} owner_axis={} entity_id={} axis={}",
                atom_group_id, owner, owner_axis, target.entity_id, target.axis
            );
            return Err(AssignmentError::Conflict {
                atom_group_id,
                owner,
                owner_axis,
            });
        }

        if nb_atoms > MAX_NB_ATOMS || ids.len() > MAX_NB_ATOMS as usize {
            warn!(
                "event=assignment_toggle module=assignment status=rejected reason=atom_count entity_id={} nb_atoms={}",
                target.entity_id, nb_atoms
            );
            return Err(AssignmentError::Unassignable);
        }

        let mut next = current;
        let additions = spread_occurrences(&ids, nb_atoms);
        let occurrences = additions.len();
        next.extend(additions);
        self.commit(&target, next)?;
        info!(
            "event=assignment_toggle module=assignment status=ok action=add entity_id={} axis={} occurrences={}",
            target.entity_id, target.axis, occurrences
        );
        Ok(ToggleOutcome::Added {
            entity_id: target.entity_id,
            axis: target.axis,
            atom_group_ids: ids,
            occurrences,
        })
    }

    /// Drops one occurrence of `atom_group_id`, or the whole axis list.
    ///
    /// Returns whether anything was removed.
    pub fn remove(
        &mut self,
        entity_id: &str,
        axis: Axis,
        atom_group_id: Option<&str>,
    ) -> Result<bool, AssignmentError> {
        let Some(entry) = self.repo.get_entry(entity_id) else {
            return Ok(false);
        };
        let current = entry.axis(axis).to_vec();
        let parent_id = entry.parent_id.clone();

        let next = match atom_group_id {
            Some(id) => {
                let Some(position) = current.iter().rposition(|candidate| candidate == id) else {
                    return Ok(false);
                };
                let mut next = current;
                next.remove(position);
                next
            }
            None if current.is_empty() => return Ok(false),
            None => Vec::new(),
        };

        self.repo
            .replace_axis(entity_id, parent_id.as_deref(), axis, next)?;
        info!(
            "event=assignment_remove module=assignment status=ok entity_id={} axis={} scope={}",
            entity_id,
            axis,
            if atom_group_id.is_some() { "one" } else { "all" }
        );
        Ok(true)
    }

    /// Removes every entry owned by `entity_id` (and its nested signals).
    ///
    /// Disarms the active target when it belongs to the purged entity.
    pub fn purge_entity(&mut self, entity_id: &str) -> Vec<SpectralEntityId> {
        let purged = self.repo.purge_owned_by(entity_id);
        if self
            .active
            .as_ref()
            .is_some_and(|target| target.is_owned_by(entity_id))
        {
            self.active = None;
        }
        info!(
            "event=assignment_purge module=assignment status=ok entity_id={} purged={}",
            entity_id,
            purged.len()
        );
        purged
    }

    /// Rebuilds entries from persisted document lists.
    ///
    /// Occurrences whose group is already owned by another pair are dropped;
    /// returns how many occurrences were dropped.
    pub fn load(&mut self, stored: Vec<StoredAssignment>) -> Result<usize, AssignmentError> {
        let mut dropped = 0;
        for assignment in stored {
            let target = ActiveAssignmentTarget {
                entity_id: assignment.entity_id,
                axis: assignment.axis,
                parent_id: assignment.parent_id,
            };
            let mut kept = self.assigned_ids(&target.entity_id, target.axis);
            for id in assignment.dia_ids {
                if self.find_conflict(std::slice::from_ref(&id), &target).is_some() {
                    warn!(
                        "event=assignment_load module=assignment status=dropped reason=conflict atom_group_id={} entity_id={} axis={}",
                        id, target.entity_id, target.axis
                    );
                    dropped += 1;
                    continue;
                }
                kept.push(id);
            }
            self.commit(&target, kept)?;
        }
        info!(
            "event=assignment_load module=assignment status=ok entries={} dropped={}",
            self.repo.list_entries().len(),
            dropped
        );
        Ok(dropped)
    }

    /// Current list for one pair (empty when unassigned).
    pub fn assigned_ids(&self, entity_id: &str, axis: Axis) -> Vec<AtomGroupId> {
        self.repo
            .get_entry(entity_id)
            .map(|entry| entry.axis(axis).to_vec())
            .unwrap_or_default()
    }

    pub fn entry(&self, entity_id: &str) -> Option<&AssignmentEntry> {
        self.repo.get_entry(entity_id)
    }

    pub fn entries(&self) -> Vec<(&SpectralEntityId, &AssignmentEntry)> {
        self.repo.list_entries()
    }

    /// Every `(entity, axis)` pair counting `atom_group_id`.
    pub fn owners_of(&self, atom_group_id: &str) -> Vec<(SpectralEntityId, Axis)> {
        let mut owners = Vec::new();
        for (entity_id, entry) in self.repo.list_entries() {
            for axis in Axis::ALL {
                if entry.contains(axis, atom_group_id) {
                    owners.push((entity_id.clone(), axis));
                }
            }
        }
        owners
    }

    pub fn snapshot(&self) -> AssignmentSnapshot {
        self.repo.snapshot()
    }

    fn find_conflict(
        &self,
        ids: &[AtomGroupId],
        target: &ActiveAssignmentTarget,
    ) -> Option<(AtomGroupId, SpectralEntityId, Axis)> {
        for (entity_id, entry) in self.repo.list_entries() {
            for axis in Axis::ALL {
                if entity_id == &target.entity_id && axis == target.axis {
                    continue;
                }
                if let Some(id) = ids.iter().find(|id| entry.contains(axis, id)) {
                    return Some((id.clone(), entity_id.clone(), axis));
                }
            }
        }
        None
    }

    fn commit(
        &mut self,
        target: &ActiveAssignmentTarget,
        ids: Vec<AtomGroupId>,
    ) -> Result<(), AssignmentError> {
        self.repo
            .replace_axis(&target.entity_id, target.parent_id.as_deref(), target.axis, ids)
            .map_err(Into::into)
    }
}

fn dedup_ids(ids: &[AtomGroupId]) -> Vec<AtomGroupId> {
    let mut unique: Vec<AtomGroupId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }
    unique
}

fn spread_occurrences(ids: &[AtomGroupId], nb_atoms: u32) -> Vec<AtomGroupId> {
    let total = nb_atoms.clamp(1, MAX_NB_ATOMS) as usize;
    let base = total / ids.len();
    let remainder = total % ids.len();
    let mut occurrences = Vec::with_capacity(total.max(ids.len()));
    for (index, id) in ids.iter().enumerate() {
        let count = (base + usize::from(index < remainder)).max(1);
        occurrences.extend(std::iter::repeat(id.clone()).take(count));
    }
    occurrences
}
