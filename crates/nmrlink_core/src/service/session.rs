//! Per-document assignment session.
//!
//! # Responsibility
//! - Own one document with its assignment store, highlight store and notice
//!   queue, and expose the canonical capability set
//!   (`activate`, `toggle`, `highlight_*`, `clear_highlight`, `purge_entity`).
//! - Mirror every committed assignment back into the document records.
//! - Cascade entity deletion into assignments and highlights synchronously.
//!
//! # Invariants
//! - Sessions share nothing; two open documents never see each other's state.
//! - A rejected toggle leaves store and document untouched and queues a notice.
//! - After `purge_entity(E)` no highlight computation returns `E`.

use log::{info, warn};
use serde::Deserialize;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::assignment::{ActiveAssignmentTarget, HighlightedTarget};
use crate::model::axis::{AtomGroupId, Axis, SpectralEntityId};
use crate::model::document::{DocumentError, EntityLocation, RemovedEntity, SpectralDocument};
use crate::model::molecule::AtomDescriptor;
use crate::model::nucleus::{NucleusContext, NucleusParseError};
use crate::multiplet::tree::{
    build_multiplet_tree, MultipletInput, MultipletTree, Viewport, DEFAULT_LABEL_WIDTH_FRACTION,
};
use crate::repo::assignment_repo::InMemoryAssignmentRepository;
use crate::service::assignment_service::{AssignmentError, AssignmentService, ToggleOutcome};
use crate::service::highlight_service::{
    HighlightError, HighlightKind, HighlightSource, HighlightStore, ObserverId,
};
use crate::service::resolver::{
    entity_highlight_keys, extract_from_atom, highlights_on_hover, ExtractedAtoms,
};

/// Session tuning knobs; every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Share of the chart width a multiplet tree must exceed to get a label.
    pub label_width_fraction: f64,
    /// Mirror committed assignments into document records.
    pub write_back: bool,
    /// Notices kept before the oldest one is dropped.
    pub max_notices: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            label_width_fraction: DEFAULT_LABEL_WIDTH_FRACTION,
            write_back: true,
            max_notices: 32,
        }
    }
}

/// Category of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Conflict,
    Unassignable,
}

/// Non-blocking message for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Session-level errors.
#[derive(Debug)]
pub enum SessionError {
    Document(DocumentError),
    Nucleus(NucleusParseError),
    Assignment(AssignmentError),
    Highlight(HighlightError),
    /// Id is not a signal nested in a range/zone.
    NotASignal(SpectralEntityId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{err}"),
            Self::Nucleus(err) => write!(f, "{err}"),
            Self::Assignment(err) => write!(f, "{err}"),
            Self::Highlight(err) => write!(f, "{err}"),
            Self::NotASignal(id) => write!(f, "entity is not a nested signal: {id}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::Nucleus(err) => Some(err),
            Self::Assignment(err) => Some(err),
            Self::Highlight(err) => Some(err),
            Self::NotASignal(_) => None,
        }
    }
}

impl From<DocumentError> for SessionError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<NucleusParseError> for SessionError {
    fn from(value: NucleusParseError) -> Self {
        Self::Nucleus(value)
    }
}

impl From<AssignmentError> for SessionError {
    fn from(value: AssignmentError) -> Self {
        Self::Assignment(value)
    }
}

impl From<HighlightError> for SessionError {
    fn from(value: HighlightError) -> Self {
        Self::Highlight(value)
    }
}

/// One open document and its engine state.
pub struct DocumentSession {
    document: SpectralDocument,
    nucleus: NucleusContext,
    assignments: AssignmentService<InMemoryAssignmentRepository>,
    highlights: HighlightStore,
    highlighted: Option<HighlightedTarget>,
    notices: VecDeque<Notice>,
    options: SessionOptions,
}

impl DocumentSession {
    /// Opens a session and rebuilds assignments from the document's lists.
    ///
    /// Persisted occurrences violating single ownership are dropped and the
    /// cleaned lists are written back.
    pub fn open(document: SpectralDocument, options: SessionOptions) -> Result<Self, SessionError> {
        document.validate()?;
        let nucleus = NucleusContext::parse(&document.info.nucleus)?;
        let mut assignments = AssignmentService::new(InMemoryAssignmentRepository::new());
        let stored = document.stored_assignments();
        let dropped = assignments.load(stored.clone())?;

        let mut session = Self {
            document,
            nucleus,
            assignments,
            highlights: HighlightStore::new(),
            highlighted: None,
            notices: VecDeque::new(),
            options,
        };
        if dropped > 0 {
            for assignment in &stored {
                session.write_back(&assignment.entity_id, assignment.axis)?;
            }
        }
        info!(
            "event=session_open module=session status=ok nucleus={} entities={} dropped={}",
            session.nucleus,
            session.document.entities.len(),
            dropped
        );
        Ok(session)
    }

    pub fn document(&self) -> &SpectralDocument {
        &self.document
    }

    /// Closes the session, handing back the (written-back) document.
    pub fn into_document(self) -> SpectralDocument {
        self.document
    }

    pub fn nucleus(&self) -> &NucleusContext {
        &self.nucleus
    }

    pub fn assignments(&self) -> &AssignmentService<InMemoryAssignmentRepository> {
        &self.assignments
    }

    pub fn highlights(&self) -> &HighlightStore {
        &self.highlights
    }

    /// Registers a rendering component as highlight observer.
    pub fn register_observer(&mut self) -> ObserverId {
        self.highlights.register()
    }

    /// Tears a rendering component down, dropping all of its keys.
    pub fn release_observer(&mut self, observer: ObserverId) -> Result<(), SessionError> {
        self.highlights.release(observer).map_err(Into::into)
    }

    /// Arms `entity_id`/`axis` for atom clicks.
    pub fn activate(&mut self, entity_id: &str, axis: Axis) -> Result<(), SessionError> {
        let location = self
            .document
            .locate(entity_id)
            .ok_or_else(|| DocumentError::EntityNotFound(entity_id.to_string()))?;
        if self.document.dia_ids(&location, axis).is_none() {
            return Err(DocumentError::AxisNotAvailable {
                entity_id: entity_id.to_string(),
                axis,
            }
            .into());
        }
        let mut target = ActiveAssignmentTarget::new(entity_id, axis);
        if let EntityLocation::Nested { parent_id, .. } = location {
            target = target.nested_in(parent_id);
        }
        self.assignments.activate(target);
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.assignments.deactivate();
    }

    pub fn active_target(&self) -> Option<&ActiveAssignmentTarget> {
        self.assignments.active_target()
    }

    /// Routes an atom click to the armed target.
    ///
    /// Conflicts and unassignable atoms queue a notice and return the error.
    pub fn toggle(&mut self, atom: &AtomDescriptor) -> Result<ToggleOutcome, SessionError> {
        let Some(target) = self.assignments.active_target().cloned() else {
            return Ok(ToggleOutcome::Skipped);
        };
        if !self.document.contains(&target.entity_id) {
            self.assignments.deactivate();
            return Err(DocumentError::EntityNotFound(target.entity_id).into());
        }

        let ExtractedAtoms { ocl_ids, nb_atoms } =
            extract_from_atom(atom, &self.nucleus, Some(target.axis));
        match self.assignments.toggle_atoms(&ocl_ids, nb_atoms) {
            Ok(outcome) => {
                if let Some((entity_id, axis)) = outcome.target() {
                    let entity_id = entity_id.clone();
                    self.write_back(&entity_id, axis)?;
                }
                Ok(outcome)
            }
            Err(err) => {
                self.push_notice(&err);
                Err(err.into())
            }
        }
    }

    /// Manual unassign: one occurrence of `atom_group_id`, or the whole list.
    pub fn unassign(
        &mut self,
        entity_id: &str,
        axis: Axis,
        atom_group_id: Option<&str>,
    ) -> Result<bool, SessionError> {
        let removed = self.assignments.remove(entity_id, axis, atom_group_id)?;
        if removed && self.document.contains(entity_id) {
            self.write_back(entity_id, axis)?;
        }
        Ok(removed)
    }

    /// Hover over a structure atom: highlights its groups and the entities
    /// (plus parents of nested signals) they are assigned to.
    ///
    /// Returns the keys now shown by `observer`.
    pub fn highlight_atom(
        &mut self,
        observer: ObserverId,
        atom: &AtomDescriptor,
        axis: Option<Axis>,
    ) -> Result<Vec<String>, SessionError> {
        let extracted = extract_from_atom(atom, &self.nucleus, axis);
        let entities = highlights_on_hover(
            &extracted.ocl_ids,
            self.assignments.entries(),
            &self.document,
        );
        let mut keys: Vec<String> = extracted.ocl_ids;
        keys.extend(entities);

        self.highlights.hide_all(observer)?;
        self.highlights
            .show(observer, keys.clone(), Some(HighlightSource::atom()))?;
        Ok(keys)
    }

    /// Hover over a range/zone/peak/signal: highlights it and its atoms.
    pub fn highlight_entity(
        &mut self,
        observer: ObserverId,
        target: HighlightedTarget,
    ) -> Result<Vec<String>, SessionError> {
        let location = self
            .document
            .locate(&target.entity_id)
            .ok_or_else(|| DocumentError::EntityNotFound(target.entity_id.clone()))?;
        let source = match &location {
            EntityLocation::TopLevel { index } => HighlightSource {
                kind: HighlightKind::from(self.document.entities[*index].kind),
                entity_id: Some(target.entity_id.clone()),
                parent_id: None,
                axis: target.axis,
            },
            EntityLocation::Nested { parent_id, .. } => HighlightSource {
                kind: HighlightKind::Signal,
                entity_id: Some(target.entity_id.clone()),
                parent_id: Some(parent_id.clone()),
                axis: target.axis,
            },
        };
        let keys = entity_highlight_keys(&target, self.assignments.entry(&target.entity_id));

        self.highlights.hide_all(observer)?;
        self.highlights.show(observer, keys.clone(), Some(source))?;
        self.highlighted = Some(target);
        Ok(keys)
    }

    /// Mouse-leave: clears the observer's hover keys and the hover pointer.
    pub fn clear_highlight(&mut self, observer: ObserverId) -> Result<(), SessionError> {
        self.highlights.hide_all(observer)?;
        self.highlighted = None;
        Ok(())
    }

    /// Click-to-lock the observer's current hover keys (toggle).
    pub fn pin_highlight(&mut self, observer: ObserverId) -> Result<bool, SessionError> {
        let keys = self.highlights.shown_by(observer)?;
        self.highlights.pin(observer, keys).map_err(Into::into)
    }

    pub fn highlighted_target(&self) -> Option<&HighlightedTarget> {
        self.highlighted.as_ref()
    }

    /// Drops every assignment and highlight tied to a deleted entity.
    ///
    /// Called by delete actions after the entity left the document.
    pub fn purge_entity(&mut self, entity_id: &str) -> Vec<SpectralEntityId> {
        let purged = self.assignments.purge_entity(entity_id);
        let mut forgotten: Vec<String> = purged.clone();
        if !forgotten.iter().any(|id| id == entity_id) {
            forgotten.push(entity_id.to_string());
        }
        self.highlights.forget_keys(&forgotten);
        if self
            .highlighted
            .as_ref()
            .is_some_and(|target| forgotten.contains(&target.entity_id))
        {
            self.highlighted = None;
        }
        purged
    }

    /// Removes an entity (or nested signal) from the document and cascades.
    pub fn delete_entity(&mut self, entity_id: &str) -> Result<RemovedEntity, SessionError> {
        let removed = self.document.remove(entity_id)?;
        self.purge_entity(&removed.entity_id);
        for signal_id in &removed.signal_ids {
            self.purge_entity(signal_id);
        }
        info!(
            "event=entity_delete module=session status=ok entity_id={} signals={}",
            removed.entity_id,
            removed.signal_ids.len()
        );
        Ok(removed)
    }

    /// Delete-key handler: deletes whatever entity produced the hover set.
    ///
    /// Returns `None` when nothing deletable is highlighted.
    pub fn delete_highlighted(&mut self) -> Result<Option<RemovedEntity>, SessionError> {
        let Some(source) = self.highlights.source().cloned() else {
            return Ok(None);
        };
        let deletable = source.kind.is_deletable();
        let Some(entity_id) = source.entity_id.filter(|_| deletable) else {
            return Ok(None);
        };
        if !self.document.contains(&entity_id) {
            warn!(
                "event=entity_delete module=session status=skipped reason=stale_source entity_id={}",
                entity_id
            );
            self.purge_entity(&entity_id);
            return Ok(None);
        }
        self.delete_entity(&entity_id).map(Some)
    }

    /// Splitting tree for a nested signal, bracketed by its parent range.
    pub fn multiplet_tree(
        &self,
        signal_id: &str,
        viewport: Option<Viewport>,
    ) -> Result<MultipletTree, SessionError> {
        let (parent, signal) = self
            .document
            .signal(signal_id)
            .ok_or_else(|| SessionError::NotASignal(signal_id.to_string()))?;
        let viewport = viewport.map(|mut viewport| {
            viewport.label_width_fraction = self.options.label_width_fraction;
            viewport
        });
        let input = MultipletInput {
            code: &signal.multiplicity,
            couplings: &signal.js,
            center: signal.x.delta,
            frequency: self.document.info.frequency,
            range: Some((parent.x.from, parent.x.to)),
            viewport,
        };
        Ok(build_multiplet_tree(&input))
    }

    /// Drains queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn push_notice(&mut self, err: &AssignmentError) {
        let kind = match err {
            AssignmentError::Conflict { .. } => NoticeKind::Conflict,
            AssignmentError::Unassignable => NoticeKind::Unassignable,
            AssignmentError::Repo(_) => return,
        };
        self.notices.push_back(Notice {
            kind,
            message: err.to_string(),
        });
        while self.notices.len() > self.options.max_notices {
            self.notices.pop_front();
        }
    }

    fn write_back(&mut self, entity_id: &str, axis: Axis) -> Result<(), SessionError> {
        if !self.options.write_back {
            return Ok(());
        }
        let ids: Vec<AtomGroupId> = self.assignments.assigned_ids(entity_id, axis);
        self.document
            .set_dia_ids(entity_id, axis, ids)
            .map_err(Into::into)
    }
}
