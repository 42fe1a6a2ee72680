//! Ephemeral highlight and pin registry.
//!
//! # Responsibility
//! - Let renderers (observers) show/hide arbitrary string keys.
//! - Hold at most one pinned (click-locked) key group.
//! - Remember which entity produced the current hover set.
//!
//! # Invariants
//! - The hover set is exactly the union of live observers' shown keys.
//! - Releasing an observer removes its keys from hover and pin sets.
//! - Nothing here is persisted or timed; debouncing belongs to callers.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::model::axis::{Axis, SpectralEntityId};
use crate::model::document::EntityKind;

/// Handle identifying one highlight observer (a rendering component).
pub type ObserverId = Uuid;

/// Kind of object whose hover produced the current key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Peak,
    Range,
    Zone,
    Signal,
    Atom,
}

impl HighlightKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Peak => "peak",
            Self::Range => "range",
            Self::Zone => "zone",
            Self::Signal => "signal",
            Self::Atom => "atom",
        }
    }

    /// Returns whether a delete-key press can act on this kind.
    pub fn is_deletable(self) -> bool {
        !matches!(self, Self::Atom)
    }
}

impl From<EntityKind> for HighlightKind {
    fn from(value: EntityKind) -> Self {
        match value {
            EntityKind::Peak => Self::Peak,
            EntityKind::Range => Self::Range,
            EntityKind::Zone => Self::Zone,
        }
    }
}

/// Origin of the current hover set, used by the delete-key handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSource {
    pub kind: HighlightKind,
    pub entity_id: Option<SpectralEntityId>,
    /// Parent range/zone id when `entity_id` is a nested signal.
    pub parent_id: Option<SpectralEntityId>,
    pub axis: Option<Axis>,
}

impl HighlightSource {
    pub fn entity(kind: HighlightKind, entity_id: impl Into<SpectralEntityId>) -> Self {
        Self {
            kind,
            entity_id: Some(entity_id.into()),
            parent_id: None,
            axis: None,
        }
    }

    pub fn atom() -> Self {
        Self {
            kind: HighlightKind::Atom,
            entity_id: None,
            parent_id: None,
            axis: None,
        }
    }
}

/// Highlight registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    UnknownObserver(ObserverId),
}

impl Display for HighlightError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownObserver(id) => write!(f, "highlight observer not registered: {id}"),
        }
    }
}

impl Error for HighlightError {}

#[derive(Debug, Clone)]
struct PinnedGroup {
    owner: ObserverId,
    keys: BTreeSet<String>,
}

/// Per-document highlight registry.
#[derive(Debug, Default)]
pub struct HighlightStore {
    observers: BTreeMap<ObserverId, BTreeSet<String>>,
    pinned: Option<PinnedGroup>,
    source: Option<(ObserverId, HighlightSource)>,
}

impl HighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer with an empty key set.
    pub fn register(&mut self) -> ObserverId {
        let id = Uuid::new_v4();
        self.observers.insert(id, BTreeSet::new());
        id
    }

    /// Tears an observer down, dropping its hover keys, its pin and source.
    ///
    /// Its shown keys also leave a pin held by another observer.
    pub fn release(&mut self, observer: ObserverId) -> Result<(), HighlightError> {
        let keys = self
            .observers
            .remove(&observer)
            .ok_or(HighlightError::UnknownObserver(observer))?;
        if let Some(pinned) = self.pinned.as_mut() {
            pinned.keys.retain(|key| !keys.contains(key));
            if pinned.owner == observer || pinned.keys.is_empty() {
                self.pinned = None;
            }
        }
        self.clear_source_of(observer);
        debug!(
            "event=highlight_release module=highlight status=ok released_keys={}",
            keys.len()
        );
        Ok(())
    }

    /// Adds keys to the observer's hover set; a given source replaces the
    /// current one.
    pub fn show<I, K>(
        &mut self,
        observer: ObserverId,
        keys: I,
        source: Option<HighlightSource>,
    ) -> Result<(), HighlightError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let shown = self
            .observers
            .get_mut(&observer)
            .ok_or(HighlightError::UnknownObserver(observer))?;
        shown.extend(keys.into_iter().map(Into::into));
        if let Some(source) = source {
            self.source = Some((observer, source));
        }
        Ok(())
    }

    /// Removes keys from the observer's hover set.
    pub fn hide<I, K>(&mut self, observer: ObserverId, keys: I) -> Result<(), HighlightError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let shown = self
            .observers
            .get_mut(&observer)
            .ok_or(HighlightError::UnknownObserver(observer))?;
        for key in keys {
            let key: String = key.into();
            shown.remove(&key);
        }
        if shown.is_empty() {
            self.clear_source_of(observer);
        }
        Ok(())
    }

    /// Clears the observer's whole hover set (mouse-leave).
    pub fn hide_all(&mut self, observer: ObserverId) -> Result<(), HighlightError> {
        self.observers
            .get_mut(&observer)
            .ok_or(HighlightError::UnknownObserver(observer))?
            .clear();
        self.clear_source_of(observer);
        Ok(())
    }

    /// Pins `keys`, replacing any previous pin.
    ///
    /// Pinning the same key set again from the same observer unpins it.
    /// Returns whether a pin is active afterwards.
    pub fn pin<I, K>(&mut self, observer: ObserverId, keys: I) -> Result<bool, HighlightError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        if !self.observers.contains_key(&observer) {
            return Err(HighlightError::UnknownObserver(observer));
        }
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        let same = self
            .pinned
            .as_ref()
            .is_some_and(|pinned| pinned.owner == observer && pinned.keys == keys);
        if same || keys.is_empty() {
            self.pinned = None;
            return Ok(false);
        }
        self.pinned = Some(PinnedGroup {
            owner: observer,
            keys,
        });
        Ok(true)
    }

    pub fn unpin(&mut self) {
        self.pinned = None;
    }

    /// Removes keys from every observer, the pin, and the source.
    ///
    /// Used when the entity behind those keys is deleted.
    pub fn forget_keys(&mut self, keys: &[String]) {
        for shown in self.observers.values_mut() {
            shown.retain(|key| !keys.contains(key));
        }
        if let Some(pinned) = self.pinned.as_mut() {
            pinned.keys.retain(|key| !keys.contains(key));
            if pinned.keys.is_empty() {
                self.pinned = None;
            }
        }
        let source_deleted = self.source.as_ref().is_some_and(|(_, source)| {
            source
                .entity_id
                .as_ref()
                .is_some_and(|id| keys.contains(id))
        });
        if source_deleted {
            self.source = None;
        }
    }

    /// Hover membership.
    pub fn is_active(&self, key: &str) -> bool {
        self.observers.values().any(|shown| shown.contains(key))
    }

    /// Pin membership.
    pub fn is_active_permanently(&self, key: &str) -> bool {
        self.pinned
            .as_ref()
            .is_some_and(|pinned| pinned.keys.contains(key))
    }

    /// Union of all observers' shown keys.
    pub fn highlighted_keys(&self) -> BTreeSet<String> {
        self.observers.values().flatten().cloned().collect()
    }

    /// Keys currently shown by one observer.
    pub fn shown_by(&self, observer: ObserverId) -> Result<BTreeSet<String>, HighlightError> {
        self.observers
            .get(&observer)
            .cloned()
            .ok_or(HighlightError::UnknownObserver(observer))
    }

    pub fn pinned_keys(&self) -> BTreeSet<String> {
        self.pinned
            .as_ref()
            .map(|pinned| pinned.keys.clone())
            .unwrap_or_default()
    }

    /// Source of the current hover set.
    pub fn source(&self) -> Option<&HighlightSource> {
        self.source.as_ref().map(|(_, source)| source)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn clear_source_of(&mut self, observer: ObserverId) {
        if self
            .source
            .as_ref()
            .is_some_and(|(owner, _)| *owner == observer)
        {
            self.source = None;
        }
    }
}
