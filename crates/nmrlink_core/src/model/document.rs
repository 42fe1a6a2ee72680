//! Spectral document model.
//!
//! # Responsibility
//! - Define the serializable peak/range/zone records and their nested signals.
//! - Locate entities by id and read/write their persisted atom-group lists.
//!
//! # Invariants
//! - Entity and signal ids are unique across the whole document.
//! - Axis bounds satisfy `from <= to` and are finite.
//! - Assignments live in the records themselves (`diaIDs`, `nbAtoms`) so they
//!   survive export/import; top-level records store them under `entity[axis]`,
//!   nested signals under `entity.signals[i][axis]`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::axis::{new_entity_id, AtomGroupId, Axis, SpectralEntityId};

/// Top-level spectral entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Peak,
    Range,
    Zone,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Peak => "peak",
            Self::Range => "range",
            Self::Zone => "zone",
        }
    }
}

/// Persisted assignment fields shared by every axis record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSlot {
    #[serde(rename = "diaIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub dia_ids: Vec<AtomGroupId>,
    #[serde(rename = "nbAtoms", default, skip_serializing_if = "is_zero")]
    pub nb_atoms: u32,
}

impl AssignmentSlot {
    /// Replaces ids and derives `nb_atoms` from the occurrence count.
    pub fn replace(&mut self, ids: Vec<AtomGroupId>) {
        self.nb_atoms = u32::try_from(ids.len()).unwrap_or(u32::MAX);
        self.dia_ids = ids;
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// One dimension of a top-level entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisRecord {
    pub from: f64,
    pub to: f64,
    #[serde(flatten)]
    pub assignment: AssignmentSlot,
}

impl AxisRecord {
    pub fn new(from: f64, to: f64) -> Self {
        Self {
            from,
            to,
            assignment: AssignmentSlot::default(),
        }
    }
}

/// One dimension of a nested signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalAxis {
    pub delta: f64,
    #[serde(flatten)]
    pub assignment: AssignmentSlot,
}

impl SignalAxis {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            assignment: AssignmentSlot::default(),
        }
    }
}

/// Multiplet signal nested inside a range or zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SpectralEntityId,
    /// Multiplicity code, e.g. `dd` or `m`.
    #[serde(default)]
    pub multiplicity: String,
    /// Coupling constants in Hz, in multiplicity token order.
    #[serde(default)]
    pub js: Vec<f64>,
    pub x: SignalAxis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<SignalAxis>,
}

impl Signal {
    /// Creates a 1D signal with a generated id.
    pub fn new(delta: f64, multiplicity: impl Into<String>, js: Vec<f64>) -> Self {
        Self {
            id: new_entity_id(),
            multiplicity: multiplicity.into(),
            js,
            x: SignalAxis::new(delta),
            y: None,
        }
    }

    /// Creates a 2D signal with a generated id.
    pub fn new_2d(delta_x: f64, delta_y: f64) -> Self {
        Self {
            id: new_entity_id(),
            multiplicity: String::new(),
            js: Vec::new(),
            x: SignalAxis::new(delta_x),
            y: Some(SignalAxis::new(delta_y)),
        }
    }

    fn slot(&self, axis: Axis) -> Option<&AssignmentSlot> {
        match axis {
            Axis::X => Some(&self.x.assignment),
            Axis::Y => self.y.as_ref().map(|y| &y.assignment),
        }
    }

    fn slot_mut(&mut self, axis: Axis) -> Option<&mut AssignmentSlot> {
        match axis {
            Axis::X => Some(&mut self.x.assignment),
            Axis::Y => self.y.as_mut().map(|y| &mut y.assignment),
        }
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        if self.id.trim().is_empty() {
            return Err(EntityValidationError::EmptyId);
        }
        let deltas = std::iter::once(self.x.delta).chain(self.y.as_ref().map(|y| y.delta));
        for delta in deltas {
            if !delta.is_finite() {
                return Err(EntityValidationError::NonFiniteValue(self.id.clone()));
            }
        }
        if self.js.iter().any(|j| !j.is_finite()) {
            return Err(EntityValidationError::NonFiniteValue(self.id.clone()));
        }
        Ok(())
    }
}

/// Peak, integration range or 2D zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralEntity {
    pub id: SpectralEntityId,
    pub kind: EntityKind,
    pub x: AxisRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<AxisRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<Signal>,
}

impl SpectralEntity {
    /// Creates a peak at one position.
    pub fn peak(x: f64) -> Self {
        Self::with_kind(EntityKind::Peak, AxisRecord::new(x, x), None)
    }

    /// Creates an integration range.
    pub fn range(from: f64, to: f64) -> Self {
        Self::with_kind(EntityKind::Range, AxisRecord::new(from, to), None)
    }

    /// Creates a 2D zone.
    pub fn zone(x: (f64, f64), y: (f64, f64)) -> Self {
        Self::with_kind(
            EntityKind::Zone,
            AxisRecord::new(x.0, x.1),
            Some(AxisRecord::new(y.0, y.1)),
        )
    }

    fn with_kind(kind: EntityKind, x: AxisRecord, y: Option<AxisRecord>) -> Self {
        Self {
            id: new_entity_id(),
            kind,
            x,
            y,
            signals: Vec::new(),
        }
    }

    /// Appends a nested signal (builder style).
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    fn slot(&self, axis: Axis) -> Option<&AssignmentSlot> {
        match axis {
            Axis::X => Some(&self.x.assignment),
            Axis::Y => self.y.as_ref().map(|y| &y.assignment),
        }
    }

    fn slot_mut(&mut self, axis: Axis) -> Option<&mut AssignmentSlot> {
        match axis {
            Axis::X => Some(&mut self.x.assignment),
            Axis::Y => self.y.as_mut().map(|y| &mut y.assignment),
        }
    }

    /// Validates bounds and ids of the entity and its signals.
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.id.trim().is_empty() {
            return Err(EntityValidationError::EmptyId);
        }
        for record in std::iter::once(&self.x).chain(self.y.as_ref()) {
            if !record.from.is_finite() || !record.to.is_finite() {
                return Err(EntityValidationError::NonFiniteValue(self.id.clone()));
            }
            if record.from > record.to {
                return Err(EntityValidationError::InvalidBounds {
                    from: record.from,
                    to: record.to,
                });
            }
        }
        for signal in &self.signals {
            signal.validate()?;
        }
        Ok(())
    }
}

/// Acquisition metadata needed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumInfo {
    /// Nucleus context string, e.g. `1H` or `13C,1H`.
    pub nucleus: String,
    /// Observed frequency of the direct dimension in MHz (Hz per ppm).
    pub frequency: f64,
}

/// Where an id was found inside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLocation {
    TopLevel {
        index: usize,
    },
    Nested {
        parent_index: usize,
        signal_index: usize,
        parent_id: SpectralEntityId,
    },
}

impl EntityLocation {
    /// Parent id for nested signals.
    pub fn parent_id(&self) -> Option<&SpectralEntityId> {
        match self {
            Self::TopLevel { .. } => None,
            Self::Nested { parent_id, .. } => Some(parent_id),
        }
    }
}

/// One persisted assignment list, as read while loading a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAssignment {
    pub entity_id: SpectralEntityId,
    pub parent_id: Option<SpectralEntityId>,
    pub axis: Axis,
    pub dia_ids: Vec<AtomGroupId>,
}

/// Ids removed by one delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedEntity {
    pub entity_id: SpectralEntityId,
    pub kind: Option<EntityKind>,
    /// Nested signal ids removed along with a top-level entity.
    pub signal_ids: Vec<SpectralEntityId>,
}

/// Serializable spectral document (one spectrum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralDocument {
    pub info: SpectrumInfo,
    #[serde(default)]
    pub entities: Vec<SpectralEntity>,
}

impl SpectralDocument {
    pub fn new(nucleus: impl Into<String>, frequency: f64) -> Self {
        Self {
            info: SpectrumInfo {
                nucleus: nucleus.into(),
                frequency,
            },
            entities: Vec::new(),
        }
    }

    /// Validates every entity and id uniqueness.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            entity.validate()?;
            for id in std::iter::once(&entity.id).chain(entity.signals.iter().map(|s| &s.id)) {
                if !seen.insert(id.as_str()) {
                    return Err(DocumentError::DuplicateId(id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Adds a validated top-level entity.
    pub fn add_entity(&mut self, entity: SpectralEntity) -> Result<SpectralEntityId, DocumentError> {
        entity.validate()?;
        for id in std::iter::once(&entity.id).chain(entity.signals.iter().map(|s| &s.id)) {
            if self.contains(id) {
                return Err(DocumentError::DuplicateId(id.clone()));
            }
        }
        let id = entity.id.clone();
        self.entities.push(entity);
        Ok(id)
    }

    /// Adds a validated signal under a top-level range or zone.
    pub fn add_signal(
        &mut self,
        parent_id: &str,
        signal: Signal,
    ) -> Result<SpectralEntityId, DocumentError> {
        signal.validate()?;
        if self.contains(&signal.id) {
            return Err(DocumentError::DuplicateId(signal.id));
        }
        let parent = self
            .entities
            .iter_mut()
            .find(|entity| entity.id == parent_id)
            .ok_or_else(|| DocumentError::EntityNotFound(parent_id.to_string()))?;
        if parent.kind == EntityKind::Peak {
            return Err(DocumentError::SignalsNotSupported(parent_id.to_string()));
        }
        let id = signal.id.clone();
        parent.signals.push(signal);
        Ok(id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.locate(entity_id).is_some()
    }

    /// Finds an id among top-level entities first, then nested signals.
    pub fn locate(&self, entity_id: &str) -> Option<EntityLocation> {
        if let Some(index) = self.entities.iter().position(|e| e.id == entity_id) {
            return Some(EntityLocation::TopLevel { index });
        }
        self.entities
            .iter()
            .enumerate()
            .find_map(|(parent_index, entity)| {
                entity
                    .signals
                    .iter()
                    .position(|signal| signal.id == entity_id)
                    .map(|signal_index| EntityLocation::Nested {
                        parent_index,
                        signal_index,
                        parent_id: entity.id.clone(),
                    })
            })
    }

    pub fn entity(&self, entity_id: &str) -> Option<&SpectralEntity> {
        self.entities.iter().find(|entity| entity.id == entity_id)
    }

    /// Returns a nested signal with its parent entity.
    pub fn signal(&self, signal_id: &str) -> Option<(&SpectralEntity, &Signal)> {
        match self.locate(signal_id)? {
            EntityLocation::Nested {
                parent_index,
                signal_index,
                ..
            } => {
                let parent = &self.entities[parent_index];
                Some((parent, &parent.signals[signal_index]))
            }
            EntityLocation::TopLevel { .. } => None,
        }
    }

    /// Persisted ids for one located axis; `None` when the axis does not exist.
    pub fn dia_ids(&self, location: &EntityLocation, axis: Axis) -> Option<&[AtomGroupId]> {
        let slot = match location {
            EntityLocation::TopLevel { index } => self.entities.get(*index)?.slot(axis),
            EntityLocation::Nested {
                parent_index,
                signal_index,
                ..
            } => self
                .entities
                .get(*parent_index)?
                .signals
                .get(*signal_index)?
                .slot(axis),
        }?;
        Some(slot.dia_ids.as_slice())
    }

    /// Writes one axis list back into the persisted record.
    pub fn set_dia_ids(
        &mut self,
        entity_id: &str,
        axis: Axis,
        ids: Vec<AtomGroupId>,
    ) -> Result<(), DocumentError> {
        let location = self
            .locate(entity_id)
            .ok_or_else(|| DocumentError::EntityNotFound(entity_id.to_string()))?;
        let slot = match location {
            EntityLocation::TopLevel { index } => self.entities[index].slot_mut(axis),
            EntityLocation::Nested {
                parent_index,
                signal_index,
                ..
            } => self.entities[parent_index].signals[signal_index].slot_mut(axis),
        }
        .ok_or_else(|| DocumentError::AxisNotAvailable {
            entity_id: entity_id.to_string(),
            axis,
        })?;
        slot.replace(ids);
        Ok(())
    }

    /// Removes a top-level entity (with its signals) or one nested signal.
    pub fn remove(&mut self, entity_id: &str) -> Result<RemovedEntity, DocumentError> {
        match self.locate(entity_id) {
            Some(EntityLocation::TopLevel { index }) => {
                let entity = self.entities.remove(index);
                Ok(RemovedEntity {
                    entity_id: entity.id,
                    kind: Some(entity.kind),
                    signal_ids: entity.signals.into_iter().map(|signal| signal.id).collect(),
                })
            }
            Some(EntityLocation::Nested {
                parent_index,
                signal_index,
                ..
            }) => {
                let signal = self.entities[parent_index].signals.remove(signal_index);
                Ok(RemovedEntity {
                    entity_id: signal.id,
                    kind: None,
                    signal_ids: Vec::new(),
                })
            }
            None => Err(DocumentError::EntityNotFound(entity_id.to_string())),
        }
    }

    /// Lists every non-empty persisted assignment list in document order.
    pub fn stored_assignments(&self) -> Vec<StoredAssignment> {
        let mut stored = Vec::new();
        for entity in &self.entities {
            for axis in Axis::ALL {
                if let Some(slot) = entity.slot(axis).filter(|slot| !slot.dia_ids.is_empty()) {
                    stored.push(StoredAssignment {
                        entity_id: entity.id.clone(),
                        parent_id: None,
                        axis,
                        dia_ids: slot.dia_ids.clone(),
                    });
                }
            }
            for signal in &entity.signals {
                for axis in Axis::ALL {
                    if let Some(slot) = signal.slot(axis).filter(|slot| !slot.dia_ids.is_empty()) {
                        stored.push(StoredAssignment {
                            entity_id: signal.id.clone(),
                            parent_id: Some(entity.id.clone()),
                            axis,
                            dia_ids: slot.dia_ids.clone(),
                        });
                    }
                }
            }
        }
        stored
    }
}

/// Entity validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValidationError {
    EmptyId,
    InvalidBounds { from: f64, to: f64 },
    NonFiniteValue(SpectralEntityId),
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "entity id must not be empty"),
            Self::InvalidBounds { from, to } => {
                write!(f, "axis bounds are reversed: from ({from}) must be <= to ({to})")
            }
            Self::NonFiniteValue(id) => write!(f, "entity {id} contains a non-finite value"),
        }
    }
}

impl Error for EntityValidationError {}

/// Document lookup and mutation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    Validation(EntityValidationError),
    DuplicateId(SpectralEntityId),
    EntityNotFound(SpectralEntityId),
    SignalsNotSupported(SpectralEntityId),
    AxisNotAvailable {
        entity_id: SpectralEntityId,
        axis: Axis,
    },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "entity id already present: {id}"),
            Self::EntityNotFound(id) => write!(f, "entity not found: {id}"),
            Self::SignalsNotSupported(id) => write!(f, "entity cannot hold signals: {id}"),
            Self::AxisNotAvailable { entity_id, axis } => {
                write!(f, "entity {entity_id} has no {axis} axis")
            }
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntityValidationError> for DocumentError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentError, EntityLocation, Signal, SpectralDocument, SpectralEntity};
    use crate::model::axis::Axis;

    #[test]
    fn locate_prefers_top_level_then_nested() {
        let mut doc = SpectralDocument::new("1H", 400.0);
        let signal = Signal::new(1.2, "t", vec![7.0]);
        let signal_id = signal.id.clone();
        let range_id = doc
            .add_entity(SpectralEntity::range(1.0, 1.4).with_signal(signal))
            .expect("add range");

        assert_eq!(
            doc.locate(&range_id),
            Some(EntityLocation::TopLevel { index: 0 })
        );
        let nested = doc.locate(&signal_id).expect("nested signal");
        assert_eq!(nested.parent_id(), Some(&range_id));
        assert!(doc.locate("missing").is_none());
    }

    #[test]
    fn set_dia_ids_rejects_missing_axis() {
        let mut doc = SpectralDocument::new("1H", 400.0);
        let range_id = doc
            .add_entity(SpectralEntity::range(1.0, 2.0))
            .expect("add range");

        let err = doc
            .set_dia_ids(&range_id, Axis::Y, vec!["h1".into()])
            .expect_err("1D range has no y axis");
        assert!(matches!(err, DocumentError::AxisNotAvailable { .. }));

        doc.set_dia_ids(&range_id, Axis::X, vec!["h1".into(), "h1".into()])
            .expect("x write");
        let entity = doc.entity(&range_id).expect("range");
        assert_eq!(entity.x.assignment.nb_atoms, 2);
    }

    #[test]
    fn add_entity_rejects_reversed_bounds_and_duplicates() {
        let mut doc = SpectralDocument::new("1H", 400.0);
        assert!(matches!(
            doc.add_entity(SpectralEntity::range(2.0, 1.0)),
            Err(DocumentError::Validation(_))
        ));

        let range = SpectralEntity::range(1.0, 2.0);
        doc.add_entity(range.clone()).expect("first add");
        assert!(matches!(
            doc.add_entity(range),
            Err(DocumentError::DuplicateId(_))
        ));
    }

    #[test]
    fn add_signal_rejects_peak_parent() {
        let mut doc = SpectralDocument::new("1H", 400.0);
        let peak_id = doc.add_entity(SpectralEntity::peak(1.0)).expect("peak");
        let err = doc
            .add_signal(&peak_id, Signal::new(1.0, "s", vec![]))
            .expect_err("peaks hold no signals");
        assert_eq!(err, DocumentError::SignalsNotSupported(peak_id));
    }
}
