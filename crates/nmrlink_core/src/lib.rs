//! Core engine linking structure atoms to spectral features.
//! This crate is the single source of truth for assignment invariants.

pub mod logging;
pub mod model;
pub mod multiplet;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::assignment::{ActiveAssignmentTarget, AssignmentEntry, HighlightedTarget};
pub use model::axis::{new_entity_id, AtomGroupId, Axis, SpectralEntityId};
pub use model::document::{
    AssignmentSlot, AxisRecord, DocumentError, EntityKind, EntityLocation, EntityValidationError,
    RemovedEntity, Signal, SignalAxis, SpectralDocument, SpectralEntity, SpectrumInfo,
    StoredAssignment,
};
pub use model::molecule::AtomDescriptor;
pub use model::nucleus::{Nucleus, NucleusContext, NucleusParseError};
pub use multiplet::code::{MultiplicityCode, MultiplicityParseError, MultiplicityToken};
pub use multiplet::tree::{
    build_multiplet_tree, pascal_row, MultipletInput, MultipletTree, TreeLayout, TreeNode,
    Viewport, DEFAULT_LABEL_WIDTH_FRACTION,
};
pub use repo::assignment_repo::{
    AssignmentRepository, AssignmentSnapshot, InMemoryAssignmentRepository, RepoError, RepoResult,
};
pub use service::assignment_service::{
    AssignmentError, AssignmentService, ToggleOutcome, MAX_NB_ATOMS,
};
pub use service::highlight_service::{
    HighlightError, HighlightKind, HighlightSource, HighlightStore, ObserverId,
};
pub use service::resolver::{
    current_dia_ids_to_highlight, entity_highlight_keys, extract_from_atom, highlights_on_hover,
    locate, ExtractedAtoms,
};
pub use service::session::{DocumentSession, Notice, NoticeKind, SessionError, SessionOptions};

/// Minimal health-check API for embedding smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
