//! Domain model shared by the assignment engine.
//!
//! # Responsibility
//! - Define identifiers, axes and nucleus contexts.
//! - Define the serializable spectral document and the structure atom view.
//! - Define assignment entries and target pointers.
//!
//! # Invariants
//! - Atom-side and spectrum-side objects never point at each other; links are
//!   id lists owned by the assignment store and mirrored into the document.

pub mod assignment;
pub mod axis;
pub mod document;
pub mod molecule;
pub mod nucleus;
