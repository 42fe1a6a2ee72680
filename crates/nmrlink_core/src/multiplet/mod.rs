//! Multiplicity tree builder.
//!
//! # Responsibility
//! - Parse multiplicity codes into generation tokens.
//! - Lay out J-coupling splitting trees for signal annotations.
//!
//! # Invariants
//! - No state survives between calls; results can be memoized by input.

pub mod code;
pub mod tree;
