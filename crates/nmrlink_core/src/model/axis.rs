//! Identifier aliases and spectral axis model.
//!
//! # Responsibility
//! - Name the two identifier domains the engine links together.
//! - Define the spectral dimension an assignment applies to.
//!
//! # Invariants
//! - Identifiers are opaque; the engine never parses them.
//! - 1D entities only carry `Axis::X` assignments.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of a symmetry-equivalent atom group in the structure (diaID).
pub type AtomGroupId = String;

/// Identifier of a peak, range, zone or nested multiplet signal.
pub type SpectralEntityId = String;

/// Generates a fresh stable entity id.
pub fn new_entity_id() -> SpectralEntityId {
    Uuid::new_v4().to_string()
}

/// Spectral dimension an assignment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Direct dimension; the only one used by 1D entities.
    X,
    /// Indirect dimension of 2D zones and their signals.
    Y,
}

impl Axis {
    /// Both axes in storage order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Stable string form used in logs and wire data.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }

    /// Zero-based dimension index inside a nucleus context (`x` = 0).
    pub fn dimension(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
