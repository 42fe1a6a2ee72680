//! Nucleus context parsing.
//!
//! # Responsibility
//! - Parse UI nucleus strings such as `1H` or `13C,1H`.
//! - Map a spectral axis to the element it observes.
//!
//! # Invariants
//! - A context has one (1D) or two (2D) dimensions; `x` is always first.
//! - Element symbols keep their canonical case (`C`, `H`, `Si`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::axis::Axis;

static NUCLEUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})([A-Z][a-z]?)$").expect("valid nucleus regex"));

/// Element symbol of hydrogen, the nucleus with attached-hydrogen fallback.
pub const HYDROGEN: &str = "H";

/// One observed isotope, e.g. `13C`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nucleus {
    /// Mass number, e.g. `13`.
    pub mass_number: u16,
    /// Element symbol, e.g. `C`.
    pub element: String,
}

impl Nucleus {
    /// Parses one nucleus token.
    pub fn parse(value: &str) -> Result<Self, NucleusParseError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(NucleusParseError::Empty);
        }
        let captures = NUCLEUS_RE
            .captures(trimmed)
            .ok_or_else(|| NucleusParseError::InvalidNucleus(trimmed.to_string()))?;
        let mass_number = captures[1]
            .parse::<u16>()
            .map_err(|_| NucleusParseError::InvalidNucleus(trimmed.to_string()))?;
        Ok(Self {
            mass_number,
            element: captures[2].to_string(),
        })
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == HYDROGEN
    }
}

impl Display for Nucleus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.mass_number, self.element)
    }
}

/// Active nucleus per spectral dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NucleusContext {
    dimensions: Vec<Nucleus>,
}

impl NucleusContext {
    /// Parses a comma-separated nucleus list (`1H`, `13C,1H`).
    pub fn parse(value: &str) -> Result<Self, NucleusParseError> {
        let dimensions = value
            .split(',')
            .map(Nucleus::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if dimensions.len() > 2 {
            return Err(NucleusParseError::TooManyDimensions(dimensions.len()));
        }
        Ok(Self { dimensions })
    }

    /// Returns the nucleus observed on `axis`, if that dimension exists.
    pub fn nucleus(&self, axis: Axis) -> Option<&Nucleus> {
        self.dimensions.get(axis.dimension())
    }

    pub fn is_two_dimensional(&self) -> bool {
        self.dimensions.len() == 2
    }

    pub fn dimensions(&self) -> &[Nucleus] {
        &self.dimensions
    }
}

impl Display for NucleusContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .dimensions
            .iter()
            .map(Nucleus::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

/// Nucleus parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NucleusParseError {
    Empty,
    InvalidNucleus(String),
    TooManyDimensions(usize),
}

impl Display for NucleusParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "nucleus value must not be empty"),
            Self::InvalidNucleus(value) => write!(f, "invalid nucleus: `{value}`"),
            Self::TooManyDimensions(count) => {
                write!(f, "nucleus context supports at most 2 dimensions, got {count}")
            }
        }
    }
}

impl Error for NucleusParseError {}
