//! Core use-case services.
//!
//! # Responsibility
//! - Coordinate assignment mutations above the store layer.
//! - Resolve atom/entity events into cross-domain highlight key sets.
//! - Expose one per-document session as the single engine entry point.

pub mod assignment_service;
pub mod highlight_service;
pub mod resolver;
pub mod session;
