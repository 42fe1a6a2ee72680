//! Store layer abstractions and implementations.
//!
//! # Responsibility
//! - Define the assignment store contract used by the coordinator.
//! - Keep map bookkeeping (lazy entries, parent links) out of services.
//!
//! # Invariants
//! - Writes are whole-list replacements; no partial edits are observable.

pub mod assignment_repo;
