//! Core scheduler data structures.
//!
//! Task definitions, their identifying types, and the lazy-deletion priority
//! queue the scheduler loop pops from.

pub mod queue;
pub mod task;
pub mod types;
