//! Core value types for the scheduler.
//!
//! These types give the task title, its priority and its queue sequence
//! number distinct types so they cannot be mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title of a queued task. Doubles as the lookup key for delete and
/// reprioritize, so titles are unique among live tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskName(String);

/// Task priority. Lower values run first; 1 is the highest priority a caller
/// normally assigns. Console and config input reject 0, but a `Priority(0)`
/// built in code sorts ahead of [`Priority::HIGHEST`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u32);

/// Insertion sequence number used to break priority ties in FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence(u64);

impl TaskName {
    /// Create a new TaskName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the underlying string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the title is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Priority {
    /// The most urgent priority callers are expected to use.
    pub const HIGHEST: Priority = Priority(1);

    /// Priority given to tasks added without one. Sorts after every
    /// explicitly prioritized task.
    pub const BACKGROUND: Priority = Priority(u32::MAX);

    /// Create a priority from its numeric value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::BACKGROUND
    }
}

impl From<u32> for Priority {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sequence {
    /// Never handed out by a [`SequenceCounter`].
    pub const INVALID: Sequence = Sequence(0);

    /// Get the numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Process-lifetime generator of strictly increasing sequence numbers.
///
/// Starts at 1 so [`Sequence::INVALID`] is never issued.
#[derive(Debug)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    /// Create a counter whose first value is 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next sequence number.
    pub fn next_sequence(&mut self) -> Sequence {
        let sequence = Sequence(self.next);
        self.next += 1;
        sequence
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Priority::BACKGROUND {
            write!(f, "background")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
