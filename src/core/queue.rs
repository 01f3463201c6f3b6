//! Priority queue with lazy deletion.
//!
//! [`TaskQueue`] keeps two structures in step:
//!
//! - `heap`: a binary min-heap of nodes keyed by `(priority, sequence)`. Each
//!   node carries a copy of the sequence it was pushed with.
//! - `index`: task title -> authoritative [`TaskEntry`].
//!
//! Deleting a task only flips the entry's `valid` flag. Nothing is searched
//! for or removed from the heap; the stale node is discarded when it reaches
//! the top. A node is live only when the index entry for its title carries
//! the node's own sequence and is still valid, so a node orphaned by a
//! duplicate add or a reprioritize never matches the newer entry.
//!
//! | Operation      | Complexity         |
//! |----------------|--------------------|
//! | `push`         | O(log n)           |
//! | `invalidate`   | O(1)               |
//! | `reprioritize` | O(log n)           |
//! | `pop`          | amortized O(log n) |
//! | `snapshot`     | O(n log n)         |
//! | `len`          | O(1)               |
//!
//! A live counter is kept beside the stale counter, so deciding whether to
//! compact never scans the index.
//!
//! The queue is not thread-safe; the scheduler owns it from a single task.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use super::task::{Task, TaskSummary};
use super::types::{Priority, Sequence, SequenceCounter, TaskName};

/// Stale nodes tolerated before the heap is rebuilt.
const COMPACT_MIN_STALE: usize = 64;

/// Authoritative record for a queued task.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    task: Task,
    sequence: Sequence,
    valid: bool,
}

impl TaskEntry {
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// False once the entry has been deleted or replaced by reprioritize.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    fn summary(&self) -> TaskSummary {
        TaskSummary {
            name: self.task.name().clone(),
            minutes: self.task.minutes(),
            priority: self.task.priority(),
            sequence: self.sequence,
        }
    }
}

/// Physical heap node. Ordered by `(priority, sequence)` only.
#[derive(Debug, Clone)]
struct QueueNode {
    priority: Priority,
    sequence: Sequence,
    name: TaskName,
}

impl QueueNode {
    fn key(&self) -> (Priority, Sequence) {
        (self.priority, self.sequence)
    }
}

impl PartialEq for QueueNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueNode {}

impl PartialOrd for QueueNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Outcome of a [`TaskQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// No live task had this title.
    Inserted(Sequence),
    /// A live task with the same title was superseded.
    Replaced(Sequence),
}

impl PushOutcome {
    pub fn sequence(self) -> Sequence {
        match self {
            PushOutcome::Inserted(seq) | PushOutcome::Replaced(seq) => seq,
        }
    }
}

/// Why a popped node was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The entry was deleted. Reported even if the title was added again
    /// afterwards.
    Deleted,
    /// A newer entry with the same title exists (duplicate add or
    /// reprioritize).
    Superseded,
}

/// Result of a single [`TaskQueue::pop_node`] step.
#[derive(Debug)]
pub enum Popped {
    /// A live task, now removed from both heap and index.
    Ready(TaskEntry),
    /// A stale node that was discarded.
    Discarded {
        name: TaskName,
        sequence: Sequence,
        reason: DiscardReason,
    },
}

/// Lazy-deletion priority queue of tasks.
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<Reverse<QueueNode>>,
    index: HashMap<TaskName, TaskEntry>,
    counter: SequenceCounter,
    /// Why each orphaned node lost its index entry, keyed by the node's
    /// sequence.
    orphans: HashMap<Sequence, DiscardReason>,
    live: usize,
    stale: usize,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task under a fresh sequence number.
    ///
    /// A live task with the same title is superseded: its node stays in the
    /// heap as an orphan and is discarded when popped.
    pub fn push(&mut self, task: Task) -> PushOutcome {
        let sequence = self.counter.next_sequence();
        let node = QueueNode {
            priority: task.priority(),
            sequence,
            name: task.name().clone(),
        };
        let entry = TaskEntry {
            task,
            sequence,
            valid: true,
        };

        let replaced = match self.index.insert(node.name.clone(), entry) {
            Some(previous) => {
                // Its node is now an orphan. Deleted entries were already
                // counted as stale.
                let reason = if previous.valid {
                    self.stale += 1;
                    DiscardReason::Superseded
                } else {
                    self.live += 1;
                    DiscardReason::Deleted
                };
                self.orphans.insert(previous.sequence, reason);
                previous.valid
            }
            None => {
                self.live += 1;
                false
            }
        };
        self.heap.push(Reverse(node));

        if replaced {
            PushOutcome::Replaced(sequence)
        } else {
            PushOutcome::Inserted(sequence)
        }
    }

    /// Mark a task deleted. Returns false if no live task has that title.
    pub fn invalidate(&mut self, name: &TaskName) -> bool {
        match self.index.get_mut(name) {
            Some(entry) if entry.valid => {
                entry.valid = false;
                self.stale += 1;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Invalidate a live task and queue a copy of it with a new priority and
    /// a fresh sequence number. Returns `None` if no live task has that title.
    pub fn reprioritize(&mut self, name: &TaskName, priority: Priority) -> Option<Sequence> {
        let task = self
            .index
            .get(name)
            .filter(|entry| entry.valid)
            .map(|entry| entry.task.clone())?;
        // push() replaces the live entry and counts its node as stale.
        Some(self.push(task.with_priority(priority)).sequence())
    }

    /// Pop one node from the heap and classify it.
    ///
    /// Returns `None` when the heap is empty.
    pub fn pop_node(&mut self) -> Option<Popped> {
        let Reverse(node) = self.heap.pop()?;

        let owns_entry = self
            .index
            .get(&node.name)
            .is_some_and(|entry| entry.sequence == node.sequence);

        if !owns_entry {
            self.stale = self.stale.saturating_sub(1);
            let reason = self
                .orphans
                .remove(&node.sequence)
                .unwrap_or(DiscardReason::Superseded);
            return Some(Popped::Discarded {
                name: node.name,
                sequence: node.sequence,
                reason,
            });
        }

        // The node owns its index entry, so removing it here never touches a
        // newer entry with the same title.
        let entry = self.index.remove(&node.name)?;
        if entry.valid {
            self.live -= 1;
            Some(Popped::Ready(entry))
        } else {
            self.stale = self.stale.saturating_sub(1);
            Some(Popped::Discarded {
                name: node.name,
                sequence: node.sequence,
                reason: DiscardReason::Deleted,
            })
        }
    }

    /// Pop the highest-priority live task, discarding stale nodes on the way.
    pub fn pop(&mut self) -> Option<TaskEntry> {
        loop {
            match self.pop_node()? {
                Popped::Ready(entry) => return Some(entry),
                Popped::Discarded { .. } => continue,
            }
        }
    }

    /// Look up the live entry for a title.
    pub fn get(&self, name: &TaskName) -> Option<&TaskEntry> {
        self.index.get(name).filter(|entry| entry.valid)
    }

    /// Whether a live task has this title.
    pub fn contains(&self, name: &TaskName) -> bool {
        self.get(name).is_some()
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no live task is queued.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether the index still holds entries, including tombstones waiting
    /// to be popped.
    pub fn has_entries(&self) -> bool {
        !self.index.is_empty()
    }

    /// Physical heap size, stale nodes included.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Number of heap nodes known to be stale.
    pub fn stale_len(&self) -> usize {
        self.stale
    }

    /// Live tasks in the order they would be popped.
    pub fn snapshot(&self) -> Vec<TaskSummary> {
        let mut live: Vec<&TaskEntry> = self.index.values().filter(|e| e.valid).collect();
        live.sort_by_key(|entry| (entry.task.priority(), entry.sequence));
        live.into_iter().map(TaskEntry::summary).collect()
    }

    /// Rebuild the heap if stale nodes outnumber live ones.
    ///
    /// Returns true if a rebuild happened.
    pub fn maybe_compact(&mut self) -> bool {
        if self.stale >= COMPACT_MIN_STALE && self.stale > self.len() {
            self.compact();
            true
        } else {
            false
        }
    }

    /// Drop every stale node and tombstone. Live tasks keep their original
    /// `(priority, sequence)` so pop order is unchanged.
    pub fn compact(&mut self) {
        self.index.retain(|_, entry| entry.valid);
        self.heap = self
            .index
            .iter()
            .map(|(name, entry)| {
                Reverse(QueueNode {
                    priority: entry.task.priority(),
                    sequence: entry.sequence,
                    name: name.clone(),
                })
            })
            .collect();
        self.orphans.clear();
        self.stale = 0;
    }
}
