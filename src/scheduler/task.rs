/*!
 * Task Types
 * Schedulable units of work and the shared handles the harness owns
 */

use super::runqueue::NodeId;
use crate::core::types::{Jiffies, Pid};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One schedulable unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub pid: Pid,
    /// Remaining quantum, counted down by ticks
    pub time_slice: Jiffies,
    /// Quantum assigned at creation or fork, used for refills
    pub first_time_slice: Jiffies,
    /// Set once the quantum is exhausted
    pub need_reschedule: bool,
    pub(super) membership: Option<NodeId>,
}

impl Task {
    /// Create a task with a full quantum
    pub fn new(pid: Pid, first_time_slice: Jiffies) -> Self {
        Self {
            pid,
            time_slice: first_time_slice,
            first_time_slice,
            need_reschedule: false,
            membership: None,
        }
    }

    /// Override the remaining quantum
    pub fn with_time_slice(mut self, time_slice: Jiffies) -> Self {
        self.time_slice = time_slice;
        self
    }

    /// Whether the task currently sits in a run queue
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.membership.is_some()
    }

    /// Restore the quantum assigned at creation
    #[inline]
    pub(super) fn refill(&mut self) {
        self.time_slice = self.first_time_slice;
    }
}

/// Shared handle to a harness-owned task
///
/// The engine clones handles into queue nodes and never creates or destroys
/// the task itself. Two handles refer to the same task iff they share storage.
#[derive(Clone)]
pub struct TaskHandle(Arc<Mutex<Task>>);

impl TaskHandle {
    pub fn new(task: Task) -> Self {
        Self(Arc::new(Mutex::new(task)))
    }

    /// Lock the task for inspection or mutation
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Task> {
        self.0.lock()
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.0.lock().pid
    }

    #[inline]
    pub fn time_slice(&self) -> Jiffies {
        self.0.lock().time_slice
    }

    #[inline]
    pub fn need_reschedule(&self) -> bool {
        self.0.lock().need_reschedule
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        self.0.lock().is_queued()
    }

    /// Identity comparison
    #[inline]
    pub fn same(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Task> for TaskHandle {
    fn from(task: Task) -> Self {
        Self::new(task)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task = self.0.lock();
        f.debug_struct("TaskHandle")
            .field("pid", &task.pid)
            .field("time_slice", &task.time_slice)
            .field("queued", &task.is_queued())
            .finish()
    }
}

/// Scheduling state handed to a freshly forked child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkSlice {
    pub time_slice: Jiffies,
    pub first_time_slice: Jiffies,
}

impl ForkSlice {
    /// Build the child task carrying this slice
    pub fn into_task(self, pid: Pid) -> Task {
        Task::new(pid, self.first_time_slice).with_time_slice(self.time_slice)
    }
}
