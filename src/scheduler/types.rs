/*!
 * Scheduler Report Types
 * Serializable views of engine state for diagnostics
 */

use crate::core::types::{Jiffies, Pid};
use serde::{Deserialize, Serialize};

/// Engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Tasks currently enqueued or running
    pub running: usize,
    /// Completed context switches
    pub switches: u64,
    /// Decisions taken by `schedule()`, no-ops excluded
    pub schedule_calls: u64,
    pub ticks: u64,
    pub forks: u64,
    /// Quanta restored to `first_time_slice`
    pub refills: u64,
}

/// One active-queue entry, in iteration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub pid: Pid,
    pub time_slice: Jiffies,
    pub first_time_slice: Jiffies,
    pub need_reschedule: bool,
    pub running: bool,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub current: Option<Pid>,
    pub stats: EngineStats,
    pub active: Vec<QueueEntry>,
    pub expired_len: usize,
}

impl EngineSnapshot {
    /// Snapshot of an engine that has not been initialized
    pub fn empty(stats: EngineStats) -> Self {
        Self {
            current: None,
            stats,
            active: Vec::new(),
            expired_len: 0,
        }
    }

    /// Pids of the active queue in iteration order
    pub fn active_pids(&self) -> Vec<Pid> {
        self.active.iter().map(|entry| entry.pid).collect()
    }
}
