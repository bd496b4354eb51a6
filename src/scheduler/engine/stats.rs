/*!
 * Scheduler Engine Statistics
 * Counters, snapshots and queue dumps for diagnostics
 */

use super::Engine;
use crate::scheduler::runqueue::QueueKind;
use crate::scheduler::traits::ContextSwitch;
use crate::scheduler::types::{EngineSnapshot, EngineStats, QueueEntry};
use tracing::{enabled, trace, Level};

impl<H: ContextSwitch> Engine<H> {
    /// Get engine counters
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Capture counters and active queue contents
    pub fn snapshot(&self) -> EngineSnapshot {
        let queues = match self.queues.as_ref() {
            Some(queues) => queues,
            None => return EngineSnapshot::empty(self.stats),
        };

        let active = queues
            .queue(QueueKind::Active)
            .iter(queues.arena())
            .map(|(_, handle)| {
                let running = self.is_current(handle);
                let task = handle.lock();
                QueueEntry {
                    pid: task.pid,
                    time_slice: task.time_slice,
                    first_time_slice: task.first_time_slice,
                    need_reschedule: task.need_reschedule,
                    running,
                }
            })
            .collect();

        EngineSnapshot {
            current: self.current_pid(),
            stats: self.stats,
            active,
            expired_len: queues.queue(QueueKind::Expired).len(),
        }
    }

    /// Emit the active queue at trace level
    pub fn dump_queue(&self) {
        if !enabled!(Level::TRACE) {
            return;
        }

        let snapshot = self.snapshot();
        trace!(current = ?snapshot.current, "active queue:");
        for entry in &snapshot.active {
            trace!(
                pid = entry.pid,
                time_slice = entry.time_slice,
                running = entry.running,
                "    queued"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::scheduler::engine::Engine;
    use crate::scheduler::task::{Task, TaskHandle};

    #[test]
    fn test_snapshot_before_init() {
        let engine = Engine::default();
        let snapshot = engine.snapshot();

        assert!(snapshot.active.is_empty());
        assert_eq!(snapshot.current, None);
        assert_eq!(snapshot.stats.running, 0);
    }

    #[test]
    fn test_snapshot_marks_running_task() {
        let mut engine = Engine::default();
        let seed = TaskHandle::new(Task::new(0, 1));
        let other = TaskHandle::new(Task::new(1, 3));

        engine.init(&seed).unwrap();
        engine.wake_up_new_task(&other).unwrap();
        engine.schedule().unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.current, Some(1));
        // First decision doesn't reorder the queue
        assert_eq!(snapshot.active_pids(), vec![1, 0]);
        assert!(snapshot.active[0].running);
        assert!(!snapshot.active[1].running);
        assert_eq!(snapshot.expired_len, 0);
        assert_eq!(snapshot.stats.switches, 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["active"][0]["time_slice"], 3);
    }
}
