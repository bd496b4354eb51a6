/*!
 * Scheduler Property Tests
 * Invariants checked over random lifecycle event sequences
 */

use proptest::prelude::*;
use srt_scheduler::{Engine, Pid, SwitchLog, Task, TaskHandle};

#[derive(Debug, Clone)]
enum Op {
    Spawn(u32),
    Tick,
    Fork,
    Sleep(usize),
    Wake(usize),
    Schedule,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..20).prop_map(Op::Spawn),
        Just(Op::Tick),
        Just(Op::Tick),
        Just(Op::Fork),
        (0usize..16).prop_map(Op::Sleep),
        (0usize..16).prop_map(Op::Wake),
        Just(Op::Schedule),
    ]
}

/// Drives an engine the way a harness would, tracking every task it created
struct Harness {
    engine: Engine<SwitchLog>,
    tasks: Vec<TaskHandle>,
}

impl Harness {
    fn new() -> Self {
        let mut engine = Engine::with_hook(SwitchLog::new());
        let seed = TaskHandle::new(Task::new(0, 1));
        engine.init(&seed).unwrap();
        Self {
            engine,
            tasks: vec![seed],
        }
    }

    fn next_pid(&self) -> u32 {
        self.tasks.len() as u32
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Spawn(slice) => {
                let task = TaskHandle::new(Task::new(self.next_pid(), slice));
                self.engine.wake_up_new_task(&task).unwrap();
                self.tasks.push(task);
            }
            Op::Tick => {
                if let Some(current) = self.engine.current().cloned() {
                    if self.engine.scheduler_tick(&current).unwrap() {
                        self.engine.schedule().unwrap();
                    }
                }
            }
            Op::Fork => {
                if let Some(parent) = self.engine.current().cloned() {
                    let slice = self.engine.sched_fork(&parent).unwrap();
                    let child = TaskHandle::new(slice.into_task(self.next_pid()));
                    self.engine.wake_up_new_task(&child).unwrap();
                    self.tasks.push(child);
                }
            }
            Op::Sleep(i) => {
                let task = self.tasks[i % self.tasks.len()].clone();
                let was_queued = task.is_queued();
                let result = self.engine.deactivate_task(&task);
                assert_eq!(result.is_ok(), was_queued);
            }
            Op::Wake(i) => {
                let task = self.tasks[i % self.tasks.len()].clone();
                let was_queued = task.is_queued();
                let result = self.engine.activate_task(&task);
                assert_eq!(result.is_ok(), !was_queued);
            }
            Op::Schedule => {
                self.engine.schedule().unwrap();
            }
        }
    }

    fn queued(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_queued()).count()
    }

    /// Task the next `schedule()` should pick
    ///
    /// Replays the decision by hand: refill an exhausted running task, move it
    /// to the back, then take the first task with the smallest slice.
    fn expected_pick(&self) -> Option<Pid> {
        let current = self.engine.current().cloned();
        let mut order = self.engine.active_tasks();
        if let Some(cur) = &current {
            if let Some(pos) = order.iter().position(|t| t.same(cur)) {
                let cur = order.remove(pos);
                order.push(cur);
            }
        }

        let mut best: Option<(Pid, u32)> = None;
        for task in &order {
            let slice = {
                let guard = task.lock();
                let running = current.as_ref().is_some_and(|cur| cur.same(task));
                if running && guard.time_slice == 0 {
                    guard.first_time_slice
                } else {
                    guard.time_slice
                }
            };
            if best.map_or(true, |(_, min)| slice < min) {
                best = Some((task.pid(), slice));
            }
        }
        best.map(|(pid, _)| pid)
    }

    /// Whether the running task holds strictly less than every other queued task
    fn current_is_unique_minimum(&self) -> bool {
        let Some(current) = self.engine.current() else {
            return true;
        };
        let slice = current.time_slice();
        self.engine
            .active_tasks()
            .iter()
            .filter(|t| !t.same(current))
            .all(|t| slice < t.time_slice())
    }
}

proptest! {
    #[test]
    fn prop_running_count_matches_membership(ops in prop::collection::vec(op(), 0..64)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);
            prop_assert_eq!(h.engine.running_count(), h.engine.node_count());
            prop_assert_eq!(h.engine.running_count(), h.queued());
            prop_assert_eq!(h.engine.expired_len(), 0);
        }
    }

    #[test]
    fn prop_schedule_selects_minimum(ops in prop::collection::vec(op(), 0..64)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);
        }

        let picked = h.engine.schedule().unwrap();
        if h.engine.running_count() == 0 {
            prop_assert_eq!(picked, None);
        } else {
            let current = h.engine.current().cloned().unwrap();
            let slice = current.time_slice();
            for task in h.engine.active_tasks() {
                prop_assert!(slice <= task.time_slice());
            }
        }
    }

    #[test]
    fn prop_second_schedule_is_noop_for_unique_minimum(ops in prop::collection::vec(op(), 0..64)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);
        }

        h.engine.schedule().unwrap();
        let switches = h.engine.switch_count();
        let current = h.engine.current_pid();

        if h.current_is_unique_minimum() {
            h.engine.schedule().unwrap();
            prop_assert_eq!(h.engine.switch_count(), switches);
            prop_assert_eq!(h.engine.current_pid(), current);
        } else {
            // A tied minimum rotates to the other task, switching exactly once
            h.engine.schedule().unwrap();
            prop_assert_eq!(h.engine.switch_count(), switches + 1);
            prop_assert_ne!(h.engine.current_pid(), current);
        }
    }

    #[test]
    fn prop_schedule_picks_first_minimum_after_requeue(ops in prop::collection::vec(op(), 0..64)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);
            if matches!(op, Op::Schedule) {
                continue;
            }

            let expected = h.expected_pick();
            let picked = h.engine.schedule().unwrap();
            prop_assert_eq!(picked, expected);
            prop_assert_eq!(h.engine.current_pid(), expected);
            if let Some(current) = h.engine.current() {
                prop_assert!(!current.need_reschedule());
            }
        }
    }

    #[test]
    fn prop_fork_conserves_quantum(slice in 1u32..10_000, first in 1u32..100) {
        let mut engine = Engine::default();
        let parent = TaskHandle::new(Task::new(0, 1));
        engine.init(&parent).unwrap();
        engine.schedule().unwrap();
        {
            let mut task = parent.lock();
            task.first_time_slice = first;
            task.time_slice = slice;
        }

        let child = engine.sched_fork(&parent).unwrap();
        let kept = parent.time_slice();

        prop_assert!(kept > 0);
        prop_assert_eq!(child.time_slice, (slice + 1) / 2);
        if slice / 2 == 0 {
            prop_assert_eq!(kept, first);
        } else {
            prop_assert!(child.time_slice + kept == slice || child.time_slice + kept == slice + 1);
        }
    }
}
