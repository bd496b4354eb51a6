/*!
 * Scheduler Engine Operations
 * Lifecycle events and the shortest-remaining-time decision
 */

use super::Engine;
use crate::core::errors::SchedulerError;
use crate::core::types::{Pid, SchedResult};
use crate::scheduler::runqueue::{QueueKind, RunQueues};
use crate::scheduler::task::{ForkSlice, TaskHandle};
use crate::scheduler::traits::ContextSwitch;
use tracing::{debug, info, instrument, warn};

/// Log a rejected call before handing the error back
fn reported<T>(operation: &'static str, result: SchedResult<T>) -> SchedResult<T> {
    result.inspect_err(|e| warn!(operation, error = %e, "scheduler call rejected"))
}

impl<H: ContextSwitch> Engine<H> {
    /// Create both run queues and seed them with the first task
    ///
    /// The seed receives a fresh quantum from the configuration. No task is
    /// running until the first `schedule()`.
    #[instrument(level = "debug", skip_all, fields(pid = seed.pid()))]
    pub fn init(&mut self, seed: &TaskHandle) -> SchedResult<()> {
        if self.queues.is_some() {
            return reported("init", Err(SchedulerError::AlreadyInitialized));
        }

        let mut queues = RunQueues::new(self.config.max_tasks);
        reported("init", queues.enqueue(seed, QueueKind::Active).map(drop))?;

        let slice = self.config.new_task_slice();
        {
            let mut task = seed.lock();
            task.time_slice = slice;
            task.first_time_slice = slice;
        }

        self.queues = Some(queues);
        self.current = None;
        self.stats.running = 1;

        info!(pid = seed.pid(), time_slice = slice, "Scheduler initialized");
        Ok(())
    }

    /// Release every queue node and both run queues
    ///
    /// Tasks stay with the harness; only their memberships are cleared.
    /// Returns the number of nodes released.
    pub fn teardown(&mut self) -> SchedResult<usize> {
        let mut queues = reported(
            "teardown",
            self.queues.take().ok_or(SchedulerError::NotInitialized),
        )?;

        let released =
            queues.drain(QueueKind::Active).len() + queues.drain(QueueKind::Expired).len();

        self.current = None;
        self.stats.running = 0;

        info!(released, "Scheduler torn down");
        Ok(released)
    }

    /// Enqueue a task waking for the first time
    ///
    /// Does not reschedule; the harness calls `schedule()` when it wants a
    /// new decision.
    #[instrument(level = "debug", skip_all, fields(pid = p.pid()))]
    pub fn wake_up_new_task(&mut self, p: &TaskHandle) -> SchedResult<()> {
        reported("wake_up_new_task", self.activate(p))
    }

    /// Enqueue a task woken from sleep
    #[instrument(level = "debug", skip_all, fields(pid = p.pid()))]
    pub fn activate_task(&mut self, p: &TaskHandle) -> SchedResult<()> {
        reported("activate_task", self.activate(p))
    }

    fn activate(&mut self, p: &TaskHandle) -> SchedResult<()> {
        let queues = self.queues.as_mut().ok_or(SchedulerError::NotInitialized)?;
        queues.enqueue(p, QueueKind::Active)?;
        self.stats.running += 1;
        Ok(())
    }

    /// Remove a task from scheduling so it can sleep or exit
    ///
    /// The task's own membership decides which queue it leaves. Clears the
    /// running task if `p` was on the CPU.
    #[instrument(level = "debug", skip_all, fields(pid = p.pid()))]
    pub fn deactivate_task(&mut self, p: &TaskHandle) -> SchedResult<()> {
        let queues = reported(
            "deactivate_task",
            self.queues.as_mut().ok_or(SchedulerError::NotInitialized),
        )?;
        reported("deactivate_task", queues.dequeue(p))?;

        if self.is_current(p) {
            self.current = None;
            debug!(pid = p.pid(), "running task deactivated");
        }
        self.stats.running = self.stats.running.saturating_sub(1);
        Ok(())
    }

    /// Account one tick to the running task
    ///
    /// Returns whether the task now needs a reschedule. The caller is
    /// responsible for calling `schedule()` when it does.
    pub fn scheduler_tick(&mut self, p: &TaskHandle) -> SchedResult<bool> {
        reported("scheduler_tick", self.require_current(p))?;
        self.stats.ticks += 1;

        let mut task = p.lock();
        task.time_slice = task.time_slice.saturating_sub(1);
        if task.time_slice == 0 {
            task.need_reschedule = true;
            debug!(pid = task.pid, "quantum exhausted");
        }
        Ok(task.need_reschedule)
    }

    /// Split the running parent's remaining quantum with a new child
    ///
    /// The child gets the odd unit. A parent left with nothing is refilled
    /// to its first quantum.
    #[instrument(level = "debug", skip_all, fields(pid = parent.pid()))]
    pub fn sched_fork(&mut self, parent: &TaskHandle) -> SchedResult<ForkSlice> {
        reported("sched_fork", self.require_current(parent))?;
        self.stats.forks += 1;

        let mut task = parent.lock();
        let child = ForkSlice {
            time_slice: task.time_slice.div_ceil(2),
            first_time_slice: task.first_time_slice,
        };

        task.time_slice /= 2;
        if task.time_slice == 0 {
            task.refill();
            self.stats.refills += 1;
        }

        debug!(
            pid = task.pid,
            parent_slice = task.time_slice,
            child_slice = child.time_slice,
            "forked quantum"
        );
        Ok(child)
    }

    /// Pick the task with the least remaining quantum and switch to it
    ///
    /// The running task is refilled if exhausted and moved to the back of the
    /// active queue before the scan, so among equal quanta the task waiting
    /// longest wins. Returns the pid on the CPU after the decision, or `None`
    /// when there is nothing to run.
    pub fn schedule(&mut self) -> SchedResult<Option<Pid>> {
        let queues = reported(
            "schedule",
            self.queues.as_mut().ok_or(SchedulerError::NotInitialized),
        )?;
        if self.stats.running == 0 {
            return Ok(None);
        }

        if let Some(current) = self.current.as_ref() {
            {
                let mut task = current.lock();
                if task.time_slice == 0 {
                    task.refill();
                    self.stats.refills += 1;
                }
                task.need_reschedule = false;
            }
            queues.requeue_back(current)?;
        }

        let next = match queues.find_min_remaining(QueueKind::Active) {
            Some(next) => next,
            None => return Ok(None),
        };
        self.stats.schedule_calls += 1;

        let pid = next.pid();
        let unchanged = self.current.as_ref().is_some_and(|cur| cur.same(&next));
        if !unchanged {
            debug!(
                from = ?self.current.as_ref().map(TaskHandle::pid),
                to = pid,
                "context switch"
            );
            self.hook.context_switch(&next);
            self.current = Some(next);
            self.stats.switches += 1;
        }

        self.dump_queue();
        Ok(Some(pid))
    }
}
