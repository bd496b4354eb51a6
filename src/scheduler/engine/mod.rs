/*!
 * Scheduler Engine
 * Shortest-remaining-time scheduling over a single active run queue
 *
 * The engine is one owned value driven synchronously by the harness. It
 * holds the run queues, the running task and the diagnostic counters; tasks
 * themselves stay owned by the harness.
 */

use super::runqueue::{QueueKind, RunQueues};
use super::task::TaskHandle;
use super::traits::{ContextSwitch, NoopSwitch};
use super::types::EngineStats;
use crate::core::config::SchedulerConfig;
use crate::core::errors::SchedulerError;
use crate::core::types::{Pid, SchedResult};
use tracing::info;

mod operations;
mod stats;

/// Shortest-remaining-time scheduler engine
///
/// Not reentrant. Concurrent use needs external serialization.
pub struct Engine<H: ContextSwitch = NoopSwitch> {
    config: SchedulerConfig,
    /// `None` before `init` and after `teardown`
    queues: Option<RunQueues>,
    current: Option<TaskHandle>,
    stats: EngineStats,
    hook: H,
}

impl<H: ContextSwitch> Engine<H> {
    /// Create an uninitialized engine with a validated configuration
    pub fn new(config: SchedulerConfig, hook: H) -> SchedResult<Self> {
        config.validate()?;

        info!(
            hz = config.hz,
            new_task_slice = config.new_task_slice(),
            max_tasks = config.max_tasks,
            "Scheduler engine created"
        );

        Ok(Self {
            config,
            queues: None,
            current: None,
            stats: EngineStats::default(),
            hook,
        })
    }

    /// Create an engine with the default configuration
    pub fn with_hook(hook: H) -> Self {
        Self {
            config: SchedulerConfig::default(),
            queues: None,
            current: None,
            stats: EngineStats::default(),
            hook,
        }
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.queues.is_some()
    }

    /// Task occupying the CPU, if any
    #[inline]
    pub fn current(&self) -> Option<&TaskHandle> {
        self.current.as_ref()
    }

    #[inline]
    pub fn current_pid(&self) -> Option<Pid> {
        self.current.as_ref().map(TaskHandle::pid)
    }

    /// Tasks currently enqueued or running
    #[inline]
    pub fn running_count(&self) -> usize {
        self.stats.running
    }

    /// Completed context switches
    #[inline]
    pub fn switch_count(&self) -> u64 {
        self.stats.switches
    }

    pub fn active_len(&self) -> usize {
        self.queue_len(QueueKind::Active)
    }

    pub fn expired_len(&self) -> usize {
        self.queue_len(QueueKind::Expired)
    }

    /// Live queue nodes across both run queues
    pub fn node_count(&self) -> usize {
        self.queues.as_ref().map_or(0, RunQueues::node_count)
    }

    /// Active queue contents in iteration order
    pub fn active_tasks(&self) -> Vec<TaskHandle> {
        self.queues.as_ref().map_or_else(Vec::new, |queues| {
            queues.queue(QueueKind::Active).tasks(queues.arena())
        })
    }

    #[inline]
    pub fn hook(&self) -> &H {
        &self.hook
    }

    fn queue_len(&self, kind: QueueKind) -> usize {
        self.queues.as_ref().map_or(0, |queues| queues.queue(kind).len())
    }

    fn is_current(&self, task: &TaskHandle) -> bool {
        self.current.as_ref().is_some_and(|cur| cur.same(task))
    }

    fn require_current(&self, task: &TaskHandle) -> SchedResult<()> {
        if self.queues.is_none() {
            return Err(SchedulerError::NotInitialized);
        }
        if !self.is_current(task) {
            return Err(SchedulerError::NotRunning(task.pid()));
        }
        Ok(())
    }
}

impl Default for Engine<NoopSwitch> {
    fn default() -> Self {
        Self::with_hook(NoopSwitch)
    }
}
