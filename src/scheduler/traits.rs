/*!
 * Scheduler Traits
 * Hook points the embedding harness implements
 */

use super::task::TaskHandle;
use crate::core::types::Pid;

/// Low-level transfer of execution to another task
///
/// Called by the engine exactly when a scheduling decision selects a task
/// other than the one currently running. Treated as synchronous and
/// infallible.
pub trait ContextSwitch {
    fn context_switch(&mut self, next: &TaskHandle);
}

impl<F> ContextSwitch for F
where
    F: FnMut(&TaskHandle),
{
    #[inline]
    fn context_switch(&mut self, next: &TaskHandle) {
        self(next)
    }
}

/// Hook that performs no transfer
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSwitch;

impl ContextSwitch for NoopSwitch {
    #[inline]
    fn context_switch(&mut self, _next: &TaskHandle) {}
}

/// Hook that records the pid of every task switched to
#[derive(Debug, Default, Clone)]
pub struct SwitchLog {
    switches: Vec<Pid>,
}

impl SwitchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pids in switch order
    pub fn switches(&self) -> &[Pid] {
        &self.switches
    }

    pub fn last(&self) -> Option<Pid> {
        self.switches.last().copied()
    }
}

impl ContextSwitch for SwitchLog {
    fn context_switch(&mut self, next: &TaskHandle) {
        self.switches.push(next.pid());
    }
}
