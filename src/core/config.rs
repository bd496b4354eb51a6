/*!
 * Scheduler Configuration
 *
 * Tick rate, seed quantum, and node arena bounds, with environment overrides
 */

use super::errors::SchedulerError;
use super::limits::{ns_to_jiffies_at, DEFAULT_MAX_TASKS, HZ, NEW_TASK_SLICE_NS};
use super::types::{Jiffies, SchedResult};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the tick rate
pub const ENV_HZ: &str = "SCHED_HZ";
/// Environment variable overriding the seed quantum (nanoseconds)
pub const ENV_NEW_TASK_SLICE_NS: &str = "SCHED_NEW_TASK_SLICE_NS";
/// Environment variable overriding the queue node cap
pub const ENV_MAX_TASKS: &str = "SCHED_MAX_TASKS";

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ticks per simulated second
    pub hz: u32,
    /// Seed task quantum in nanoseconds
    pub new_task_slice_ns: u64,
    /// Maximum number of live queue nodes
    pub max_tasks: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            hz: HZ,
            new_task_slice_ns: NEW_TASK_SLICE_NS,
            max_tasks: DEFAULT_MAX_TASKS,
        }
    }
}

impl SchedulerConfig {
    /// Seed task quantum converted to jiffies
    #[inline]
    pub const fn new_task_slice(&self) -> Jiffies {
        ns_to_jiffies_at(self.new_task_slice_ns, self.hz)
    }

    /// Set the tick rate
    pub fn with_hz(mut self, hz: u32) -> Self {
        self.hz = hz;
        self
    }

    /// Set the seed quantum in nanoseconds
    pub fn with_new_task_slice_ns(mut self, ns: u64) -> Self {
        self.new_task_slice_ns = ns;
        self
    }

    /// Set the queue node cap
    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> SchedResult<()> {
        if self.hz == 0 {
            return Err(SchedulerError::InvalidConfig("hz must be non-zero".into()));
        }
        if self.new_task_slice() == 0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "new task slice of {}ns is shorter than one tick at {}Hz",
                self.new_task_slice_ns, self.hz
            )));
        }
        if self.max_tasks == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_tasks must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from the process environment
    ///
    /// Environment variables:
    /// - SCHED_HZ: tick rate (default: 100)
    /// - SCHED_NEW_TASK_SLICE_NS: seed quantum in nanoseconds (default: 100ms)
    /// - SCHED_MAX_TASKS: queue node cap (default: 4096)
    pub fn from_env() -> SchedResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> SchedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_HZ) {
            config.hz = parse_var(ENV_HZ, &value)?;
        }
        if let Some(value) = lookup(ENV_NEW_TASK_SLICE_NS) {
            config.new_task_slice_ns = parse_var(ENV_NEW_TASK_SLICE_NS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_TASKS) {
            config.max_tasks = parse_var(ENV_MAX_TASKS, &value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> SchedResult<T> {
    value.trim().parse().map_err(|_| {
        SchedulerError::InvalidConfig(format!("{}={:?} is not a valid number", key, value))
    })
}
