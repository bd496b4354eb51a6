/*!
 * SRT Scheduler Library
 * Shortest-remaining-time scheduling core exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod scheduler;
pub mod sim;

// Re-exports
pub use crate::core::{Jiffies, Pid, SchedResult, SchedulerConfig, SchedulerError};
pub use monitoring::{init_tracing, try_init_tracing};
pub use scheduler::{
    ContextSwitch, Engine, EngineSnapshot, EngineStats, ForkSlice, NoopSwitch, QueueKind,
    SwitchLog, Task, TaskHandle,
};
pub use sim::{Scenario, SimError, SimEvent, SimReport, Simulation};
