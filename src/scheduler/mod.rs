/*!
 * Scheduler Module
 * Run queues, tasks, and the shortest-remaining-time engine
 */

pub mod engine;
pub mod runqueue;
pub mod task;
pub mod traits;
pub mod types;

// Re-export public API
pub use engine::Engine;
pub use runqueue::{NodeId, QueueKind, RunQueue, RunQueues};
pub use task::{ForkSlice, Task, TaskHandle};
pub use traits::{ContextSwitch, NoopSwitch, SwitchLog};
pub use types::{EngineSnapshot, EngineStats, QueueEntry};
