/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Scheduler not initialized")]
    #[diagnostic(
        code(scheduler::not_initialized),
        help("Call init() with a seed task before any other scheduler entry point.")
    )]
    NotInitialized,

    #[error("Scheduler already initialized")]
    #[diagnostic(
        code(scheduler::already_initialized),
        help("init() must be called exactly once. Call teardown() before re-initializing.")
    )]
    AlreadyInitialized,

    #[error("Task {0} is not queued")]
    #[diagnostic(
        code(scheduler::not_queued),
        help("The task was never enqueued or has already been dequeued.")
    )]
    NotQueued(Pid),

    #[error("Task {0} is already queued")]
    #[diagnostic(
        code(scheduler::already_queued),
        help("A task can sit in at most one run queue. Deactivate it first.")
    )]
    AlreadyQueued(Pid),

    #[error("Task {0} is not the running task")]
    #[diagnostic(
        code(scheduler::not_running),
        help("Ticks and forks apply to the task currently on the CPU.")
    )]
    NotRunning(Pid),

    #[error("Scheduler resources exhausted: {0}")]
    #[diagnostic(
        code(scheduler::resource_exhausted),
        help("No queue node could be allocated. This is unrecoverable for the engine.")
    )]
    ResourceExhausted(String),

    #[error("Invalid scheduler configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Check SCHED_HZ, SCHED_NEW_TASK_SLICE_NS and SCHED_MAX_TASKS.")
    )]
    InvalidConfig(String),
}

impl SchedulerError {
    /// Whether the error is a caller mistake rather than resource exhaustion
    #[inline]
    pub const fn is_precondition_violation(&self) -> bool {
        !matches!(self, Self::ResourceExhausted(_))
    }
}
