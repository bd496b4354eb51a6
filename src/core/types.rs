/*!
 * Core Types
 * Common types used across the scheduler
 */

/// Task identifier, used for diagnostics and harness bookkeeping
pub type Pid = u32;

/// Discrete unit of scheduling time (one tick)
pub type Jiffies = u32;

/// Common result type for scheduler operations
pub type SchedResult<T> = Result<T, super::errors::SchedulerError>;
