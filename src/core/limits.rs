/*!
 * Scheduler Limits and Constants
 *
 * Centralized location for tick rate, default quantum, and arena bounds.
 */

use super::types::Jiffies;

// =============================================================================
// CLOCK
// =============================================================================

/// Ticks per simulated second
pub const HZ: u32 = 100;

/// Nanoseconds in one second
pub const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Convert nanoseconds to jiffies at the given tick rate
///
/// Truncates toward zero and saturates at `Jiffies::MAX`.
#[inline]
pub const fn ns_to_jiffies_at(ns: u64, hz: u32) -> Jiffies {
    let jiffies = (ns as u128 * hz as u128) / NSEC_PER_SEC as u128;
    if jiffies > Jiffies::MAX as u128 {
        Jiffies::MAX
    } else {
        jiffies as Jiffies
    }
}

/// Convert nanoseconds to jiffies at `HZ`
#[inline]
pub const fn ns_to_jiffies(ns: u64) -> Jiffies {
    ns_to_jiffies_at(ns, HZ)
}

// =============================================================================
// QUANTUM
// =============================================================================

/// Quantum length handed to the seed task (100ms)
pub const NEW_TASK_SLICE_NS: u64 = 100_000_000;

/// Quantum handed to the seed task, in jiffies
pub const NEW_TASK_SLICE: Jiffies = ns_to_jiffies(NEW_TASK_SLICE_NS);

// =============================================================================
// ARENA
// =============================================================================

/// Upper bound on live queue nodes
/// Enqueue past this bound fails with a resource-exhaustion error
pub const DEFAULT_MAX_TASKS: usize = 4096;
