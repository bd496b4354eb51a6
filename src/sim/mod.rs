/*!
 * Simulation Harness
 * Drives the scheduler engine from scripted lifecycle events
 */

mod harness;
mod scenario;

pub use harness::{SimError, SimReport, Simulation};
pub use scenario::{Scenario, SeedSpec, SimEvent};
