/*!
 * Scenario Types
 * Scripted lifecycle events loaded from JSON
 */

use crate::core::types::{Jiffies, Pid};
use serde::{Deserialize, Serialize};

/// One harness event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// Create a task with a fresh quantum and wake it
    Spawn { pid: Pid, slice: Jiffies },
    /// Fork the running task into `child`
    Fork { child: Pid },
    /// Advance the clock, rescheduling whenever a quantum runs out
    Tick {
        #[serde(default = "one")]
        count: u32,
    },
    /// Put a task to sleep
    Sleep { pid: Pid },
    /// Wake a sleeping task
    Wake { pid: Pid },
    /// Retire a task
    Exit { pid: Pid },
    /// Explicit scheduling decision
    Schedule,
}

fn one() -> u32 {
    1
}

/// The task the engine is seeded with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSpec {
    pub pid: Pid,
}

/// Seed plus ordered event list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub seed: SeedSpec,
    pub events: Vec<SimEvent>,
}

impl Scenario {
    /// Parse a scenario from JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
