/*!
 * Simulation Harness
 * Owns the task table and feeds lifecycle events to the engine
 */

use super::scenario::{Scenario, SimEvent};
use crate::core::config::SchedulerConfig;
use crate::core::errors::SchedulerError;
use crate::core::types::{Pid, SchedResult};
use crate::monitoring::span_run;
use crate::scheduler::{Engine, EngineSnapshot, EngineStats, SwitchLog, Task, TaskHandle};
use ahash::AHashMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Harness errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SimError {
    #[error("Unknown task {0}")]
    #[diagnostic(
        code(sim::unknown_task),
        help("Spawn or fork the task before referring to it.")
    )]
    UnknownTask(Pid),

    #[error("Task {0} already exists")]
    #[diagnostic(code(sim::duplicate_task), help("Pids must be unique within a scenario."))]
    DuplicateTask(Pid),

    #[error("No task is running")]
    #[diagnostic(
        code(sim::no_running_task),
        help("Fork needs a running parent. Schedule a task first.")
    )]
    NoRunningTask,

    #[error("Event {index} failed: {source}")]
    #[diagnostic(code(sim::event_failed))]
    Event {
        index: usize,
        #[source]
        source: Box<SimError>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Outcome of a simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimReport {
    pub name: String,
    /// Pids switched to, in order
    pub switches: Vec<Pid>,
    /// Ticks that found no task on the CPU
    pub idle_ticks: u64,
    pub stats: EngineStats,
    /// Engine state after the last event, before teardown
    pub snapshot: EngineSnapshot,
}

/// Harness driving one engine instance
pub struct Simulation {
    engine: Engine<SwitchLog>,
    tasks: AHashMap<Pid, TaskHandle>,
    idle_ticks: u64,
}

impl Simulation {
    pub fn new(config: SchedulerConfig) -> SchedResult<Self> {
        Ok(Self {
            engine: Engine::new(config, SwitchLog::new())?,
            tasks: AHashMap::new(),
            idle_ticks: 0,
        })
    }

    #[inline]
    pub fn engine(&self) -> &Engine<SwitchLog> {
        &self.engine
    }

    /// Look up a task the harness owns
    pub fn task(&self, pid: Pid) -> Option<&TaskHandle> {
        self.tasks.get(&pid)
    }

    /// Create the seed task and initialize the engine
    pub fn seed(&mut self, pid: Pid) -> Result<(), SimError> {
        if self.tasks.contains_key(&pid) {
            return Err(SimError::DuplicateTask(pid));
        }
        let seed = TaskHandle::new(Task::new(pid, self.engine.config().new_task_slice()));
        self.engine.init(&seed)?;
        self.tasks.insert(pid, seed);
        self.engine.schedule()?;
        Ok(())
    }

    /// Apply one event
    pub fn apply(&mut self, event: &SimEvent) -> Result<(), SimError> {
        debug!(?event, "applying event");

        match *event {
            SimEvent::Spawn { pid, slice } => {
                if self.tasks.contains_key(&pid) {
                    return Err(SimError::DuplicateTask(pid));
                }
                let task: TaskHandle = Task::new(pid, slice).into();
                self.engine.wake_up_new_task(&task)?;
                self.tasks.insert(pid, task);
            }
            SimEvent::Fork { child } => {
                if self.tasks.contains_key(&child) {
                    return Err(SimError::DuplicateTask(child));
                }
                let parent = self.engine.current().cloned().ok_or(SimError::NoRunningTask)?;
                let before = parent.time_slice();
                let slice = self.engine.sched_fork(&parent)?;
                let task = TaskHandle::new(slice.into_task(child));
                if let Err(e) = self.engine.wake_up_new_task(&task) {
                    // Child never ran; hand its share back to the parent
                    parent.lock().time_slice = before;
                    return Err(e.into());
                }
                self.tasks.insert(child, task);
            }
            SimEvent::Tick { count } => {
                for _ in 0..count {
                    self.tick()?;
                }
                return Ok(());
            }
            SimEvent::Sleep { pid } => {
                let task = self.lookup(pid)?;
                self.engine.deactivate_task(&task)?;
            }
            SimEvent::Wake { pid } => {
                let task = self.lookup(pid)?;
                self.engine.activate_task(&task)?;
            }
            SimEvent::Exit { pid } => {
                let task = self.lookup(pid)?;
                if task.is_queued() {
                    self.engine.deactivate_task(&task)?;
                }
                self.tasks.remove(&pid);
            }
            SimEvent::Schedule => {}
        }

        self.engine.schedule()?;
        Ok(())
    }

    /// Run a scenario from seed to teardown
    pub fn run(mut self, scenario: &Scenario) -> Result<SimReport, SimError> {
        let span = span_run(&scenario.name);
        let _guard = span.enter();

        self.seed(scenario.seed.pid)?;
        for (index, event) in scenario.events.iter().enumerate() {
            self.apply(event).map_err(|e| SimError::Event {
                index,
                source: Box::new(e),
            })?;
        }

        let snapshot = self.engine.snapshot();
        let stats = self.engine.stats();
        self.engine.teardown()?;

        span.record_events(scenario.events.len());
        span.record_switches(stats.switches);
        info!(
            name = %scenario.name,
            switches = stats.switches,
            idle_ticks = self.idle_ticks,
            "simulation finished"
        );

        Ok(SimReport {
            name: scenario.name.clone(),
            switches: self.engine.hook().switches().to_vec(),
            idle_ticks: self.idle_ticks,
            stats,
            snapshot,
        })
    }

    fn tick(&mut self) -> Result<(), SimError> {
        let current = match self.engine.current().cloned() {
            Some(current) => current,
            None => {
                self.idle_ticks += 1;
                return Ok(());
            }
        };

        if self.engine.scheduler_tick(&current)? {
            self.engine.schedule()?;
        }
        Ok(())
    }

    fn lookup(&self, pid: Pid) -> Result<TaskHandle, SimError> {
        self.tasks.get(&pid).cloned().ok_or(SimError::UnknownTask(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::new(SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn test_seed_runs_immediately() {
        let mut sim = sim();
        sim.seed(0).unwrap();

        assert_eq!(sim.engine().current_pid(), Some(0));
        assert_eq!(sim.task(0).unwrap().time_slice(), 10);
    }

    #[test]
    fn test_shorter_spawn_preempts() {
        let mut sim = sim();
        sim.seed(0).unwrap();
        sim.apply(&SimEvent::Spawn { pid: 1, slice: 3 }).unwrap();

        assert_eq!(sim.engine().current_pid(), Some(1));
        assert_eq!(sim.engine().hook().switches(), &[0, 1]);
    }

    #[test]
    fn test_unknown_pid_reported() {
        let mut sim = sim();
        sim.seed(0).unwrap();

        assert_eq!(
            sim.apply(&SimEvent::Sleep { pid: 42 }),
            Err(SimError::UnknownTask(42))
        );
    }

    #[test]
    fn test_duplicate_spawn_reported() {
        let mut sim = sim();
        sim.seed(0).unwrap();

        assert_eq!(
            sim.apply(&SimEvent::Spawn { pid: 0, slice: 1 }),
            Err(SimError::DuplicateTask(0))
        );
    }

    #[test]
    fn test_idle_ticks_counted() {
        let mut sim = sim();
        sim.seed(0).unwrap();
        sim.apply(&SimEvent::Sleep { pid: 0 }).unwrap();
        sim.apply(&SimEvent::Tick { count: 4 }).unwrap();

        assert_eq!(sim.idle_ticks, 4);
        assert_eq!(sim.engine().current_pid(), None);
    }

    #[test]
    fn test_fork_without_running_task() {
        let mut sim = sim();
        sim.seed(0).unwrap();
        sim.apply(&SimEvent::Sleep { pid: 0 }).unwrap();

        assert_eq!(
            sim.apply(&SimEvent::Fork { child: 1 }),
            Err(SimError::NoRunningTask)
        );
    }

    #[test]
    fn test_failed_fork_keeps_parent_quantum() {
        let mut sim = Simulation::new(SchedulerConfig::default().with_max_tasks(2)).unwrap();
        sim.seed(0).unwrap();
        sim.apply(&SimEvent::Spawn { pid: 1, slice: 5 }).unwrap();
        assert_eq!(sim.engine().current_pid(), Some(1));

        let err = sim.apply(&SimEvent::Fork { child: 2 }).unwrap_err();

        assert!(matches!(
            err,
            SimError::Scheduler(SchedulerError::ResourceExhausted(_))
        ));
        assert_eq!(sim.task(1).unwrap().time_slice(), 5);
        assert!(sim.task(2).is_none());
        assert_eq!(sim.engine().current_pid(), Some(1));
        assert_eq!(sim.engine().running_count(), 2);
    }

    #[test]
    fn test_double_sleep_surfaces_engine_error() {
        let mut sim = sim();
        sim.seed(0).unwrap();
        sim.apply(&SimEvent::Spawn { pid: 1, slice: 5 }).unwrap();
        sim.apply(&SimEvent::Sleep { pid: 1 }).unwrap();

        assert_eq!(
            sim.apply(&SimEvent::Sleep { pid: 1 }),
            Err(SimError::Scheduler(SchedulerError::NotQueued(1)))
        );
    }
}
