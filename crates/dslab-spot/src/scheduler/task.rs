//! Tasks submitted for placement.

use serde::Serialize;

/// Read-only view of a task as seen by schedulers.
///
/// All times are in milliseconds.
pub trait ServiceTask {
    fn id(&self) -> u64;

    /// Number of requested vCPUs.
    fn cpu_count(&self) -> u32;

    /// Amount of requested memory.
    fn memory(&self) -> u64;

    /// Whether the task must run on a host operating in on-demand mode.
    fn requires_on_demand(&self) -> bool;

    /// Whether the task must run on a host operating in spot mode.
    fn requires_spot(&self) -> bool;

    /// Total computation time of the task.
    fn duration(&self) -> u64;

    /// Computation time already completed.
    fn current_progress(&self) -> u64;

    /// Time left until the task deadline at the current simulation time. Negative once the deadline is missed.
    fn time_to_deadline(&self) -> i64;
}

/// Purchasing requirement of a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub enum PurchaseRequirement {
    #[default]
    Any,
    OnDemand,
    Spot,
}

/// Plain task record driven by the surrounding simulation.
#[derive(Clone, Debug, Serialize)]
pub struct Task {
    pub id: u64,
    pub cpu_count: u32,
    pub memory: u64,
    pub duration: u64,
    /// Absolute deadline in simulation time.
    pub deadline: u64,
    pub requirement: PurchaseRequirement,
    progress: u64,
    now: u64,
}

impl Task {
    pub fn new(id: u64, cpu_count: u32, memory: u64, duration: u64, deadline: u64) -> Self {
        Self {
            id,
            cpu_count,
            memory,
            duration,
            deadline,
            requirement: PurchaseRequirement::Any,
            progress: 0,
            now: 0,
        }
    }

    pub fn with_requirement(mut self, requirement: PurchaseRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Moves the task clock used to compute the time to deadline.
    pub fn set_time(&mut self, now: u64) {
        self.now = now;
    }

    /// Records completed computation time, never exceeding the task duration.
    pub fn add_progress(&mut self, progress: u64) {
        self.progress = (self.progress + progress).min(self.duration);
    }

    pub fn remaining_computation_time(&self) -> u64 {
        self.duration - self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.progress == self.duration
    }
}

impl ServiceTask for Task {
    fn id(&self) -> u64 {
        self.id
    }

    fn cpu_count(&self) -> u32 {
        self.cpu_count
    }

    fn memory(&self) -> u64 {
        self.memory
    }

    fn requires_on_demand(&self) -> bool {
        self.requirement == PurchaseRequirement::OnDemand
    }

    fn requires_spot(&self) -> bool {
        self.requirement == PurchaseRequirement::Spot
    }

    fn duration(&self) -> u64 {
        self.duration
    }

    fn current_progress(&self) -> u64 {
        self.progress
    }

    fn time_to_deadline(&self) -> i64 {
        self.deadline as i64 - self.now as i64
    }
}
