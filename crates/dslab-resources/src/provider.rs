//! Resource providers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::ResourceCommand;
use crate::counters::ResourceCounters;

/// Source of a resource which executes consumer commands.
pub trait ResourceProvider {
    fn id(&self) -> u32;

    /// Applies the command issued by the consumer at time `now`.
    fn push(&mut self, now: u64, command: &ResourceCommand);

    fn counters(&self) -> ResourceCounters;

    fn reset_counters(&mut self);

    /// Stops the provider, further commands are ignored.
    fn cancel(&mut self);

    /// Whether the provider has received `Exit` or was cancelled.
    fn is_finished(&self) -> bool;
}

pub type ProviderRef = Rc<RefCell<dyn ResourceProvider>>;

/// Processing unit (core) performing up to `speed` work units per second.
pub struct ProcessingUnit {
    id: u32,
    speed: f64,
    counters: ResourceCounters,
    finished: bool,
}

impl ProcessingUnit {
    pub fn new(id: u32, speed: f64) -> Self {
        Self {
            id,
            speed,
            counters: ResourceCounters::default(),
            finished: false,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl ResourceProvider for ProcessingUnit {
    fn id(&self) -> u32 {
        self.id
    }

    fn push(&mut self, now: u64, command: &ResourceCommand) {
        if self.finished {
            return;
        }
        match *command {
            ResourceCommand::Consume { work, limit, deadline } => {
                let duration = deadline.saturating_sub(now) as f64 / 1000.;
                let capacity = limit.min(self.speed) * duration;
                let actual = work.min(capacity);
                self.counters.demand += work;
                self.counters.actual += actual;
                self.counters.overcommit += work - actual;
            }
            ResourceCommand::Idle { .. } => {}
            ResourceCommand::Exit => self.finished = true,
        }
    }

    fn counters(&self) -> ResourceCounters {
        self.counters
    }

    fn reset_counters(&mut self) {
        self.counters.reset();
    }

    fn cancel(&mut self) {
        self.finished = true;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_consume_within_capacity() {
        let mut unit = ProcessingUnit::new(0, 2.);
        unit.push(0, &ResourceCommand::Consume { work: 1., limit: 1., deadline: 1000 });
        let counters = unit.counters();
        assert_abs_diff_eq!(counters.demand, 1.);
        assert_abs_diff_eq!(counters.actual, 1.);
        assert_abs_diff_eq!(counters.overcommit, 0.);
    }

    #[test]
    fn test_consume_overcommit() {
        let mut unit = ProcessingUnit::new(0, 0.5);
        unit.push(1000, &ResourceCommand::Consume { work: 2., limit: 4., deadline: 3000 });
        let counters = unit.counters();
        assert_abs_diff_eq!(counters.actual, 1.);
        assert_abs_diff_eq!(counters.overcommit, 1.);

        unit.reset_counters();
        assert_eq!(unit.counters(), ResourceCounters::default());
    }

    #[test]
    fn test_exit_and_cancel() {
        let mut unit = ProcessingUnit::new(0, 1.);
        unit.push(0, &ResourceCommand::Idle { deadline: 10 });
        assert!(!unit.is_finished());
        unit.push(10, &ResourceCommand::Exit);
        assert!(unit.is_finished());
        unit.push(10, &ResourceCommand::Consume { work: 1., limit: 1., deadline: 1000 });
        assert_abs_diff_eq!(unit.counters().demand, 0.);

        let mut unit = ProcessingUnit::new(1, 1.);
        unit.cancel();
        assert!(unit.is_finished());
    }
}
