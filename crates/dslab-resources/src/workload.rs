//! Replay of fragment traces on multi-core machines.

use std::cell::RefCell;
use std::rc::Rc;

use log::error;
use serde::{Deserialize, Serialize};

use crate::barrier::ConsumerBarrier;
use crate::command::ResourceCommand;
use crate::error::{ReplayError, ReplayResult};

/// Part of a workload trace with constant demand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Fragment duration in milliseconds.
    pub duration: u64,
    /// Demand rate of each active core in work units per second.
    pub usage: f64,
    /// Number of cores with demand, the remaining cores idle.
    pub cores: u32,
}

impl Fragment {
    pub fn new(duration: u64, usage: f64, cores: u32) -> Self {
        Self { duration, usage, cores }
    }

    /// Total work owed by each active core over the whole fragment.
    pub fn work(&self) -> f64 {
        self.duration as f64 / 1000. * self.usage
    }
}

struct PlayerState {
    fragments: Box<dyn Iterator<Item = Fragment>>,
    current: Option<Fragment>,
    offset: u64,
    barrier: ConsumerBarrier,
}

/// Workload replaying a lazy sequence of fragments.
///
/// All cores of the machine share the current fragment and the time it started at. The fragment changes only when
/// every core has issued its command for it, so the cores never observe different fragments.
pub struct TraceWorkload {
    fragments: Option<Box<dyn Iterator<Item = Fragment>>>,
    state: Option<Rc<RefCell<PlayerState>>>,
}

impl TraceWorkload {
    pub fn new<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Fragment>,
        I::IntoIter: 'static,
    {
        Self {
            fragments: Some(Box::new(fragments.into_iter())),
            state: None,
        }
    }

    /// Starts the replay at time `now` on a machine with `cores` cores and returns one consumer per core.
    ///
    /// # Panics
    ///
    /// Panics if the workload is already started or `cores` is zero.
    pub fn on_start(&mut self, now: u64, cores: u32) -> Vec<CoreConsumer> {
        let mut fragments = self.fragments.take().expect("workload is already started");
        let current = fragments.next();
        let state = Rc::new(RefCell::new(PlayerState {
            fragments,
            current,
            offset: now,
            barrier: ConsumerBarrier::new(cores as usize),
        }));
        self.state = Some(state.clone());
        (0..cores)
            .map(|index| CoreConsumer {
                index,
                state: state.clone(),
            })
            .collect()
    }

    /// Time at which the current fragment started, `None` before start.
    pub fn offset(&self) -> Option<u64> {
        self.state.as_ref().map(|state| state.borrow().offset)
    }

    /// Fragment currently replayed, `None` before start or after the trace is exhausted.
    pub fn current_fragment(&self) -> Option<Fragment> {
        self.state.as_ref().and_then(|state| state.borrow().current)
    }
}

/// Consumer replaying the workload on one core.
pub struct CoreConsumer {
    index: u32,
    state: Rc<RefCell<PlayerState>>,
}

impl CoreConsumer {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the command of this core for the current fragment.
    ///
    /// Fails if the end of the current fragment is already passed at `now`, which means the caller skipped a
    /// wake-up. The failure is fatal for the replay.
    pub fn next_command(&mut self, now: u64) -> ReplayResult<ResourceCommand> {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let Some(fragment) = state.current else {
            return Ok(ResourceCommand::Exit);
        };

        let work = fragment.work();
        let deadline = state.offset + fragment.duration;
        if deadline < now {
            error!(
                "Core {}: fragment deadline {} is already passed at {}",
                self.index, deadline, now
            );
            return Err(ReplayError::ReplayConsistencyViolation { deadline, now });
        }

        let command = if self.index < fragment.cores && work > 0. {
            ResourceCommand::Consume {
                work,
                limit: fragment.usage,
                deadline,
            }
        } else {
            ResourceCommand::Idle { deadline }
        };

        if state.barrier.enter() {
            state.current = state.fragments.next();
            state.offset += fragment.duration;
        }
        Ok(command)
    }
}

/// Collects fragments of a workload trace.
#[derive(Default)]
pub struct TraceWorkloadBuilder {
    fragments: Vec<Fragment>,
}

impl TraceWorkloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, duration: u64, usage: f64, cores: u32) -> &mut Self {
        self.fragments.push(Fragment::new(duration, usage, cores));
        self
    }

    pub fn total_duration(&self) -> u64 {
        self.fragments.iter().map(|f| f.duration).sum()
    }

    pub fn fragments_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn build(self) -> TraceWorkload {
        TraceWorkload::new(self.fragments)
    }
}

impl From<Vec<Fragment>> for TraceWorkloadBuilder {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut builder = TraceWorkloadBuilder::new();
        builder.add(1000, 1.0, 2).add(500, 0.5, 1);
        assert_eq!(builder.total_duration(), 1500);
        assert_eq!(builder.fragments_count(), 2);
    }

    #[test]
    fn test_empty_workload_exits() {
        let mut workload = TraceWorkload::new(Vec::new());
        let mut consumers = workload.on_start(100, 2);
        assert_eq!(consumers[0].next_command(100), Ok(ResourceCommand::Exit));
        assert_eq!(consumers[1].next_command(100), Ok(ResourceCommand::Exit));
        assert_eq!(workload.offset(), Some(100));
    }

    #[test]
    fn test_zero_usage_idles() {
        let mut workload = TraceWorkload::new(vec![Fragment::new(1000, 0., 1)]);
        let mut consumers = workload.on_start(0, 1);
        assert_eq!(consumers[0].next_command(0), Ok(ResourceCommand::Idle { deadline: 1000 }));
        assert_eq!(consumers[0].next_command(1000), Ok(ResourceCommand::Exit));
    }

    #[test]
    fn test_missed_deadline() {
        let mut workload = TraceWorkload::new(vec![Fragment::new(1000, 1., 1), Fragment::new(1000, 1., 1)]);
        let mut consumers = workload.on_start(0, 1);
        consumers[0].next_command(0).unwrap();
        assert_eq!(
            consumers[0].next_command(2500),
            Err(ReplayError::ReplayConsistencyViolation {
                deadline: 2000,
                now: 2500
            })
        );
    }
}
