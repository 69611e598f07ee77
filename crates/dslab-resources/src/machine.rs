//! Simulated multi-core machine replaying workloads.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, info};
use serde::Serialize;
use sugars::{rc, refcell};

use crate::error::ReplayResult;
use crate::provider::{ProcessingUnit, ProviderRef};
use crate::switch::{ExclusiveSwitch, OutputId};
use crate::workload::{CoreConsumer, TraceWorkload};

/// Outcome of a workload replay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Time at which the last core exited.
    pub end_time: u64,
    pub demand: f64,
    pub actual: f64,
    pub overcommit: f64,
}

#[derive(PartialEq, Eq)]
struct CoreWakeup {
    time: u64,
    core: usize,
}

impl Ord for CoreWakeup {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time).then_with(|| other.core.cmp(&self.core))
    }
}

impl PartialOrd for CoreWakeup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Machine with a fixed number of identical cores exposed through an exclusive switch.
pub struct Machine {
    switch: ExclusiveSwitch,
    cores: u32,
}

impl Machine {
    /// Creates a machine with `cores` processing units performing `speed` work units per second each.
    pub fn new(cores: u32, speed: f64) -> Self {
        assert!(cores > 0, "machine needs at least one core");
        let mut switch = ExclusiveSwitch::new();
        for id in 0..cores {
            let unit: ProviderRef = rc!(refcell!(ProcessingUnit::new(id, speed)));
            let added = switch.add_input(unit);
            debug_assert!(matches!(added, Ok(true)), "core {} registered twice", id);
        }
        Self { switch, cores }
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn switch(&self) -> &ExclusiveSwitch {
        &self.switch
    }

    /// Replays the workload from time `start` until every core exits.
    ///
    /// Each core gets its own switch output for the duration of the run. Outputs are released whatever the outcome,
    /// but a replay consistency violation aborts the run.
    pub fn run(&mut self, mut workload: TraceWorkload, start: u64) -> ReplayResult<ReplayReport> {
        let mut outputs = Vec::with_capacity(self.cores as usize);
        for _ in 0..self.cores {
            match self.switch.new_output(None) {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    self.release(&outputs);
                    return Err(e.into());
                }
            }
        }
        self.switch.reset_counters();
        let consumers = workload.on_start(start, self.cores);
        let result = self.replay(consumers, &outputs, start);
        self.release(&outputs);

        let end_time = result?;
        let counters = self.switch.counters();
        info!(
            "Replay finished at {}: demand {:.3}, actual {:.3}, overcommit {:.3}",
            end_time, counters.demand, counters.actual, counters.overcommit
        );
        Ok(ReplayReport {
            end_time,
            demand: counters.demand,
            actual: counters.actual,
            overcommit: counters.overcommit,
        })
    }

    fn replay(&mut self, mut consumers: Vec<CoreConsumer>, outputs: &[OutputId], start: u64) -> ReplayResult<u64> {
        let mut wakeups: BinaryHeap<CoreWakeup> = (0..consumers.len())
            .map(|core| CoreWakeup { time: start, core })
            .collect();
        let mut end_time = start;
        while let Some(CoreWakeup { time, core }) = wakeups.pop() {
            let command = consumers[core].next_command(time)?;
            match command.deadline() {
                Some(deadline) => {
                    self.switch.push(outputs[core], time, &command)?;
                    wakeups.push(CoreWakeup { time: deadline, core });
                }
                None => {
                    debug!("Core {} exited at {}", core, time);
                    end_time = end_time.max(time);
                }
            }
        }
        Ok(end_time)
    }

    fn release(&mut self, outputs: &[OutputId]) {
        for output in outputs {
            let closed = self.switch.close_output(*output);
            debug_assert!(closed.is_ok(), "output {:?} was not opened by this machine", output);
        }
    }

    /// Shuts the machine down, cancelling all its processing units.
    pub fn close(&mut self) {
        self.switch.close();
    }
}
