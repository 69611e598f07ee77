//! Exclusive resource switch.
//!
//! The switch owns a pool of forwarders, each bound to exactly one registered input (provider) for its whole life.
//! An output borrows one forwarder from the pool and gives it back on close, so outputs sharing a forwarder are
//! mutually exclusive in time.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::command::ResourceCommand;
use crate::counters::ResourceCounters;
use crate::error::{SwitchError, SwitchResult};
use crate::provider::ProviderRef;

/// Handle of an output opened on a switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputId(u64);

impl OutputId {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchState {
    Open,
    Closed,
}

struct Forwarder {
    input: ProviderRef,
}

struct Output {
    forwarder: usize,
    interference_key: Option<String>,
}

pub struct ExclusiveSwitch {
    state: SwitchState,
    inputs: IndexMap<u32, ProviderRef>,
    forwarders: Vec<Forwarder>,
    available: VecDeque<usize>,
    outputs: HashMap<OutputId, Output>,
    next_output_id: u64,
}

impl ExclusiveSwitch {
    pub fn new() -> Self {
        Self {
            state: SwitchState::Open,
            inputs: IndexMap::new(),
            forwarders: Vec::new(),
            available: VecDeque::new(),
            outputs: HashMap::new(),
            next_output_id: 0,
        }
    }

    /// Registers a provider and adds a forwarder bound to it to the pool.
    ///
    /// Returns `false` if the provider is already registered.
    pub fn add_input(&mut self, input: ProviderRef) -> SwitchResult<bool> {
        self.check_open()?;
        let id = input.borrow().id();
        if self.inputs.contains_key(&id) {
            return Ok(false);
        }
        self.inputs.insert(id, input.clone());
        self.forwarders.push(Forwarder { input });
        self.available.push_back(self.forwarders.len() - 1);
        Ok(true)
    }

    /// Takes a forwarder from the pool and opens an output over it.
    ///
    /// Fails with [`SwitchError::CapacityExhausted`] if the pool is empty, the caller should retry later
    /// or use another switch.
    pub fn new_output(&mut self, interference_key: Option<&str>) -> SwitchResult<OutputId> {
        self.check_open()?;
        let Some(forwarder) = self.available.pop_front() else {
            warn!("Can't open output: all {} resource channels are in use", self.forwarders.len());
            return Err(SwitchError::CapacityExhausted);
        };
        let id = OutputId(self.next_output_id);
        self.next_output_id += 1;
        self.outputs.insert(
            id,
            Output {
                forwarder,
                interference_key: interference_key.map(str::to_string),
            },
        );
        debug!("Opened output {} over channel {}", id.0, forwarder);
        Ok(id)
    }

    /// Closes the output and returns its forwarder to the pool.
    pub fn close_output(&mut self, output: OutputId) -> SwitchResult<()> {
        let Output { forwarder, .. } = self.outputs.remove(&output).ok_or(SwitchError::UnknownOutput(output.0))?;
        self.available.push_back(forwarder);
        Ok(())
    }

    /// Forwards the command issued at time `now` through the output to the bound provider.
    ///
    /// A provider signalling completion is deregistered from the switch, its forwarder stays in the pool.
    pub fn push(&mut self, output: OutputId, now: u64, command: &ResourceCommand) -> SwitchResult<()> {
        self.check_open()?;
        let forwarder = self.outputs.get(&output).ok_or(SwitchError::UnknownOutput(output.0))?.forwarder;
        let input = &self.forwarders[forwarder].input;
        input.borrow_mut().push(now, command);
        let (id, finished) = {
            let input = input.borrow();
            (input.id(), input.is_finished())
        };
        if finished {
            self.on_input_finished(id);
        }
        Ok(())
    }

    fn on_input_finished(&mut self, id: u32) {
        if self.inputs.shift_remove(&id).is_some() {
            debug!("Input {} finished and was deregistered", id);
        }
    }

    pub fn interference_key(&self, output: OutputId) -> Option<&str> {
        self.outputs.get(&output)?.interference_key.as_deref()
    }

    /// Sum of the counters of all registered inputs.
    pub fn counters(&self) -> ResourceCounters {
        self.inputs.values().map(|input| input.borrow().counters()).sum()
    }

    /// Resets the counters of all registered inputs.
    pub fn reset_counters(&mut self) {
        for input in self.inputs.values() {
            input.borrow_mut().reset_counters();
        }
    }

    /// Closes the switch and cancels all registered inputs. The switch can't be reopened.
    pub fn close(&mut self) {
        if self.state == SwitchState::Closed {
            return;
        }
        self.state = SwitchState::Closed;
        for input in self.inputs.values() {
            input.borrow_mut().cancel();
        }
        debug!("Switch closed, {} inputs cancelled", self.inputs.len());
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of forwarders which can be used by new outputs.
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn check_open(&self) -> SwitchResult<()> {
        match self.state {
            SwitchState::Open => Ok(()),
            SwitchState::Closed => Err(SwitchError::SwitchClosed),
        }
    }
}

impl Default for ExclusiveSwitch {
    fn default() -> Self {
        Self::new()
    }
}
