use log::debug;

use crate::scheduler::host::HostRef;
use crate::scheduler::pipeline::{select_best, FilterChain, Overlay};
use crate::scheduler::reevaluate::apply_safety_net;
use crate::scheduler::strategy::{ComputeScheduler, HostPool};
use crate::scheduler::task::{PurchaseRequirement, ServiceTask};
use crate::scheduler::weigher::{OnDemandPriceWeigher, PriceWeigher};

/// Places a task on the cheapest host operating in the purchasing mode the task asks for.
///
/// Tasks which don't require on-demand hosts are placed on spot hosts. If an on-demand task finds no on-demand
/// host, the scheduler falls back to any admissible host with the lowest on-demand price. Running tasks are
/// required to go on-demand by the safety net rule only.
pub struct GreedyPrice {
    hosts: HostPool,
    filters: FilterChain,
}

impl GreedyPrice {
    pub fn new(filters: FilterChain) -> Self {
        Self {
            hosts: HostPool::new(),
            filters,
        }
    }
}

impl ComputeScheduler for GreedyPrice {
    fn add_host(&mut self, host: HostRef) {
        self.hosts.add(host);
    }

    fn remove_host(&mut self, host: &HostRef) {
        self.hosts.remove(host);
    }

    fn update_host(&mut self, host: &HostRef) {
        self.hosts.update(host);
    }

    fn select(&self, task: &dyn ServiceTask) -> Option<HostRef> {
        let overlay = if task.requires_on_demand() {
            Overlay::OnDemandOnly
        } else {
            Overlay::SpotOnly
        };
        let selected = select_best(
            self.hosts.iter(),
            &self.filters.compose(&[overlay]),
            &[&PriceWeigher::cheapest()],
            task,
        );
        if selected.is_some() || !task.requires_on_demand() {
            return selected;
        }

        debug!(
            "Task {}: no on-demand host available, falling back to lowest on-demand price",
            task.id()
        );
        select_best(
            self.hosts.iter(),
            &self.filters.compose(&[]),
            &[&OnDemandPriceWeigher::cheapest()],
            task,
        )
    }

    fn reevaluate(&self, task: &dyn ServiceTask, _now: u64, delay: u64) -> PurchaseRequirement {
        apply_safety_net(PurchaseRequirement::Any, task, delay)
    }

    fn filters(&self) -> &FilterChain {
        &self.filters
    }

    fn host_count(&self) -> usize {
        self.hosts.len()
    }
}
