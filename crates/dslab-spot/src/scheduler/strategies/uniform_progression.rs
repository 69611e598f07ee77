use crate::scheduler::host::HostRef;
use crate::scheduler::pipeline::{select_best, FilterChain, Overlay};
use crate::scheduler::reevaluate::{apply_safety_net, hysteria};
use crate::scheduler::strategy::{ComputeScheduler, HostPool};
use crate::scheduler::task::{PurchaseRequirement, ServiceTask};
use crate::scheduler::weigher::PriceWeigher;

/// Places a task on the cheapest admissible host, restricted to the purchasing mode the task requires, if any.
///
/// Running tasks ahead of their expected progress are moved to spot hosts, tasks at risk of missing the deadline
/// to on-demand hosts.
pub struct UniformProgression {
    hosts: HostPool,
    filters: FilterChain,
}

impl UniformProgression {
    pub fn new(filters: FilterChain) -> Self {
        Self {
            hosts: HostPool::new(),
            filters,
        }
    }
}

impl ComputeScheduler for UniformProgression {
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
        let mut overlays = Vec::with_capacity(2);
        if task.requires_on_demand() {
            overlays.push(Overlay::OnDemandOnly);
        }
        if task.requires_spot() {
            overlays.push(Overlay::SpotOnly);
        }
        select_best(
            self.hosts.iter(),
            &self.filters.compose(&overlays),
            &[&PriceWeigher::cheapest()],
            task,
        )
    }

    fn reevaluate(&self, task: &dyn ServiceTask, now: u64, delay: u64) -> PurchaseRequirement {
        let requirement = if hysteria(task, now, delay) {
            PurchaseRequirement::Spot
        } else {
            PurchaseRequirement::Any
        };
        apply_safety_net(requirement, task, delay)
    }

    fn filters(&self) -> &FilterChain {
        &self.filters
    }

    fn host_count(&self) -> usize {
        self.hosts.len()
    }
}
