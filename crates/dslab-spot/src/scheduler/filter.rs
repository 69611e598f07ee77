//! Host filters: admission predicates over `(host, task)` pairs.

use dyn_clone::{clone_trait_object, DynClone};

use crate::price::interval::PriceState;
use crate::scheduler::host::HostView;
use crate::scheduler::task::ServiceTask;

/// Predicate deciding whether a task may be placed on a host.
pub trait HostFilter: DynClone {
    fn test(&self, host: &dyn HostView, task: &dyn ServiceTask) -> bool;

    /// Short description of the filter and its parameters.
    fn name(&self) -> String;
}

clone_trait_object!(HostFilter);

////////////////////////////////////////////////////////////////////////////////

/// Admits hosts which are up and able to run tasks.
#[derive(Clone)]
pub struct ComputeFilter;

impl HostFilter for ComputeFilter {
    fn test(&self, host: &dyn HostView, _task: &dyn ServiceTask) -> bool {
        host.is_up()
    }

    fn name(&self) -> String {
        "ComputeFilter".to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Admits hosts with enough free vCPUs, allowing to provision up to `allocation_ratio` times the physical cores.
///
/// A task never overcommits against itself: it must fit into the physical cores alone.
#[derive(Clone)]
pub struct VCpuFilter {
    allocation_ratio: f64,
}

impl VCpuFilter {
    pub fn new(allocation_ratio: f64) -> Self {
        Self { allocation_ratio }
    }
}

impl HostFilter for VCpuFilter {
    fn test(&self, host: &dyn HostView, task: &dyn ServiceTask) -> bool {
        let requested = task.cpu_count() as f64;
        let total = host.cpu_capacity() as f64;
        if requested > total {
            return false;
        }
        let free = total * self.allocation_ratio - host.provisioned_cpus() as f64;
        requested <= free
    }

    fn name(&self) -> String {
        format!("VCpuFilter[allocation_ratio={}]", self.allocation_ratio)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Admits hosts with enough usable memory, allowing to provision up to `allocation_ratio` times the capacity.
#[derive(Clone)]
pub struct RamFilter {
    allocation_ratio: f64,
}

impl RamFilter {
    pub fn new(allocation_ratio: f64) -> Self {
        Self { allocation_ratio }
    }
}

impl HostFilter for RamFilter {
    fn test(&self, host: &dyn HostView, task: &dyn ServiceTask) -> bool {
        let requested = task.memory() as f64;
        let capacity = host.memory_capacity() as f64;
        if requested > capacity {
            return false;
        }
        let used = capacity - host.available_memory() as f64;
        let usable = capacity * self.allocation_ratio - used;
        usable >= requested
    }

    fn name(&self) -> String {
        format!("RamFilter[allocation_ratio={}]", self.allocation_ratio)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Admits hosts currently operating in on-demand mode.
#[derive(Clone)]
pub struct OnDemandInstanceFilter;

impl HostFilter for OnDemandInstanceFilter {
    fn test(&self, host: &dyn HostView, _task: &dyn ServiceTask) -> bool {
        host.price_state() == PriceState::OnDemand
    }

    fn name(&self) -> String {
        "OnDemandInstanceFilter".to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Admits hosts currently operating in spot mode.
#[derive(Clone)]
pub struct SpotInstanceFilter;

impl HostFilter for SpotInstanceFilter {
    fn test(&self, host: &dyn HostView, _task: &dyn ServiceTask) -> bool {
        host.price_state() == PriceState::Spot
    }

    fn name(&self) -> String {
        "SpotInstanceFilter".to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Admits hosts whose current price does not exceed the threshold.
#[derive(Clone)]
pub struct PriceFilter {
    threshold: f64,
}

impl PriceFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl HostFilter for PriceFilter {
    fn test(&self, host: &dyn HostView, _task: &dyn ServiceTask) -> bool {
        host.current_price() <= self.threshold
    }

    fn name(&self) -> String {
        format!("PriceFilter[threshold={}]", self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::host::SimHost;
    use crate::scheduler::task::Task;

    #[test]
    fn test_vcpu_filter_overcommit() {
        let mut host = SimHost::new(0, "h", 4, 100);
        let small = Task::new(0, 2, 1, 1000, 1000);
        let large = Task::new(1, 5, 1, 1000, 1000);
        host.allocate(&small);

        assert!(VCpuFilter::new(1.0).test(&host, &small));
        assert!(!VCpuFilter::new(1.0).test(&host, &Task::new(2, 3, 1, 1000, 1000)));
        assert!(VCpuFilter::new(2.0).test(&host, &Task::new(2, 3, 1, 1000, 1000)));
        // never overcommits against itself
        assert!(!VCpuFilter::new(4.0).test(&host, &large));
    }

    #[test]
    fn test_ram_filter_overcommit() {
        let mut host = SimHost::new(0, "h", 100, 10);
        host.allocate(&Task::new(0, 1, 8, 1000, 1000));
        let task = Task::new(1, 1, 6, 1000, 1000);

        assert!(!RamFilter::new(1.0).test(&host, &task));
        // usable = 10 * 1.5 - 8 = 7
        assert!(RamFilter::new(1.5).test(&host, &task));
        assert!(!RamFilter::new(1.5).test(&host, &Task::new(2, 1, 11, 1000, 1000)));
    }

    #[test]
    fn test_price_state_filters() {
        let spot = SimHost::new(0, "spot", 4, 4).with_prices(1.0, 0.2);
        let on_demand = SimHost::new(1, "on_demand", 4, 4).with_prices(1.0, 1.5);
        let task = Task::new(0, 1, 1, 1000, 1000);

        assert!(SpotInstanceFilter.test(&spot, &task));
        assert!(!SpotInstanceFilter.test(&on_demand, &task));
        assert!(OnDemandInstanceFilter.test(&on_demand, &task));
        assert!(!OnDemandInstanceFilter.test(&spot, &task));
    }

    #[test]
    fn test_compute_and_price_filters() {
        let mut host = SimHost::new(0, "h", 4, 4).with_prices(1.0, 0.2);
        let task = Task::new(0, 1, 1, 1000, 1000);

        assert!(PriceFilter::new(0.2).test(&host, &task));
        assert!(!PriceFilter::new(0.1).test(&host, &task));
        assert!(ComputeFilter.test(&host, &task));
        host.set_up(false);
        assert!(!ComputeFilter.test(&host, &task));
    }
}
