//! Filter chain composition and weighted host selection.

use std::rc::Rc;

use crate::scheduler::filter::{
    ComputeFilter, HostFilter, OnDemandInstanceFilter, RamFilter, SpotInstanceFilter, VCpuFilter,
};
use crate::scheduler::host::{HostRef, HostView};
use crate::scheduler::task::ServiceTask;
use crate::scheduler::weigher::HostWeigher;

pub const DEFAULT_VCPU_ALLOCATION_RATIO: f64 = 1.0;
pub const DEFAULT_RAM_ALLOCATION_RATIO: f64 = 1.5;

/// Base filters evaluated against every host before any strategy-specific logic.
///
/// The chain is fixed once a scheduler is built. Per-call filters are layered on top of it with
/// [`compose`](FilterChain::compose) and never become part of the chain.
#[derive(Clone)]
pub struct FilterChain {
    filters: Vec<Box<dyn HostFilter>>,
}

impl FilterChain {
    /// Creates an empty chain admitting every host.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Creates the standard chain: compute capability, vCPU headroom and RAM headroom.
    pub fn base(vcpu_allocation_ratio: f64, ram_allocation_ratio: f64) -> Self {
        Self::new()
            .with_filter(ComputeFilter)
            .with_filter(VCpuFilter::new(vcpu_allocation_ratio))
            .with_filter(RamFilter::new(ram_allocation_ratio))
    }

    pub fn with_filter<F: HostFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Builds a filter set from the chain plus ephemeral overlays, leaving the chain untouched.
    pub fn compose(&self, overlays: &[Overlay]) -> FilterSet<'_> {
        FilterSet {
            base: &self.filters,
            overlays: overlays.iter().map(|o| o.filter()).collect(),
        }
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::base(DEFAULT_VCPU_ALLOCATION_RATIO, DEFAULT_RAM_ALLOCATION_RATIO)
    }
}

/// Per-call filter reflecting a purchasing requirement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    OnDemandOnly,
    SpotOnly,
}

impl Overlay {
    fn filter(&self) -> &'static dyn HostFilter {
        match self {
            Overlay::OnDemandOnly => &OnDemandInstanceFilter,
            Overlay::SpotOnly => &SpotInstanceFilter,
        }
    }
}

/// Borrowed base chain plus overlays, alive for a single selection.
pub struct FilterSet<'a> {
    base: &'a [Box<dyn HostFilter>],
    overlays: Vec<&'static dyn HostFilter>,
}

impl FilterSet<'_> {
    pub fn test(&self, host: &dyn HostView, task: &dyn ServiceTask) -> bool {
        self.base.iter().all(|f| f.test(host, task)) && self.overlays.iter().all(|f| f.test(host, task))
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns the admissible host with the highest `sum(multiplier * weight)`.
///
/// Ties are resolved in favour of the host visited first.
pub fn select_best<'a, I>(
    hosts: I,
    filters: &FilterSet,
    weighers: &[&dyn HostWeigher],
    task: &dyn ServiceTask,
) -> Option<HostRef>
where
    I: IntoIterator<Item = &'a HostRef>,
{
    let mut result: Option<&HostRef> = None;
    let mut best_score = f64::NEG_INFINITY;
    for host in hosts {
        let view = host.borrow();
        if !filters.test(&*view, task) {
            continue;
        }
        let score: f64 = weighers
            .iter()
            .map(|w| w.multiplier() * w.get_weight(&*view, task))
            .sum();
        if result.is_none() || score > best_score {
            best_score = score;
            result = Some(host);
        }
    }
    result.map(Rc::clone)
}
