//! Host weighers: scoring functions over `(host, task)` pairs.

use crate::scheduler::host::HostView;
use crate::scheduler::task::ServiceTask;

/// Scores a host for a task. The score used for selection is `multiplier * weight`, higher is better.
pub trait HostWeigher {
    fn get_weight(&self, host: &dyn HostView, task: &dyn ServiceTask) -> f64;

    /// A negative multiplier inverts the preference, e.g. favours cheaper hosts for price weighers.
    fn multiplier(&self) -> f64;
}

/// Weighs hosts by their current price.
pub struct PriceWeigher {
    multiplier: f64,
}

impl PriceWeigher {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Weigher preferring the cheapest host.
    pub fn cheapest() -> Self {
        Self::new(-1.)
    }
}

impl HostWeigher for PriceWeigher {
    fn get_weight(&self, host: &dyn HostView, _task: &dyn ServiceTask) -> f64 {
        host.current_price()
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

/// Weighs hosts by their on-demand price, whatever mode they currently operate in.
pub struct OnDemandPriceWeigher {
    multiplier: f64,
}

impl OnDemandPriceWeigher {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn cheapest() -> Self {
        Self::new(-1.)
    }
}

impl HostWeigher for OnDemandPriceWeigher {
    fn get_weight(&self, host: &dyn HostView, _task: &dyn ServiceTask) -> f64 {
        host.on_demand_price()
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}
