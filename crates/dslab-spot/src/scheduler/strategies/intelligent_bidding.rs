use log::debug;

use crate::error::ConfigResult;
use crate::price::interval::PriceState;
use crate::scheduler::host::HostRef;
use crate::scheduler::pipeline::{select_best, FilterChain, Overlay};
use crate::scheduler::reevaluate::remaining_computation_time;
use crate::scheduler::strategy::{float_option, parse_options, ComputeScheduler, HostPool};
use crate::scheduler::task::{PurchaseRequirement, ServiceTask};
use crate::scheduler::weigher::{OnDemandPriceWeigher, PriceWeigher};

pub const DEFAULT_RESCHEDULE_PENALTY: f64 = 0.05;
pub const DEFAULT_ALPHA: f64 = -0.0005;
pub const DEFAULT_BETA: f64 = 0.9;

/// Computes the price a task is willing to pay given the time left before it has to switch to on-demand hosts.
pub fn compute_bid(on_demand_price: f64, spot_price: f64, time_to_on_demand: f64, alpha: f64, beta: f64) -> f64 {
    let decay = (alpha * time_to_on_demand).exp();
    decay * on_demand_price + (1. - decay * (beta * on_demand_price + (1. - beta) * spot_price))
}

/// Chooses the purchasing mode of a task by bidding against the cheapest on-demand and spot offers.
///
/// A task too close to its deadline to survive a reschedule always goes to an on-demand host. Otherwise the bid
/// decays towards the spot price as the slack before the deadline grows, and the task goes to an on-demand
/// host only if the bid reaches the on-demand price. Explicit purchasing requirements of a task take precedence.
/// A task sent to on-demand hosts while none is admissible falls back to the lowest on-demand price among all
/// admissible hosts.
pub struct IntelligentBidding {
    hosts: HostPool,
    filters: FilterChain,
    reschedule_penalty: f64,
    alpha: f64,
    beta: f64,
}

impl IntelligentBidding {
    pub fn new(filters: FilterChain) -> Self {
        Self::with_params(filters, DEFAULT_RESCHEDULE_PENALTY, DEFAULT_ALPHA, DEFAULT_BETA)
    }

    pub fn with_params(filters: FilterChain, reschedule_penalty: f64, alpha: f64, beta: f64) -> Self {
        Self {
            hosts: HostPool::new(),
            filters,
            reschedule_penalty,
            alpha,
            beta,
        }
    }

    /// Creates the scheduler from options string, e.g. `reschedule_penalty=0.1,beta=0.8`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str, filters: FilterChain) -> ConfigResult<Self> {
        let options = parse_options(s);
        Ok(Self::with_params(
            filters,
            float_option(&options, "reschedule_penalty", DEFAULT_RESCHEDULE_PENALTY)?,
            float_option(&options, "alpha", DEFAULT_ALPHA)?,
            float_option(&options, "beta", DEFAULT_BETA)?,
        ))
    }

    /// Returns the lowest current price among admissible hosts in the given mode which can fit the task.
    pub fn lowest_available_price(&self, state: PriceState, task: &dyn ServiceTask) -> Option<f64> {
        let filters = self.filters.compose(&[overlay_for(state)]);
        self.hosts
            .iter()
            .map(|host| host.borrow())
            .filter(|host| filters.test(&**host, task) && host.can_fit(task))
            .map(|host| host.current_price())
            .min_by(|a, b| a.total_cmp(b))
    }

    fn choose_overlay(&self, task: &dyn ServiceTask) -> Option<Overlay> {
        if task.requires_on_demand() {
            return Some(Overlay::OnDemandOnly);
        }
        if task.requires_spot() {
            return Some(Overlay::SpotOnly);
        }

        let time_to_on_demand = task.time_to_deadline() as f64 - remaining_computation_time(task) as f64;
        let reschedule_time = task.duration() as f64 * self.reschedule_penalty;
        if time_to_on_demand - reschedule_time <= 0. {
            debug!("Task {}: deadline too close, forcing on-demand host", task.id());
            return Some(Overlay::OnDemandOnly);
        }

        let on_demand_price = self.lowest_available_price(PriceState::OnDemand, task);
        let spot_price = self.lowest_available_price(PriceState::Spot, task);
        match (on_demand_price, spot_price) {
            (Some(on_demand_price), Some(spot_price)) => {
                let bid = compute_bid(on_demand_price, spot_price, time_to_on_demand, self.alpha, self.beta);
                debug!(
                    "Task {}: bid {:.4} against on-demand price {:.4} (spot price {:.4})",
                    task.id(),
                    bid,
                    on_demand_price,
                    spot_price
                );
                if bid >= on_demand_price {
                    Some(Overlay::OnDemandOnly)
                } else {
                    Some(Overlay::SpotOnly)
                }
            }
            (Some(_), None) => Some(Overlay::OnDemandOnly),
            (None, Some(_)) => Some(Overlay::SpotOnly),
            (None, None) => None,
        }
    }
}

fn overlay_for(state: PriceState) -> Overlay {
    match state {
        PriceState::OnDemand => Overlay::OnDemandOnly,
        PriceState::Spot => Overlay::SpotOnly,
    }
}

impl ComputeScheduler for IntelligentBidding {
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
        let Some(overlay) = self.choose_overlay(task) else {
            debug!("Task {}: no host can fit it", task.id());
            return None;
        };
        let selected = select_best(
            self.hosts.iter(),
            &self.filters.compose(&[overlay]),
            &[&PriceWeigher::cheapest()],
            task,
        );
        if selected.is_some() || overlay != Overlay::OnDemandOnly {
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

    /// Bids for a running task, using `delay` as the reschedule time.
    ///
    /// A bid between the lowest spot and on-demand prices leaves the task where it is.
    fn reevaluate(&self, task: &dyn ServiceTask, _now: u64, delay: u64) -> PurchaseRequirement {
        let time_to_on_demand = task.time_to_deadline() - remaining_computation_time(task) as i64;
        if time_to_on_demand - delay as i64 <= 0 {
            return PurchaseRequirement::OnDemand;
        }
        let on_demand_price = self.lowest_available_price(PriceState::OnDemand, task);
        let spot_price = self.lowest_available_price(PriceState::Spot, task);
        match (on_demand_price, spot_price) {
            (Some(on_demand_price), Some(spot_price)) => {
                let bid = compute_bid(
                    on_demand_price,
                    spot_price,
                    time_to_on_demand as f64,
                    self.alpha,
                    self.beta,
                );
                if bid >= on_demand_price {
                    PurchaseRequirement::OnDemand
                } else if bid <= spot_price {
                    PurchaseRequirement::Spot
                } else {
                    PurchaseRequirement::Any
                }
            }
            (Some(_), None) => PurchaseRequirement::OnDemand,
            (None, Some(_)) => PurchaseRequirement::Spot,
            (None, None) => PurchaseRequirement::Any,
        }
    }

    fn filters(&self) -> &FilterChain {
        &self.filters
    }

    fn host_count(&self) -> usize {
        self.hosts.len()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_bid_formula() {
        let bid = compute_bid(1.0, 0.3, 2000., DEFAULT_ALPHA, DEFAULT_BETA);
        let decay = (-1.0f64).exp();
        assert_abs_diff_eq!(bid, decay + (1. - decay * 0.93), epsilon = 1e-12);
        assert_abs_diff_eq!(bid, 1.0257516, epsilon = 1e-6);
        assert!(bid >= 1.0);
    }

    #[test]
    fn test_bid_decays_with_slack() {
        // with a lot of slack the bid approaches 1 regardless of prices
        let bid = compute_bid(2.0, 0.3, 1e9, DEFAULT_ALPHA, DEFAULT_BETA);
        assert_abs_diff_eq!(bid, 1.0, epsilon = 1e-9);
        assert!(bid < 2.0);
    }
}
