//! Hosts as seen by schedulers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::price::interval::PriceState;
use crate::price::model::PriceModel;
use crate::scheduler::task::ServiceTask;

/// Read-only snapshot of a compute host.
///
/// Views are owned by the simulation; schedulers keep shared references and must re-read the view after
/// any mutation instead of caching its values.
pub trait HostView {
    /// Host identity, used for set membership in schedulers.
    fn id(&self) -> u32;

    /// Whether the host accepts new tasks.
    fn is_up(&self) -> bool;

    fn cpu_capacity(&self) -> u32;

    /// Number of vCPUs already promised to running tasks.
    fn provisioned_cpus(&self) -> u32;

    fn memory_capacity(&self) -> u64;

    fn available_memory(&self) -> u64;

    /// Price paid in the current purchasing mode.
    fn current_price(&self) -> f64;

    fn on_demand_price(&self) -> f64;

    fn spot_price(&self) -> f64;

    fn price_state(&self) -> PriceState;

    /// Checks whether the task fits into the host hardware, regardless of current allocations.
    fn can_fit(&self, task: &dyn ServiceTask) -> bool {
        task.cpu_count() <= self.cpu_capacity() && task.memory() <= self.memory_capacity()
    }
}

/// Shared handle to a host view.
pub type HostRef = Rc<RefCell<dyn HostView>>;

/// Simulated host with capacity bookkeeping, price signal and cost meter.
pub struct SimHost {
    pub id: u32,
    pub name: String,
    cpu_capacity: u32,
    memory_capacity: u64,
    provisioned_cpus: u32,
    provisioned_memory: u64,
    up: bool,
    on_demand_price: f64,
    spot_price: f64,
    price_state: PriceState,
    total_cost: f64,
    last_cost_update: u64,
    price_model: Option<PriceModel>,
}

impl SimHost {
    /// Creates an idle host operating in on-demand mode with zero prices.
    pub fn new(id: u32, name: &str, cpu_capacity: u32, memory_capacity: u64) -> Self {
        Self {
            id,
            name: name.to_string(),
            cpu_capacity,
            memory_capacity,
            provisioned_cpus: 0,
            provisioned_memory: 0,
            up: true,
            on_demand_price: 0.,
            spot_price: 0.,
            price_state: PriceState::OnDemand,
            total_cost: 0.,
            last_cost_update: 0,
            price_model: None,
        }
    }

    /// Sets the price pair and derives the purchasing mode from it.
    pub fn with_prices(mut self, on_demand_price: f64, spot_price: f64) -> Self {
        self.set_prices(on_demand_price, spot_price);
        self
    }

    /// Attaches a price model which drives the host prices in [`update_price`](Self::update_price).
    pub fn with_price_model(mut self, model: PriceModel) -> Self {
        self.on_demand_price = model.on_demand_price();
        self.spot_price = model.spot_price();
        self.price_state = model.price_state();
        self.price_model = Some(model);
        self
    }

    pub fn set_prices(&mut self, on_demand_price: f64, spot_price: f64) {
        self.on_demand_price = on_demand_price;
        self.spot_price = spot_price;
        self.price_state = PriceState::from_prices(on_demand_price, spot_price);
    }

    /// Overrides the purchasing mode derived from prices, e.g. by a host-level policy.
    pub fn set_price_state(&mut self, state: PriceState) {
        self.price_state = state;
    }

    pub fn set_up(&mut self, up: bool) {
        self.up = up;
    }

    /// Advances the cost meter and the price model to simulation time `now` (milliseconds).
    ///
    /// Returns the time of the next price change, if the model knows one.
    pub fn update_price(&mut self, now: u64) -> Option<u64> {
        self.update_cost(now);
        let model = self.price_model.as_mut()?;
        let next_update = model.update(now);
        let (on_demand_price, spot_price) = (model.on_demand_price(), model.spot_price());
        self.set_prices(on_demand_price, spot_price);
        next_update
    }

    /// Charges the current price for the time elapsed since the last update.
    pub fn update_cost(&mut self, now: u64) {
        if now > self.last_cost_update {
            let duration = now - self.last_cost_update;
            self.total_cost += self.current_price() * duration as f64 * 0.001;
        }
        self.last_cost_update = self.last_cost_update.max(now);
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Reserves host resources for the task. Returns `false` if the host can't hold it.
    pub fn allocate(&mut self, task: &dyn ServiceTask) -> bool {
        if self.provisioned_cpus + task.cpu_count() > self.cpu_capacity
            || self.provisioned_memory + task.memory() > self.memory_capacity
        {
            return false;
        }
        self.provisioned_cpus += task.cpu_count();
        self.provisioned_memory += task.memory();
        true
    }

    /// Returns resources reserved for the task back to the host.
    pub fn release(&mut self, task: &dyn ServiceTask) {
        self.provisioned_cpus = self.provisioned_cpus.saturating_sub(task.cpu_count());
        self.provisioned_memory = self.provisioned_memory.saturating_sub(task.memory());
    }
}

impl HostView for SimHost {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_up(&self) -> bool {
        self.up
    }

    fn cpu_capacity(&self) -> u32 {
        self.cpu_capacity
    }

    fn provisioned_cpus(&self) -> u32 {
        self.provisioned_cpus
    }

    fn memory_capacity(&self) -> u64 {
        self.memory_capacity
    }

    fn available_memory(&self) -> u64 {
        self.memory_capacity - self.provisioned_memory
    }

    fn current_price(&self) -> f64 {
        match self.price_state {
            PriceState::OnDemand => self.on_demand_price,
            PriceState::Spot => self.spot_price,
        }
    }

    fn on_demand_price(&self) -> f64 {
        self.on_demand_price
    }

    fn spot_price(&self) -> f64 {
        self.spot_price
    }

    fn price_state(&self) -> PriceState {
        self.price_state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::price::timeline::PriceTimelineBuilder;
    use crate::scheduler::task::Task;

    #[test]
    fn test_allocation_bookkeeping() {
        let mut host = SimHost::new(0, "h", 4, 8);
        let task = Task::new(1, 3, 6, 1000, 10_000);
        assert!(host.allocate(&task));
        assert_eq!(host.provisioned_cpus(), 3);
        assert_eq!(host.available_memory(), 2);
        assert!(!host.allocate(&task));
        host.release(&task);
        assert_eq!(host.provisioned_cpus(), 0);
        assert_eq!(host.available_memory(), 8);
    }

    #[test]
    fn test_cost_follows_price_model() {
        let mut builder = PriceTimelineBuilder::new();
        builder.add(0, 2.0, 1.0);
        builder.add(1000, 2.0, 3.0);
        let timeline: Arc<[_]> = builder.finalize().into();
        let mut host = SimHost::new(0, "h", 4, 8).with_price_model(PriceModel::new(timeline, 0).unwrap());

        assert_eq!(host.price_state(), PriceState::Spot);
        assert_eq!(host.update_price(0), Some(1000));
        // one second at spot price 1.0
        assert_eq!(host.update_price(1000), None);
        assert_eq!(host.price_state(), PriceState::OnDemand);
        assert_abs_diff_eq!(host.total_cost(), 1.0);
        // half a second at on-demand price 2.0
        host.update_cost(1500);
        assert_abs_diff_eq!(host.total_cost(), 2.0);
    }
}
