//! Scheduler contract, host pool and scheduler resolution.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{ConfigError, ConfigResult};
use crate::scheduler::host::HostRef;
use crate::scheduler::pipeline::FilterChain;
use crate::scheduler::strategies::greedy_price::GreedyPrice;
use crate::scheduler::strategies::intelligent_bidding::IntelligentBidding;
use crate::scheduler::strategies::uniform_progression::UniformProgression;
use crate::scheduler::task::{PurchaseRequirement, ServiceTask};

/// Trait for implementation of price-aware task schedulers.
///
/// A scheduler tracks a set of hosts and selects one of them for a task, or returns `None` if there is no
/// suitable host at the moment. The latter is a normal outcome, the caller decides when to retry.
pub trait ComputeScheduler {
    fn add_host(&mut self, host: HostRef);

    fn remove_host(&mut self, host: &HostRef);

    /// Repositions the host after its price or capacity has changed. Untracked hosts are ignored.
    fn update_host(&mut self, host: &HostRef);

    fn select(&self, task: &dyn ServiceTask) -> Option<HostRef>;

    /// Derives the purchasing requirement of a task which is running at time `now`.
    ///
    /// `delay` is the time the task loses when moved to another host. The caller moves the task if its host
    /// doesn't satisfy the result (see [`needs_reschedule`](crate::scheduler::reevaluate::needs_reschedule)).
    fn reevaluate(&self, task: &dyn ServiceTask, now: u64, delay: u64) -> PurchaseRequirement;

    /// Base filter chain of the scheduler.
    fn filters(&self) -> &FilterChain;

    fn host_count(&self) -> usize;
}

/// Ordered set of hosts keyed by host id.
#[derive(Default)]
pub struct HostPool {
    hosts: IndexMap<u32, HostRef>,
}

impl HostPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the host unless a host with the same id is already tracked.
    pub fn add(&mut self, host: HostRef) {
        let id = host.borrow().id();
        self.hosts.entry(id).or_insert(host);
    }

    pub fn remove(&mut self, host: &HostRef) {
        let id = host.borrow().id();
        self.hosts.shift_remove(&id);
    }

    /// Moves a tracked host to the end of the iteration order.
    pub fn update(&mut self, host: &HostRef) {
        let id = host.borrow().id();
        if let Some(host) = self.hosts.shift_remove(&id) {
            self.hosts.insert(id, host);
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.hosts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostRef> {
        self.hosts.values()
    }
}

/// Parses config value string, which consists of two parts - name and options.
///
/// Example: `IntelligentBidding[alpha=-0.001,beta=0.8]` parts are name `IntelligentBidding` and options string
/// `alpha=-0.001,beta=0.8`.
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Reads a float option, falling back to the default if the option is absent.
pub(crate) fn float_option(options: &HashMap<String, String>, name: &str, default: f64) -> ConfigResult<f64> {
    match options.get(name) {
        Some(value) => value.parse::<f64>().map_err(|_| ConfigError::InvalidOption {
            name: name.to_string(),
            value: value.clone(),
        }),
        None => Ok(default),
    }
}

/// Creates a scheduler from its config string, e.g. `GreedyPrice` or `IntelligentBidding[beta=0.8]`.
pub fn scheduler_resolver(config_str: &str, filters: FilterChain) -> ConfigResult<Box<dyn ComputeScheduler>> {
    let (algorithm_name, options) = parse_config_value(config_str);
    match algorithm_name.as_str() {
        "GreedyPrice" => Ok(Box::new(GreedyPrice::new(filters))),
        "UniformProgression" => Ok(Box::new(UniformProgression::new(filters))),
        "IntelligentBidding" => Ok(Box::new(IntelligentBidding::from_str(
            options.as_deref().unwrap_or(""),
            filters,
        )?)),
        _ => Err(ConfigError::UnknownAlgorithm(config_str.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use sugars::{rc, refcell};

    use super::*;
    use crate::scheduler::host::{HostView, SimHost};

    fn host(id: u32) -> HostRef {
        let host: Rc<RefCell<dyn HostView>> = rc!(refcell!(SimHost::new(id, "h", 4, 8)));
        host
    }

    #[test]
    fn test_parse_config_value() {
        assert_eq!(parse_config_value("GreedyPrice"), ("GreedyPrice".to_string(), None));
        let (name, options) = parse_config_value("IntelligentBidding[alpha=-0.001, beta=0.8]");
        assert_eq!(name, "IntelligentBidding");
        let options = parse_options(&options.unwrap());
        assert_eq!(options.get("alpha").unwrap(), "-0.001");
        assert_eq!(options.get("beta").unwrap(), "0.8");
        assert_eq!(options.get("gamma"), None);
    }

    #[test]
    fn test_host_pool_set_semantics() {
        let mut pool = HostPool::new();
        let (a, b) = (host(0), host(1));
        pool.add(a.clone());
        pool.add(b.clone());
        pool.add(host(0));
        assert_eq!(pool.len(), 2);

        pool.update(&a);
        let order: Vec<u32> = pool.iter().map(|h| h.borrow().id()).collect();
        assert_eq!(order, vec![1, 0]);

        pool.update(&host(7));
        pool.remove(&host(9));
        assert_eq!(pool.len(), 2);
        pool.remove(&b);
        assert!(!pool.contains(1));
    }

    #[test]
    fn test_resolver() {
        assert!(scheduler_resolver("GreedyPrice", FilterChain::default()).is_ok());
        assert!(scheduler_resolver("UniformProgression", FilterChain::default()).is_ok());
        assert!(scheduler_resolver("IntelligentBidding[beta=0.5]", FilterChain::default()).is_ok());
        assert!(matches!(
            scheduler_resolver("FirstFit", FilterChain::default()),
            Err(ConfigError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            scheduler_resolver("IntelligentBidding[alpha=low]", FilterChain::default()),
            Err(ConfigError::InvalidOption { .. })
        ));
    }
}
