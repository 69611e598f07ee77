//! Simulation configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, PriceResult};
use crate::price::format::TraceFormatRegistry;
use crate::price::loader::{PriceTraceLoader, DEFAULT_CACHE_CAPACITY};
use crate::price::model::PriceModel;
use crate::scheduler::filter::PriceFilter;
use crate::scheduler::host::SimHost;
use crate::scheduler::pipeline::{FilterChain, DEFAULT_RAM_ALLOCATION_RATIO, DEFAULT_VCPU_ALLOCATION_RATIO};
use crate::scheduler::strategy::{scheduler_resolver, ComputeScheduler};

/// Price trace used to drive host prices.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PriceTraceConfig {
    /// registered trace format name, e.g. `csv` or `json`
    pub format: String,
    /// trace file path
    pub path: String,
}

/// Represents physical host properties.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host name. Should be set if count = 1
    pub name: Option<String>,
    /// Host name prefix. Full name is produced by appending instance number to the prefix.
    /// Should be set if count > 1
    pub name_prefix: Option<String>,
    /// host CPU capacity
    pub cpus: u32,
    /// host memory capacity
    pub memory: u64,
    /// number of such hosts
    pub count: Option<u32>,
}

/// Holds raw simulation config parsed from YAML file.
#[derive(Debug, Serialize, Deserialize)]
struct RawSpotSimulationConfig {
    pub price_trace: Option<PriceTraceConfig>,
    pub price_cache_capacity: Option<usize>,
    pub scheduler: Option<String>,
    pub vcpu_allocation_ratio: Option<f64>,
    pub ram_allocation_ratio: Option<f64>,
    pub price_threshold: Option<f64>,
    pub hosts: Option<Vec<HostConfig>>,
}

/// Represents simulation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotSimulationConfig {
    /// price trace driving host prices, hosts keep zero prices if not set
    pub price_trace: Option<PriceTraceConfig>,
    /// maximum number of timelines kept by the price trace loader
    pub price_cache_capacity: usize,
    /// scheduler config string, e.g. `IntelligentBidding[beta=0.8]`
    pub scheduler: String,
    /// vCPU overcommit ratio of the base filter chain
    pub vcpu_allocation_ratio: f64,
    /// RAM overcommit ratio of the base filter chain
    pub ram_allocation_ratio: f64,
    /// hosts with a higher current price are never selected
    pub price_threshold: Option<f64>,
    /// configurations of physical hosts
    pub hosts: Vec<HostConfig>,
}

impl SpotSimulationConfig {
    /// Creates simulation config with default parameter values.
    pub fn new() -> Self {
        Self {
            price_trace: None,
            price_cache_capacity: DEFAULT_CACHE_CAPACITY,
            scheduler: "GreedyPrice".to_string(),
            vcpu_allocation_ratio: DEFAULT_VCPU_ALLOCATION_RATIO,
            ram_allocation_ratio: DEFAULT_RAM_ALLOCATION_RATIO,
            price_threshold: None,
            hosts: Vec::new(),
        }
    }

    /// Creates simulation config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(file_name).map_err(|e| ConfigError::Read {
            path: file_name.to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Creates simulation config from YAML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> ConfigResult<Self> {
        let data: RawSpotSimulationConfig = serde_yaml::from_str(yaml)?;
        let default = Self::new();
        Ok(Self {
            price_trace: data.price_trace,
            price_cache_capacity: data.price_cache_capacity.unwrap_or(default.price_cache_capacity),
            scheduler: data.scheduler.unwrap_or(default.scheduler),
            vcpu_allocation_ratio: data.vcpu_allocation_ratio.unwrap_or(default.vcpu_allocation_ratio),
            ram_allocation_ratio: data.ram_allocation_ratio.unwrap_or(default.ram_allocation_ratio),
            price_threshold: data.price_threshold,
            hosts: data.hosts.unwrap_or_default(),
        })
    }

    /// Returns the base filter chain, including the price threshold filter if configured.
    pub fn filter_chain(&self) -> FilterChain {
        let chain = FilterChain::base(self.vcpu_allocation_ratio, self.ram_allocation_ratio);
        match self.price_threshold {
            Some(threshold) => chain.with_filter(PriceFilter::new(threshold)),
            None => chain,
        }
    }

    /// Resolves the configured scheduler over the base filter chain.
    pub fn build_scheduler(&self) -> ConfigResult<Box<dyn ComputeScheduler>> {
        scheduler_resolver(&self.scheduler, self.filter_chain())
    }

    /// Creates a price trace loader with the configured cache capacity and default trace formats.
    pub fn build_loader(&self) -> PriceTraceLoader {
        PriceTraceLoader::new(TraceFormatRegistry::with_defaults(), self.price_cache_capacity)
    }

    /// Creates configured hosts. If a price trace is set, each host gets a price model over it starting at
    /// `start_time` (epoch milliseconds).
    pub fn build_hosts(&self, loader: &PriceTraceLoader, start_time: i64) -> PriceResult<Vec<SimHost>> {
        let timeline = match &self.price_trace {
            Some(trace) => Some(loader.get(Path::new(&trace.path), &trace.format)?),
            None => None,
        };
        let mut hosts = Vec::new();
        for host_config in &self.hosts {
            let count = host_config.count.unwrap_or(1);
            for i in 0..count {
                let name = match (&host_config.name, &host_config.name_prefix) {
                    (Some(name), _) if count == 1 => name.clone(),
                    (_, Some(prefix)) => format!("{}{}", prefix, i + 1),
                    (Some(name), None) => format!("{}{}", name, i + 1),
                    (None, None) => format!("host{}", hosts.len() + 1),
                };
                let mut host = SimHost::new(hosts.len() as u32, &name, host_config.cpus, host_config.memory);
                if let Some(timeline) = &timeline {
                    host = host.with_price_model(PriceModel::new(timeline.clone(), start_time)?);
                }
                hosts.push(host);
            }
        }
        Ok(hosts)
    }
}

impl Default for SpotSimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
