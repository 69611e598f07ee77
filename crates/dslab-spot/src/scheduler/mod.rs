//! Price-aware task placement.

pub mod filter;
pub mod host;
pub mod pipeline;
pub mod reevaluate;
pub mod strategies;
pub mod strategy;
pub mod task;
pub mod weigher;

pub use host::{HostRef, HostView, SimHost};
pub use strategy::{scheduler_resolver, ComputeScheduler};
pub use task::{ServiceTask, Task};
