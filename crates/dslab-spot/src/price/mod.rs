//! Price traces: reading samples, building timelines and following them in simulation time.

pub mod cache;
pub mod format;
pub mod interval;
pub mod loader;
pub mod model;
pub mod reader;
pub mod synthetic;
pub mod timeline;

pub use interval::{PriceInterval, PriceState};
pub use loader::PriceTraceLoader;
pub use model::PriceModel;
pub use timeline::PriceTimelineBuilder;
