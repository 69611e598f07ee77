//! Loading price timelines from trace files.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::error::{PriceError, PriceResult};
use crate::price::cache::{PriceCache, TraceKey};
use crate::price::format::TraceFormatRegistry;
use crate::price::interval::PriceInterval;
use crate::price::reader::PriceSampleSource;
use crate::price::timeline::PriceTimelineBuilder;

/// Default number of timelines kept by the loader cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Reads price traces into timelines and caches the result per trace.
///
/// The loader can be shared between threads: the cache is guarded by a mutex and timelines are handed out
/// as shared immutable slices.
pub struct PriceTraceLoader {
    formats: TraceFormatRegistry,
    cache: Mutex<PriceCache>,
}

impl Default for PriceTraceLoader {
    fn default() -> Self {
        Self::new(TraceFormatRegistry::with_defaults(), DEFAULT_CACHE_CAPACITY)
    }
}

impl PriceTraceLoader {
    pub fn new(formats: TraceFormatRegistry, cache_capacity: usize) -> Self {
        Self {
            formats,
            cache: Mutex::new(PriceCache::new(cache_capacity)),
        }
    }

    /// Returns the timeline of the trace at `path` stored in the given format.
    ///
    /// Fails with [`PriceError::TraceNotFound`] if there is no such file. Read errors are propagated as is,
    /// no partial timeline is returned or cached.
    pub fn get(&self, path: &Path, format: &str) -> PriceResult<Arc<[PriceInterval]>> {
        if !path.exists() {
            return Err(PriceError::TraceNotFound(path.to_path_buf()));
        }
        let key = TraceKey::new(format, path);
        if let Some(timeline) = self.cache().get(&key) {
            debug!("price trace {} found in cache", path.display());
            return Ok(timeline);
        }

        let mut source = self.formats.open(format, path)?;
        let result = build_timeline(source.as_mut());
        source.close();
        let timeline: Arc<[PriceInterval]> = result?.into();
        info!("Read {} price intervals from {}", timeline.len(), path.display());

        self.cache().insert(key, timeline.clone());
        Ok(timeline)
    }

    /// Returns the number of cached timelines.
    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }

    /// Drops all cached timelines.
    pub fn reset(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> MutexGuard<'_, PriceCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Feeds every sample of the source to a timeline builder.
pub fn build_timeline(source: &mut dyn PriceSampleSource) -> PriceResult<Vec<PriceInterval>> {
    let mut builder = PriceTimelineBuilder::new();
    while let Some(sample) = source.next_sample()? {
        builder.add(sample.timestamp, sample.on_demand_price, sample.spot_price);
    }
    Ok(builder.finalize())
}
