//! Registry of price trace formats.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{PriceError, PriceResult};
use crate::price::reader::{CsvPriceReader, JsonPriceReader, PriceSampleSource};

/// Opens price traces stored in a particular format.
pub trait TraceFormat: Send + Sync {
    /// Name under which the format is registered.
    fn name(&self) -> &str;

    /// Opens the trace at `path`.
    fn open(&self, path: &Path) -> PriceResult<Box<dyn PriceSampleSource>>;
}

pub struct CsvTraceFormat;

impl TraceFormat for CsvTraceFormat {
    fn name(&self) -> &str {
        "csv"
    }

    fn open(&self, path: &Path) -> PriceResult<Box<dyn PriceSampleSource>> {
        Ok(Box::new(CsvPriceReader::open(path)?))
    }
}

pub struct JsonTraceFormat;

impl TraceFormat for JsonTraceFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn open(&self, path: &Path) -> PriceResult<Box<dyn PriceSampleSource>> {
        Ok(Box::new(JsonPriceReader::open(path)?))
    }
}

/// Explicit map from format name to format implementation, populated by the embedding application.
#[derive(Default)]
pub struct TraceFormatRegistry {
    formats: HashMap<String, Box<dyn TraceFormat>>,
}

impl TraceFormatRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `csv` and `json` formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CsvTraceFormat));
        registry.register(Box::new(JsonTraceFormat));
        registry
    }

    /// Registers a format, replacing any format with the same name.
    pub fn register(&mut self, format: Box<dyn TraceFormat>) {
        self.formats.insert(format.name().to_string(), format);
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn TraceFormat> {
        self.formats.get(name).map(|format| format.as_ref())
    }

    /// Opens the trace at `path` with the format registered under `name`.
    pub fn open(&self, name: &str, path: &Path) -> PriceResult<Box<dyn PriceSampleSource>> {
        self.by_name(name)
            .ok_or_else(|| PriceError::UnknownFormat(name.to_string()))?
            .open(path)
    }
}
