//! Row-oriented sources of raw price samples.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PriceError, PriceResult};

/// A single row of a price trace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Sample timestamp in epoch milliseconds.
    pub timestamp: i64,
    pub on_demand_price: f64,
    pub spot_price: f64,
}

impl PriceSample {
    pub fn new(timestamp: i64, on_demand_price: f64, spot_price: f64) -> Self {
        Self {
            timestamp,
            on_demand_price,
            spot_price,
        }
    }
}

/// Source of price samples in unspecified order.
pub trait PriceSampleSource {
    /// Returns the next sample or `None` when the source is exhausted.
    fn next_sample(&mut self) -> PriceResult<Option<PriceSample>>;

    /// Releases the underlying resources. Subsequent reads return `None`.
    fn close(&mut self);
}

// CSV -----------------------------------------------------------------------------------------------------------------

/// Reads samples from a CSV file with `timestamp,on_demand_price,spot_price` header.
pub struct CsvPriceReader {
    path: PathBuf,
    records: Option<csv::DeserializeRecordsIntoIter<File, PriceSample>>,
}

impl CsvPriceReader {
    pub fn open(path: &Path) -> PriceResult<Self> {
        let file = File::open(path).map_err(|source| PriceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            records: Some(csv::Reader::from_reader(file).into_deserialize()),
        })
    }
}

impl PriceSampleSource for CsvPriceReader {
    fn next_sample(&mut self) -> PriceResult<Option<PriceSample>> {
        let Some(records) = self.records.as_mut() else {
            return Ok(None);
        };
        match records.next() {
            Some(Ok(sample)) => Ok(Some(sample)),
            Some(Err(err)) => Err(PriceError::Parse {
                path: self.path.clone(),
                message: err.to_string(),
            }),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.records = None;
    }
}

// JSON ----------------------------------------------------------------------------------------------------------------

/// Reads samples from a JSON file holding an array of `{timestamp, on_demand_price, spot_price}` objects.
pub struct JsonPriceReader {
    samples: std::vec::IntoIter<PriceSample>,
}

impl JsonPriceReader {
    pub fn open(path: &Path) -> PriceResult<Self> {
        let file = File::open(path).map_err(|source| PriceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let samples: Vec<PriceSample> =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| PriceError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        Ok(Self {
            samples: samples.into_iter(),
        })
    }
}

impl PriceSampleSource for JsonPriceReader {
    fn next_sample(&mut self) -> PriceResult<Option<PriceSample>> {
        Ok(self.samples.next())
    }

    fn close(&mut self) {
        self.samples = Vec::new().into_iter();
    }
}

// In-memory -----------------------------------------------------------------------------------------------------------

/// Source over samples that are already in memory, e.g. produced by [`synthetic`](crate::price::synthetic).
pub struct MemoryPriceSource {
    samples: std::vec::IntoIter<PriceSample>,
}

impl MemoryPriceSource {
    pub fn new(samples: Vec<PriceSample>) -> Self {
        Self {
            samples: samples.into_iter(),
        }
    }
}

impl PriceSampleSource for MemoryPriceSource {
    fn next_sample(&mut self) -> PriceResult<Option<PriceSample>> {
        Ok(self.samples.next())
    }

    fn close(&mut self) {
        self.samples = Vec::new().into_iter();
    }
}
