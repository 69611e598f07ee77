//! Reading workload traces.

use std::fs::File;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{TraceError, TraceResult};
use crate::workload::{Fragment, TraceWorkloadBuilder};

#[derive(Deserialize)]
struct FragmentRecord {
    id: u64,
    duration: u64,
    cpu_count: u32,
    cpu_usage: f64,
}

/// Reads a CSV trace with `id,duration,cpu_count,cpu_usage` columns.
///
/// Returns fragments grouped by task id, in the order of first appearance of each task and file order within a task.
pub fn read_fragments(path: &Path) -> TraceResult<IndexMap<u64, TraceWorkloadBuilder>> {
    let file = File::open(path).map_err(|source| TraceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut fragments: IndexMap<u64, Vec<Fragment>> = IndexMap::new();
    for record in csv::Reader::from_reader(file).into_deserialize() {
        let record: FragmentRecord = record.map_err(|source| TraceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fragments
            .entry(record.id)
            .or_default()
            .push(Fragment::new(record.duration, record.cpu_usage, record.cpu_count));
    }
    Ok(fragments
        .into_iter()
        .map(|(id, fragments)| (id, TraceWorkloadBuilder::from(fragments)))
        .collect())
}
