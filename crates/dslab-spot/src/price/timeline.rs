//! Builder of gap-free price timelines.

use crate::price::interval::{PriceInterval, TIME_NEG_INF, TIME_POS_INF};

/// Collects price samples in arbitrary order and turns them into a sorted, contiguous sequence of intervals.
///
/// The produced timeline covers the whole time axis: the first interval starts at [`TIME_NEG_INF`],
/// the last one ends at [`TIME_POS_INF`] and each interval ends where the next one starts.
#[derive(Default)]
pub struct PriceTimelineBuilder {
    intervals: Vec<PriceInterval>,
}

impl PriceTimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample starting at `timestamp` (epoch millis). Its end time is fixed by [`finalize`](Self::finalize).
    pub fn add(&mut self, timestamp: i64, on_demand_price: f64, spot_price: f64) {
        self.intervals
            .push(PriceInterval::new(timestamp, TIME_POS_INF, on_demand_price, spot_price));
    }

    /// Returns the number of collected samples.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Sorts the samples by start time and links them into a timeline.
    ///
    /// Samples with equal timestamps keep their insertion order and produce zero-length intervals.
    pub fn finalize(mut self) -> Vec<PriceInterval> {
        self.intervals.sort_by_key(|interval| interval.start_time);
        for i in 1..self.intervals.len() {
            self.intervals[i - 1].end_time = self.intervals[i].start_time;
        }
        if let Some(first) = self.intervals.first_mut() {
            first.start_time = TIME_NEG_INF;
        }
        self.intervals
    }
}

/// Returns the index of the interval containing the given absolute time.
pub fn find_interval(timeline: &[PriceInterval], time: i64) -> Option<usize> {
    let idx = timeline.partition_point(|interval| interval.end_time <= time);
    if idx < timeline.len() && timeline[idx].contains(time) {
        Some(idx)
    } else {
        None
    }
}
