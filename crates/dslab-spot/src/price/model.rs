//! Price model following a timeline in simulation time.

use std::sync::Arc;

use crate::error::{PriceError, PriceResult};
use crate::price::interval::{PriceInterval, PriceState, TIME_POS_INF};

/// Tracks the price interval which is active at the current simulation time.
///
/// Simulation time is relative (milliseconds since the run start), while timelines use absolute epoch
/// milliseconds. The model converts between the two using the absolute start time of the run.
pub struct PriceModel {
    timeline: Arc<[PriceInterval]>,
    start_time: i64,
    index: usize,
}

impl PriceModel {
    /// Creates a model positioned at the interval containing `start_time`.
    pub fn new(timeline: Arc<[PriceInterval]>, start_time: i64) -> PriceResult<Self> {
        if timeline.is_empty() {
            return Err(PriceError::EmptyTimeline);
        }
        let mut model = Self {
            timeline,
            start_time,
            index: 0,
        };
        model.seek(start_time);
        Ok(model)
    }

    /// Moves the model to the interval containing relative time `now`.
    ///
    /// Returns the relative time at which the active interval ends, or `None` if it is open-ended.
    pub fn update(&mut self, now: u64) -> Option<u64> {
        let absolute = self.absolute_time(now);
        if !self.current().contains(absolute) {
            self.seek(absolute);
        }
        let end = self.current().end_time;
        if end == TIME_POS_INF {
            None
        } else {
            Some(end.saturating_sub(self.start_time).max(0) as u64)
        }
    }

    /// Returns the active interval.
    pub fn current(&self) -> &PriceInterval {
        &self.timeline[self.index]
    }

    /// Returns the purchasing mode implied by the active interval.
    pub fn price_state(&self) -> PriceState {
        self.current().price_state()
    }

    pub fn on_demand_price(&self) -> f64 {
        self.current().on_demand_price
    }

    pub fn spot_price(&self) -> f64 {
        self.current().spot_price
    }

    fn absolute_time(&self, now: u64) -> i64 {
        self.start_time.saturating_add(now as i64)
    }

    fn seek(&mut self, absolute: i64) {
        while absolute < self.timeline[self.index].start_time && self.index > 0 {
            self.index -= 1;
        }
        while absolute >= self.timeline[self.index].end_time && self.index < self.timeline.len() - 1 {
            self.index += 1;
        }
    }
}
