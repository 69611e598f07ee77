//! Price interval and purchasing mode.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Start time of the first interval of any timeline.
pub const TIME_NEG_INF: i64 = i64::MIN;
/// End time of the last interval of any timeline.
pub const TIME_POS_INF: i64 = i64::MAX;

/// Purchasing mode of a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PriceState {
    OnDemand,
    Spot,
}

impl PriceState {
    /// Derives the purchasing mode from a price pair.
    ///
    /// Spot capacity is only worth buying while it is strictly cheaper than on-demand capacity.
    pub fn from_prices(on_demand_price: f64, spot_price: f64) -> Self {
        if spot_price >= on_demand_price {
            PriceState::OnDemand
        } else {
            PriceState::Spot
        }
    }
}

impl Display for PriceState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            PriceState::OnDemand => write!(f, "on_demand"),
            PriceState::Spot => write!(f, "spot"),
        }
    }
}

/// Half-open time span `[start_time, end_time)` (epoch milliseconds) with a fixed price pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceInterval {
    pub start_time: i64,
    pub end_time: i64,
    pub on_demand_price: f64,
    pub spot_price: f64,
}

impl PriceInterval {
    pub fn new(start_time: i64, end_time: i64, on_demand_price: f64, spot_price: f64) -> Self {
        Self {
            start_time,
            end_time,
            on_demand_price,
            spot_price,
        }
    }

    /// Checks whether the given absolute time falls into this interval.
    pub fn contains(&self, time: i64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Returns the purchasing mode implied by the interval prices.
    pub fn price_state(&self) -> PriceState {
        PriceState::from_prices(self.on_demand_price, self.spot_price)
    }

    /// Returns the price paid in the given purchasing mode.
    pub fn price(&self, state: PriceState) -> f64 {
        match state {
            PriceState::OnDemand => self.on_demand_price,
            PriceState::Spot => self.spot_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_state_from_prices() {
        assert_eq!(PriceState::from_prices(1.0, 0.3), PriceState::Spot);
        assert_eq!(PriceState::from_prices(1.0, 1.0), PriceState::OnDemand);
        assert_eq!(PriceState::from_prices(1.0, 1.2), PriceState::OnDemand);
    }

    #[test]
    fn test_interval_contains_is_half_open() {
        let interval = PriceInterval::new(1000, 2000, 0.5, 0.2);
        assert!(!interval.contains(999));
        assert!(interval.contains(1000));
        assert!(interval.contains(1999));
        assert!(!interval.contains(2000));
    }
}
