//! Synthetic price traces used in spot placement experiments.

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::price::reader::PriceSample;

pub const HOUR: u64 = 3600 * 1000;

/// Shape of a synthetic price trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PriceProfile {
    /// Spot price is redrawn every hour from the instance price range, on-demand price is `0.8 * max`.
    /// Spot is cheaper most of the time.
    Normal,
    /// Spot and on-demand windows alternate every 12 hours. In spot windows the spot price is drawn from
    /// the price range, in on-demand windows it is `1.2 * max`. On-demand price is `1.1 * max`.
    Volatile,
    /// Spot price stays at `1.1 * max` until `spot_after` milliseconds into the trace and then behaves as in
    /// [`Normal`](PriceProfile::Normal). On-demand price is `0.8 * max`.
    LateSpot { spot_after: u64 },
}

/// Generates samples every `step` milliseconds over `[start, start + length)`.
///
/// `range` is the `(min, max)` observed spot price of the instance type.
pub fn generate(
    profile: PriceProfile,
    start: i64,
    length: u64,
    step: u64,
    range: (f64, f64),
    seed: u64,
) -> Vec<PriceSample> {
    assert!(step > 0, "sample step must be positive");
    let (min, max) = range;
    let spot_dist = Uniform::new_inclusive(min, max);
    let mut rng = Pcg64::seed_from_u64(seed);

    let (period, on_demand_price) = match profile {
        PriceProfile::Normal => (HOUR, 0.8 * max),
        PriceProfile::Volatile => (12 * HOUR, 1.1 * max),
        PriceProfile::LateSpot { .. } => (HOUR, 0.8 * max),
    };

    let mut samples = Vec::with_capacity((length / step) as usize + 1);
    let mut window = u64::MAX;
    let mut spot_price = 0.;
    let mut t = 0;
    while t < length {
        if t / period != window {
            window = t / period;
            spot_price = match profile {
                PriceProfile::Normal => spot_dist.sample(&mut rng),
                PriceProfile::Volatile if window % 2 == 0 => spot_dist.sample(&mut rng),
                PriceProfile::Volatile => 1.2 * max,
                PriceProfile::LateSpot { spot_after } if t < spot_after => 1.1 * max,
                PriceProfile::LateSpot { .. } => spot_dist.sample(&mut rng),
            };
        }
        samples.push(PriceSample::new(start + t as i64, on_demand_price, spot_price));
        t += step;
    }
    samples
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::price::interval::PriceState;

    const MINUTE: u64 = 60 * 1000;

    #[test]
    fn test_normal_profile_changes_hourly() {
        let samples = generate(PriceProfile::Normal, 0, 3 * HOUR, MINUTE, (0.02, 0.1), 123);
        assert_eq!(samples.len(), 180);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.timestamp, (i as u64 * MINUTE) as i64);
            assert!(sample.spot_price >= 0.02 && sample.spot_price <= 0.1);
            assert_abs_diff_eq!(sample.on_demand_price, 0.08, epsilon = 1e-12);
            if i % 60 != 0 {
                assert_eq!(sample.spot_price, samples[i - 1].spot_price);
            }
        }
    }

    #[test]
    fn test_volatile_profile_alternates() {
        let samples = generate(PriceProfile::Volatile, 0, 48 * HOUR, HOUR, (0.02, 0.1), 7);
        for sample in &samples {
            let window = sample.timestamp as u64 / (12 * HOUR);
            let state = PriceState::from_prices(sample.on_demand_price, sample.spot_price);
            if window % 2 == 0 {
                assert_eq!(state, PriceState::Spot);
            } else {
                assert_eq!(state, PriceState::OnDemand);
            }
        }
    }

    #[test]
    fn test_late_spot_profile() {
        let samples = generate(PriceProfile::LateSpot { spot_after: 2 * HOUR }, 0, 4 * HOUR, HOUR, (0.02, 0.1), 1);
        assert_eq!(samples.len(), 4);
        for sample in &samples[..2] {
            assert_abs_diff_eq!(sample.spot_price, 0.11, epsilon = 1e-12);
            assert_eq!(
                PriceState::from_prices(sample.on_demand_price, sample.spot_price),
                PriceState::OnDemand
            );
        }
        for sample in &samples[2..] {
            assert!(sample.spot_price >= 0.02 && sample.spot_price <= 0.1);
        }
    }

    #[test]
    fn test_same_seed_same_trace() {
        let a = generate(PriceProfile::Normal, 0, 5 * HOUR, HOUR, (0.02, 0.1), 42);
        let b = generate(PriceProfile::Normal, 0, 5 * HOUR, HOUR, (0.02, 0.1), 42);
        assert_eq!(a, b);
    }
}
