//! Barrier keeping the consumers of one workload in lockstep.

/// Counts arrivals against a fixed number of parties and releases once per `parties` arrivals.
#[derive(Debug)]
pub struct ConsumerBarrier {
    parties: usize,
    arrived: usize,
}

impl ConsumerBarrier {
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "barrier needs at least one party");
        Self { parties, arrived: 0 }
    }

    /// Registers an arrival. Returns `true` for the arrival which completes the round, the counter is reset then.
    pub fn enter(&mut self) -> bool {
        self.arrived += 1;
        if self.arrived == self.parties {
            self.arrived = 0;
            true
        } else {
            false
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Number of parties arrived in the current round.
    pub fn arrived(&self) -> usize {
        self.arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_once_per_round() {
        let mut barrier = ConsumerBarrier::new(3);
        let releases: Vec<bool> = (0..7).map(|_| barrier.enter()).collect();
        assert_eq!(releases, vec![false, false, true, false, false, true, false]);
        assert_eq!(barrier.arrived(), 1);
    }

    #[test]
    fn test_single_party() {
        let mut barrier = ConsumerBarrier::new(1);
        assert!(barrier.enter());
        assert!(barrier.enter());
    }

    #[test]
    #[should_panic]
    fn test_zero_parties() {
        ConsumerBarrier::new(0);
    }
}
