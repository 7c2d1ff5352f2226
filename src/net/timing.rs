//! Rolling latency extremes and a time-weighted moving average

/// Trailing horizon for extreme samples and average decay (ms)
pub const HIST_MS: f64 = 60_000.0;
/// Capacity of each extreme history
pub const HIST_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    value: f64,
    time: f64,
}

/// Which end of the distribution a history keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Low,
    High,
}

/// Bounded sorted sample history within a trailing time horizon.
///
/// Holds at most `HIST_LEN` entries ordered by value; entries older than
/// `HIST_MS` are purged before every insertion.
#[derive(Debug, Clone)]
struct ValueHistory {
    samples: Vec<Sample>,
    extreme: Extreme,
}

impl ValueHistory {
    fn new(extreme: Extreme) -> Self {
        Self {
            samples: Vec::with_capacity(HIST_LEN + 1),
            extreme,
        }
    }

    fn expire(&mut self, now: f64) {
        self.samples.retain(|s| s.time >= now - HIST_MS);
    }

    fn insert(&mut self, value: f64, now: f64) {
        self.expire(now);

        let qualifies = self.samples.len() < HIST_LEN
            || match self.extreme {
                Extreme::Low => value < self.samples[self.samples.len() - 1].value,
                Extreme::High => value > self.samples[0].value,
            };

        if !qualifies {
            return;
        }

        self.samples.push(Sample { value, time: now });
        self.samples
            .sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal));

        if self.samples.len() > HIST_LEN {
            match self.extreme {
                Extreme::Low => {
                    self.samples.truncate(HIST_LEN);
                }
                Extreme::High => {
                    self.samples.drain(..self.samples.len() - HIST_LEN);
                }
            }
        }
    }

    fn first(&self) -> Option<f64> {
        self.samples.first().map(|s| s.value)
    }

    fn last(&self) -> Option<f64> {
        self.samples.last().map(|s| s.value)
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Rolling latency statistics: lowest-K and highest-K samples within the
/// trailing horizon, plus a time-weighted exponential moving average.
#[derive(Debug, Clone)]
pub struct TimingStats {
    low: ValueHistory,
    high: ValueHistory,
    avg: f64,
    last: Option<f64>,
}

impl TimingStats {
    pub fn new() -> Self {
        Self {
            low: ValueHistory::new(Extreme::Low),
            high: ValueHistory::new(Extreme::High),
            avg: 0.0,
            last: None,
        }
    }

    /// Record a sample observed at simulation time `now`
    pub fn insert(&mut self, value: f64, now: f64) {
        self.low.insert(value, now);
        self.high.insert(value, now);

        match self.last {
            None => self.avg = value,
            Some(last) => {
                let delta = now - last;
                // Time-weighted decay toward recent samples without storing
                // the full sample stream
                self.avg = ((HIST_MS - delta) * self.avg + delta * value) / HIST_MS;
            }
        }

        self.last = Some(now);
    }

    /// (min, rounded average, max); zeros while empty
    pub fn stats(&self) -> (f64, f64, f64) {
        let min = self.low.first().unwrap_or(0.0);
        let max = self.high.last().unwrap_or(0.0);
        (min, self.avg.round(), max)
    }
}

impl Default for TimingStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histories_stay_bounded() {
        let mut stats = TimingStats::new();
        for i in 0..100 {
            stats.insert(i as f64, i as f64 * 10.0);
            assert!(stats.low.len() <= HIST_LEN);
            assert!(stats.high.len() <= HIST_LEN);
        }
    }

    #[test]
    fn extremes_track_min_and_max() {
        let mut stats = TimingStats::new();
        for (i, v) in [40.0, 10.0, 90.0, 55.0, 5.0, 70.0].iter().enumerate() {
            stats.insert(*v, i as f64);
        }
        let (min, _, max) = stats.stats();
        assert_eq!(min, 5.0);
        assert_eq!(max, 90.0);
    }

    #[test]
    fn low_history_keeps_the_lowest_k() {
        let mut stats = TimingStats::new();
        for i in 0..(HIST_LEN as u32 + 5) {
            stats.insert(100.0 + i as f64, i as f64);
        }
        // A new low displaces the worst-of-the-best
        stats.insert(1.0, 1000.0);
        let (min, _, _) = stats.stats();
        assert_eq!(min, 1.0);
        assert_eq!(stats.low.len(), HIST_LEN);
    }

    #[test]
    fn samples_expire_past_the_horizon() {
        let mut stats = TimingStats::new();
        stats.insert(500.0, 0.0);
        stats.insert(1.0, 10.0);

        // Next insertion is beyond the horizon of both earlier samples
        stats.insert(42.0, HIST_MS + 20.0);

        let (min, _, max) = stats.stats();
        assert_eq!(min, 42.0);
        assert_eq!(max, 42.0);
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = TimingStats::new();
        assert_eq!(stats.stats(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn first_sample_sets_average() {
        let mut stats = TimingStats::new();
        stats.insert(25.0, 0.0);
        let (_, avg, _) = stats.stats();
        assert_eq!(avg, 25.0);
    }

    #[test]
    fn average_is_time_weighted() {
        let mut stats = TimingStats::new();
        stats.insert(100.0, 0.0);
        // A sample after half the horizon pulls the average halfway
        stats.insert(0.0, HIST_MS / 2.0);
        let (_, avg, _) = stats.stats();
        assert_eq!(avg, 50.0);
    }
}
