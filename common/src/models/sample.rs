use std::collections::VecDeque;
use std::time::Duration;

use super::probe::ProbeResult;

/// A single monitor observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub reachable: bool,
    pub rtt_ms: Option<f64>,
}

impl Sample {
    pub fn success(rtt: Duration) -> Self {
        Self {
            reachable: true,
            rtt_ms: Some(rtt.as_nanos() as f64 / 1_000_000.0),
        }
    }

    pub fn timeout() -> Self {
        Self {
            reachable: false,
            rtt_ms: None,
        }
    }
}

impl From<&ProbeResult> for Sample {
    fn from(result: &ProbeResult) -> Self {
        Self {
            reachable: result.is_reachable(),
            rtt_ms: result.rtt_ms(),
        }
    }
}

/// Fixed-capacity FIFO of the most recent samples. Pushing into a full window
/// evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleWindow {
    /// A zero capacity is bumped to one; a window that can hold nothing has no
    /// latest sample to classify.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `sample`, returning the evicted one if the window was full.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn latencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.rtt_ms)
    }

    /// Mean latency of the successful samples in the window.
    pub fn average_rtt(&self) -> Option<f64> {
        let (sum, count) = self
            .latencies()
            .fold((0.0, 0usize), |(sum, count), rtt| (sum + rtt, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn min_rtt(&self) -> Option<f64> {
        self.latencies().reduce(f64::min)
    }

    pub fn max_rtt(&self) -> Option<f64> {
        self.latencies().reduce(f64::max)
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Sample {
        Sample::success(Duration::from_millis(v))
    }

    #[test]
    fn window_keeps_most_recent_n_in_arrival_order() {
        let mut window = SampleWindow::new(3);
        for v in 1..=5 {
            window.push(ms(v));
        }
        let kept: Vec<f64> = window.iter().filter_map(|s| s.rtt_ms).collect();
        assert_eq!(kept, vec![3.0, 4.0, 5.0]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn push_reports_evicted_sample() {
        let mut window = SampleWindow::new(2);
        assert_eq!(window.push(ms(1)), None);
        assert_eq!(window.push(ms(2)), None);
        assert_eq!(window.push(ms(3)), Some(ms(1)));
    }

    #[test]
    fn aggregates_skip_timeouts() {
        let mut window = SampleWindow::new(10);
        window.push(ms(10));
        window.push(Sample::timeout());
        window.push(ms(30));
        assert_eq!(window.average_rtt(), Some(20.0));
        assert_eq!(window.min_rtt(), Some(10.0));
        assert_eq!(window.max_rtt(), Some(30.0));
    }

    #[test]
    fn aggregates_are_none_without_successes() {
        let mut window = SampleWindow::new(4);
        assert_eq!(window.average_rtt(), None);
        window.push(Sample::timeout());
        assert_eq!(window.average_rtt(), None);
        assert_eq!(window.min_rtt(), None);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut window = SampleWindow::new(0);
        window.push(ms(1));
        window.push(ms(2));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest(), Some(&ms(2)));
    }
}
