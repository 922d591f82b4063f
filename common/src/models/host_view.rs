use std::fmt;
use std::net::IpAddr;
use std::time::SystemTime;

use super::sample::{Sample, SampleWindow};

/// Coarse reachability classification of a monitored host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostStatus {
    /// No sample recorded yet.
    #[default]
    Pending,
    /// The most recent probe was answered.
    Good,
    /// The most recent probe failed.
    Offline,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HostStatus::Pending => "pending",
            HostStatus::Good => "good",
            HostStatus::Offline => "offline",
        };
        f.write_str(text)
    }
}

/// Descriptive latency sub-band of an answering host. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBand {
    Good,
    Degraded,
    Poor,
}

impl LatencyBand {
    pub const DEGRADED_MS: f64 = 50.0;
    pub const POOR_MS: f64 = 500.0;

    pub fn classify(rtt_ms: f64) -> Self {
        if rtt_ms < Self::DEGRADED_MS {
            LatencyBand::Good
        } else if rtt_ms < Self::POOR_MS {
            LatencyBand::Degraded
        } else {
            LatencyBand::Poor
        }
    }
}

/// Immutable snapshot of one monitored host.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredHostView {
    pub address: IpAddr,
    pub resolved_name: Option<String>,
    /// Window contents, oldest first.
    pub samples: Vec<Sample>,
    pub window_capacity: usize,
    pub avg_rtt_ms: Option<f64>,
    pub min_rtt_ms: Option<f64>,
    pub max_rtt_ms: Option<f64>,
    pub success_count: u64,
    pub fail_count: u64,
    pub status: HostStatus,
    pub last_update: Option<SystemTime>,
}

impl MonitoredHostView {
    pub fn new(address: IpAddr, resolved_name: Option<String>, window_capacity: usize) -> Self {
        Self {
            address,
            resolved_name,
            samples: Vec::new(),
            window_capacity,
            avg_rtt_ms: None,
            min_rtt_ms: None,
            max_rtt_ms: None,
            success_count: 0,
            fail_count: 0,
            status: HostStatus::Pending,
            last_update: None,
        }
    }

    /// Builds a view from live monitor state.
    pub fn from_window(
        address: IpAddr,
        resolved_name: Option<String>,
        window: &SampleWindow,
        success_count: u64,
        fail_count: u64,
        last_update: Option<SystemTime>,
    ) -> Self {
        Self {
            address,
            resolved_name,
            samples: window.to_vec(),
            window_capacity: window.capacity(),
            avg_rtt_ms: window.average_rtt(),
            min_rtt_ms: window.min_rtt(),
            max_rtt_ms: window.max_rtt(),
            success_count,
            fail_count,
            status: classify(window.latest()),
            last_update,
        }
    }

    pub fn total_probes(&self) -> u64 {
        self.success_count + self.fail_count
    }

    /// Cumulative loss percentage over the whole session, not just the window.
    pub fn packet_loss(&self) -> f64 {
        match self.total_probes() {
            0 => 0.0,
            total => self.fail_count as f64 / total as f64 * 100.0,
        }
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn latency_band(&self) -> Option<LatencyBand> {
        match self.status {
            HostStatus::Good => self.latest()?.rtt_ms.map(LatencyBand::classify),
            _ => None,
        }
    }

    pub fn status_text(&self) -> &'static str {
        match (self.status, self.latency_band()) {
            (HostStatus::Pending, _) => "Unknown",
            (HostStatus::Offline, _) => "Offline",
            (HostStatus::Good, Some(LatencyBand::Good)) | (HostStatus::Good, None) => {
                "Online (Good Latency)"
            }
            (HostStatus::Good, Some(LatencyBand::Degraded)) => "Online (High Latency)",
            (HostStatus::Good, Some(LatencyBand::Poor)) => "Online (Very High Latency)",
        }
    }
}

fn classify(latest: Option<&Sample>) -> HostStatus {
    match latest {
        None => HostStatus::Pending,
        Some(sample) if sample.reachable => HostStatus::Good,
        Some(_) => HostStatus::Offline,
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
