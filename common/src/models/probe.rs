use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

/// One address queued for probing, optionally carrying the name it was declared with
/// (e.g. the hostname the user typed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    pub addr: IpAddr,
    pub name: Option<String>,
}

impl ProbeTarget {
    pub fn new(addr: IpAddr) -> Self {
        Self { addr, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<IpAddr> for ProbeTarget {
    fn from(addr: IpAddr) -> Self {
        Self::new(addr)
    }
}

/// Outcome of exactly one liveness probe.
///
/// Immutable once built. `rtt_ms` is `Some` iff the host answered, which the
/// two constructors guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    address: IpAddr,
    reachable: bool,
    rtt_ms: Option<f64>,
    resolved_name: Option<String>,
    timestamp: SystemTime,
}

impl ProbeResult {
    pub fn reachable(address: IpAddr, rtt: Duration, resolved_name: Option<String>) -> Self {
        Self {
            address,
            reachable: true,
            rtt_ms: Some(rtt.as_nanos() as f64 / 1_000_000.0),
            resolved_name,
            timestamp: SystemTime::now(),
        }
    }

    pub fn unreachable(address: IpAddr) -> Self {
        Self {
            address,
            reachable: false,
            rtt_ms: None,
            resolved_name: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt_ms
    }

    pub fn resolved_name(&self) -> Option<&str> {
        self.resolved_name.as_deref()
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.rtt_ms, &self.resolved_name) {
            (Some(rtt), Some(name)) => write!(f, "{} ({name}) {rtt:.1} ms", self.address),
            (Some(rtt), None) => write!(f, "{} {rtt:.1} ms", self.address),
            (None, _) => write!(f, "{} no response", self.address),
        }
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
