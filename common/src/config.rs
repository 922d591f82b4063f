//! Runtime configuration shared by the engines and the terminal front-end.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Hard ceiling on how many addresses a single sweep may expand to.
pub const DEFAULT_MAX_HOSTS: usize = 2048;
/// Sub-budget for hostname resolution of a live host during a sweep.
pub const SWEEP_RESOLVE_BUDGET: Duration = Duration::from_millis(1_500);
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(1);
pub const MONITOR_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
pub const MONITOR_WINDOW: usize = 30;
pub const MONITOR_RESOLVE_BUDGET: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct Config {
    /// Skip hostname resolution of live hosts.
    pub no_resolve: bool,
    /// 0 = full output, 1 = no banner/headers, 2 = results only.
    pub quiet: u8,
    pub no_banner: bool,
    pub max_hosts: usize,
    /// Overrides the aggression profile's worker count.
    pub concurrency: Option<usize>,
    /// Name servers for PTR lookups. Empty means "read the system configuration".
    pub dns_servers: Vec<IpAddr>,
    pub interval: Duration,
    pub window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_resolve: false,
            quiet: 0,
            no_banner: false,
            max_hosts: DEFAULT_MAX_HOSTS,
            concurrency: None,
            dns_servers: Vec::new(),
            interval: MONITOR_INTERVAL,
            window: MONITOR_WINDOW,
        }
    }
}

/// Named `{timeout, concurrency}` bundle trading sweep speed for accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggression {
    Gentle,
    #[default]
    Medium,
    Aggressive,
}

impl Aggression {
    pub fn timeout(self) -> Duration {
        match self {
            Aggression::Gentle => Duration::from_millis(600),
            Aggression::Medium => Duration::from_millis(300),
            Aggression::Aggressive => Duration::from_millis(150),
        }
    }

    pub fn concurrency(self) -> usize {
        match self {
            Aggression::Gentle => 50,
            Aggression::Medium => 100,
            Aggression::Aggressive => 150,
        }
    }
}

impl FromStr for Aggression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gentle" | "g" => Ok(Aggression::Gentle),
            "medium" | "m" => Ok(Aggression::Medium),
            "aggressive" | "a" => Ok(Aggression::Aggressive),
            other => Err(format!(
                "unknown aggression '{other}' (expected gentle, medium or aggressive)"
            )),
        }
    }
}

impl fmt::Display for Aggression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggression::Gentle => "gentle",
            Aggression::Medium => "medium",
            Aggression::Aggressive => "aggressive",
        };
        f.write_str(name)
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
