//! Liveness probing primitives.
//!
//! Everything above this module talks to an [`EchoProber`]; which transport
//! actually carries the echo (an ICMP socket or the platform `ping` utility) is
//! decided once by [`default_prober`].

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sonar_common::{info, warn};

pub mod icmp;
pub mod ping;
pub mod process;

pub use icmp::IcmpProber;
pub use ping::SystemPingProber;

/// Sends one echo request and reports the round-trip time.
///
/// Implementations must give up after `timeout`. Any failure, including a
/// transport error, is reported as `None`; probing never errors.
#[async_trait]
pub trait EchoProber: Send + Sync {
    async fn echo(&self, addr: IpAddr, timeout: Duration) -> Option<Duration>;

    fn name(&self) -> &'static str;
}

/// Picks the best prober available to this process: raw ICMP if a socket can
/// be opened, the system `ping` otherwise.
pub fn default_prober() -> Arc<dyn EchoProber> {
    match IcmpProber::new() {
        Ok(prober) => {
            info!("Using ICMP sockets for echo probes");
            Arc::new(prober)
        }
        Err(e) => {
            let hint = if is_root::is_root() { "" } else { " (not running as root)" };
            warn!("ICMP socket unavailable{hint}: {e}; falling back to the system ping utility");
            Arc::new(SystemPingProber::new())
        }
    }
}
