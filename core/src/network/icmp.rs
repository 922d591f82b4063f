use std::io;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tracing::trace;

use super::EchoProber;

const PAYLOAD: [u8; 32] = [0u8; 32];

/// ICMP echo over raw (or unprivileged datagram) sockets.
pub struct IcmpProber {
    v4: Client,
    /// Hosts without IPv6 still sweep IPv4 fine.
    v6: Option<Client>,
}

impl IcmpProber {
    pub fn new() -> io::Result<Self> {
        let v4 = Client::new(&Config::default())?;
        let v6 = Client::new(&Config::builder().kind(ICMP::V6).build()).ok();
        Ok(Self { v4, v6 })
    }

    fn client_for(&self, addr: &IpAddr) -> Option<&Client> {
        match addr {
            IpAddr::V4(_) => Some(&self.v4),
            IpAddr::V6(_) => self.v6.as_ref(),
        }
    }
}

#[async_trait]
impl EchoProber for IcmpProber {
    async fn echo(&self, addr: IpAddr, timeout: Duration) -> Option<Duration> {
        let client = self.client_for(&addr)?;
        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        match pinger.ping(PingSequence(0), &PAYLOAD).await {
            Ok((_packet, rtt)) => Some(rtt),
            Err(e) => {
                trace!("echo to {addr} failed: {e}");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "icmp"
    }
}
