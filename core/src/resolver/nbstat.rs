use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use anyhow::Context;
use sonar_protocols::nbstat;
use tracing::trace;

use super::ResolveStrategy;

const TIMEOUT: Duration = Duration::from_secs(1);

/// NetBIOS node status query over UDP/137.
#[derive(Debug, Clone, Copy)]
pub struct NbstatStrategy {
    port: u16,
}

impl NbstatStrategy {
    pub fn new() -> Self {
        Self { port: nbstat::NBSTAT_PORT }
    }

    /// Targets a non-standard port.
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }
}

impl Default for NbstatStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveStrategy for NbstatStrategy {
    fn name(&self) -> &'static str {
        "nbstat"
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }

    fn lookup(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
        // NetBIOS has no IPv6 transport.
        let IpAddr::V4(v4) = addr else {
            return Ok(None);
        };

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).context("binding NBSTAT socket")?;
        let target = SocketAddr::from((v4, self.port));
        let id = nbstat::new_transaction_id();
        socket.send_to(&nbstat::create_request(id), target)?;

        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 1024];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            socket.set_read_timeout(Some(remaining))?;
            let (len, from) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            if from.ip() != addr {
                trace!("dropping NBSTAT datagram from {from}, expected {addr}");
                continue;
            }
            return Ok(nbstat::decode_hostname(&buf[..len], Some(id)));
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
