use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use sonar_common::config::Config;
use sonar_protocols::dns;
use tracing::{debug, trace};

use super::ResolveStrategy;

const TIMEOUT: Duration = Duration::from_secs(1);

/// Reverse DNS.
///
/// With explicit name servers a PTR query goes straight to each of them in
/// turn. Without, the lookup goes through the operating system resolver, which
/// also consults the hosts file and any other configured name sources.
pub struct PtrStrategy {
    servers: Vec<IpAddr>,
    port: u16,
}

impl PtrStrategy {
    pub fn new(servers: Vec<IpAddr>) -> Self {
        Self { servers, port: dns::DNS_PORT }
    }

    /// Strategy backed by the system resolver.
    pub fn system() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dns_servers.clone())
    }

    pub fn servers(&self) -> &[IpAddr] {
        &self.servers
    }

    fn query(&self, server: IpAddr, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
        let bind: SocketAddr = match server {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).context("binding DNS socket")?;
        socket.connect((server, self.port))?;

        let id: u16 = rand::random();
        let query = dns::create_ptr_packet(&addr, id)?;
        socket.send(&query)?;

        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 1500];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            socket.set_read_timeout(Some(remaining))?;
            let len = match socket.recv(&mut buf) {
                Ok(len) => len,
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            match dns::get_hostname(&buf[..len]) {
                Ok((reply_id, name)) if reply_id == id => return Ok(Some(name)),
                Ok(_) => trace!("ignoring DNS reply with foreign id from {server}"),
                // NXDOMAIN and friends carry no PTR record.
                Err(e) => {
                    trace!("PTR reply from {server} for {addr} unusable: {e}");
                    return Ok(None);
                }
            }
        }
    }

    /// Asks each server in order until one names `addr`.
    ///
    /// A failing server is skipped; the lookup only fails when every server
    /// it reached failed.
    fn query_servers(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut last_error: Option<anyhow::Error> = None;
        let mut answered = false;

        for &server in &self.servers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.query(server, addr, remaining) {
                Ok(Some(name)) => return Ok(Some(name)),
                Ok(None) => answered = true,
                Err(e) => {
                    debug!("name server {server} failed for {addr}: {e:#}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }
}

/// `getnameinfo` through the system resolver, abandoned after `timeout`.
fn system_lookup(addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(dns_lookup::lookup_addr(&addr));
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(name)) if name != addr.to_string() => Ok(Some(name)),
        Ok(Ok(_)) => Ok(None),
        Ok(Err(e)) => Err(e).context("system reverse lookup"),
        Err(_) => {
            trace!("system reverse lookup for {addr} timed out");
            Ok(None)
        }
    }
}

impl ResolveStrategy for PtrStrategy {
    fn name(&self) -> &'static str {
        "reverse-dns"
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }

    fn lookup(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
        if self.servers.is_empty() {
            system_lookup(addr, timeout)
        } else {
            self.query_servers(addr, timeout)
        }
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
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

    const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

    /// Answers one query on loopback; `reply` builds the response from the query.
    fn responder(reply: fn(&[u8]) -> Vec<u8>) -> (u16, thread::JoinHandle<usize>) {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            match server.recv_from(&mut buf) {
                Ok((len, peer)) => {
                    let _ = server.send_to(&reply(&buf[..len]), peer);
                    1
                }
                Err(_) => 0,
            }
        });
        (port, handle)
    }

    /// A PTR answer for `nas.lan.` echoing the query's id and question.
    fn ptr_answer(query: &[u8]) -> Vec<u8> {
        let mut out = query.to_vec();
        out[2] = 0x81;
        out[3] = 0x80;
        out[6] = 0;
        out[7] = 1;
        out.extend_from_slice(&[0xc0, 0x0c]);
        out.extend_from_slice(&[0x00, 0x0c, 0x00, 0x01]);
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c]);
        let rdata: &[u8] = b"\x03nas\x03lan\x00";
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(rdata);
        out
    }

    #[test]
    fn ptr_answer_fixture_decodes() {
        let query = dns::create_ptr_packet(&TARGET, 0x1234).unwrap();
        assert_eq!(dns::get_hostname(&ptr_answer(&query)).unwrap(), (0x1234, "nas.lan".to_string()));
    }

    #[test]
    fn garbage_reply_is_a_miss() {
        let (port, handle) = responder(|_| vec![0xde, 0xad, 0xbe, 0xef]);
        let strategy = PtrStrategy { servers: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], port };
        let res = strategy.lookup(TARGET, Duration::from_millis(500));
        assert!(matches!(res, Ok(None)));
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn failing_server_falls_through_to_the_next() {
        let (port, handle) = responder(ptr_answer);
        // Nothing listens on 127.0.0.2 at this port, so the first query is refused or times out.
        let strategy = PtrStrategy {
            servers: vec![IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)), IpAddr::V4(Ipv4Addr::LOCALHOST)],
            port,
        };
        let res = strategy.lookup(TARGET, Duration::from_millis(1_500)).unwrap();
        assert_eq!(res.as_deref(), Some("nas.lan"));
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn every_server_failing_is_an_error() {
        let closed_port = UdpSocket::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let strategy = PtrStrategy { servers: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], port: closed_port };
        assert!(strategy.lookup(TARGET, Duration::from_millis(300)).is_err());
    }

    #[test]
    fn configured_servers_are_queried_directly() {
        let config = Config { dns_servers: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)], ..Config::default() };
        let strategy = PtrStrategy::from_config(&config);
        assert!(strategy.is_supported());
        assert_eq!(strategy.servers(), &[IpAddr::V4(Ipv4Addr::LOCALHOST)]);
    }

    #[test]
    fn system_resolver_is_always_available() {
        let strategy = PtrStrategy::from_config(&Config::default());
        assert!(strategy.servers().is_empty());
        assert!(strategy.is_supported());
        // Loopback is answered by the hosts file or echoed back as the address
        // itself; either way the lookup completes without an error.
        let res = strategy.lookup(IpAddr::V4(Ipv4Addr::LOCALHOST), Duration::from_secs(2));
        assert!(res.is_ok());
        assert_ne!(res.unwrap().as_deref(), Some("127.0.0.1"));
    }
}
