use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sonar_core::resolver::{HostnameResolver, NbstatStrategy, ResolveStrategy};
use sonar_protocols::nbstat;

/// Replies to `requests` node-status requests with a name table whose first
/// entry is a reserved browse marker, followed by the real workstation name.
/// Yields how many requests were answered.
fn serve(socket: UdpSocket, name: &'static str, requests: usize) -> thread::JoinHandle<usize> {
    socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    thread::spawn(move || {
        let mut answered = 0;
        let mut buf = [0u8; 512];
        while answered < requests {
            let Ok((len, peer)) = socket.recv_from(&mut buf) else {
                break;
            };
            let _ = socket.send_to(&name_table_reply(&buf[..len], name), peer);
            answered += 1;
        }
        answered
    })
}

fn name_table_reply(request: &[u8], name: &str) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.extend_from_slice(&request[0..2]);
    reply.extend_from_slice(&[0x84, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    reply.extend_from_slice(&request[12..46]);
    reply.extend_from_slice(&nbstat::NBSTAT_TYPE.to_be_bytes());
    reply.extend_from_slice(&nbstat::CLASS_IN.to_be_bytes());
    reply.extend_from_slice(&[0, 0, 0, 0]);
    reply.extend_from_slice(&((1 + 2 * 18) as u16).to_be_bytes());
    reply.push(2);

    let mut marker = [0u8; 16];
    marker[..15].copy_from_slice(b"\x01\x02__MSBROWSE__\x02");
    marker[15] = 0x01;
    reply.extend_from_slice(&marker);
    reply.extend_from_slice(&[0x84, 0x00]);

    let mut entry = [b' '; 16];
    entry[..name.len()].copy_from_slice(name.as_bytes());
    entry[15] = nbstat::SUFFIX_SERVER;
    reply.extend_from_slice(&entry);
    reply.extend_from_slice(&[0x04, 0x00]);
    reply
}

struct Miss;

impl ResolveStrategy for Miss {
    fn name(&self) -> &'static str {
        "miss"
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(20)
    }

    fn lookup(&self, _addr: IpAddr, _timeout: Duration) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

#[test]
fn chain_falls_through_to_nbstat_over_loopback() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();
    let server = serve(socket, "MEDIABOX", 1);

    let resolver = HostnameResolver::new(vec![
        Arc::new(Miss),
        Arc::new(NbstatStrategy::with_port(port)),
    ]);
    let resolution = resolver
        .resolve_detailed(IpAddr::V4(Ipv4Addr::LOCALHOST), Duration::from_secs(3))
        .unwrap();

    assert_eq!(resolution.name, "MEDIABOX");
    assert_eq!(resolution.strategy, "nbstat");
    assert_eq!(server.join().unwrap(), 1);
}

#[test]
fn resolution_is_idempotent() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();
    let server = serve(socket, "NAS01", 2);

    let resolver = HostnameResolver::new(vec![Arc::new(Miss), Arc::new(NbstatStrategy::with_port(port))]);
    let addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let first = resolver.resolve(addr, Duration::from_secs(3));
    let second = resolver.resolve(addr, Duration::from_secs(3));

    assert_eq!(first.as_deref(), Some("NAS01"));
    assert_eq!(first, second);
    assert_eq!(server.join().unwrap(), 2);
}
