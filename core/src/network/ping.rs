//! Echo probes through the platform `ping` utility, for processes that may
//! not open ICMP sockets.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use super::EchoProber;

/// Process start-up cost on top of the echo timeout itself.
const SPAWN_SLACK: Duration = Duration::from_millis(500);
/// Windows prints `time<1ms` for sub-millisecond replies.
const SUB_MILLISECOND: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPingProber;

impl SystemPingProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EchoProber for SystemPingProber {
    async fn echo(&self, addr: IpAddr, timeout: Duration) -> Option<Duration> {
        let mut cmd = Command::new("ping");
        cmd.args(ping_args(addr, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout + SPAWN_SLACK, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                trace!("failed to run ping for {addr}: {e}");
                return None;
            }
            Err(_elapsed) => return None,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let rtt_ms = parse_reply(&stdout)?;
        Some(Duration::from_secs_f64(rtt_ms / 1_000.0))
    }

    fn name(&self) -> &'static str {
        "system-ping"
    }
}

/// One echo with a per-platform wait flag.
pub(crate) fn ping_args(addr: IpAddr, timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1);
    let mut args: Vec<String> = Vec::new();
    if cfg!(windows) {
        args.extend(["-n".into(), "1".into(), "-w".into(), millis.to_string()]);
    } else if cfg!(target_os = "macos") {
        args.extend(["-c".into(), "1".into(), "-W".into(), millis.to_string()]);
    } else {
        // iputils takes whole seconds for -W.
        let secs = timeout.as_secs_f64().ceil().max(1.0) as u64;
        args.extend(["-c".into(), "1".into(), "-W".into(), secs.to_string()]);
    }
    if addr.is_ipv6() && !cfg!(windows) {
        args.push("-6".into());
    }
    args.push(addr.to_string());
    args
}

/// Extracts the round-trip time in milliseconds from a successful reply line.
///
/// A reply must carry a TTL; Windows prints "Destination host unreachable"
/// lines with exit code 0 and no TTL.
pub(crate) fn parse_reply(output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let lower = line.to_ascii_lowercase();
        if !lower.contains("ttl=") && !lower.contains("hlim=") && !lower.contains("hop limit") {
            return None;
        }
        if lower.contains("time<1ms") {
            return Some(SUB_MILLISECOND);
        }
        let idx = lower.find("time=")?;
        let value: String = lower[idx + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        value.parse::<f64>().ok()
    })
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
    use std::net::Ipv4Addr;

    #[test]
    fn parses_linux_reply() {
        let out = "PING 10.0.0.1 (10.0.0.1) 56(84) bytes of data.\n\
                   64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.412 ms\n";
        assert_eq!(parse_reply(out), Some(0.412));
    }

    #[test]
    fn parses_windows_replies() {
        let out = "Reply from 10.0.0.1: bytes=32 time=14ms TTL=128\r\n";
        assert_eq!(parse_reply(out), Some(14.0));

        let fast = "Reply from 10.0.0.1: bytes=32 time<1ms TTL=128\r\n";
        assert_eq!(parse_reply(fast), Some(SUB_MILLISECOND));
    }

    #[test]
    fn unreachable_reply_is_not_success() {
        let out = "Reply from 10.0.0.5: Destination host unreachable.\r\n\
                   Packets: Sent = 1, Received = 1, Lost = 0 (0% loss)\r\n";
        assert_eq!(parse_reply(out), None);
        assert_eq!(parse_reply("Request timed out.\r\n"), None);
    }

    #[test]
    fn args_end_with_address() {
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let args = ping_args(addr, Duration::from_millis(300));
        assert_eq!(args.last().map(String::as_str), Some("10.0.0.1"));
        assert!(args.iter().any(|a| a == "1"));
    }
}
