use std::net::IpAddr;
use std::process::Command;
use std::time::Duration;

use super::ResolveStrategy;
use crate::network::process;

const TIMEOUT: Duration = Duration::from_millis(1_500);

/// `ping -a` reverse lookup. Only Windows' ping resolves names this way.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoReverseStrategy;

impl EchoReverseStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ResolveStrategy for EchoReverseStrategy {
    fn name(&self) -> &'static str {
        "echo-reverse"
    }

    fn is_supported(&self) -> bool {
        cfg!(windows)
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }

    fn lookup(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
        let wait_ms = timeout.as_millis().max(1).to_string();
        let output = process::run_with_timeout(
            Command::new("ping").args(["-a", "-n", "1", "-w", &wait_ms, &addr.to_string()]),
            timeout,
        )?;
        Ok(parse_pinging_line(&output.stdout, addr))
    }
}

/// Pulls `<name>` out of `Pinging <name> [<addr>] with 32 bytes of data:`.
///
/// Without a name, ping prints the bare address and no brackets.
pub(crate) fn parse_pinging_line(output: &str, addr: IpAddr) -> Option<String> {
    let marker = format!("[{addr}]");
    output.lines().find_map(|line| {
        let idx = line.find(&marker)?;
        line[..idx].split_whitespace().last().map(str::to_string)
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
