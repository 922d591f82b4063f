use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use super::ResolveStrategy;
use crate::network::process;

const TIMEOUT: Duration = Duration::from_secs(3);

/// Asks the platform's NetBIOS utility for the remote name table.
///
/// `nbtstat -A` on Windows, `nmblookup -A` (Samba) elsewhere.
#[derive(Debug, Clone)]
pub struct UtilityStrategy {
    program: Option<PathBuf>,
}

impl UtilityStrategy {
    /// Looks for the platform utility on `PATH`.
    pub fn detect() -> Self {
        let name = if cfg!(windows) { "nbtstat" } else { "nmblookup" };
        Self { program: process::find_on_path(name) }
    }

    pub fn program(&self) -> Option<&PathBuf> {
        self.program.as_ref()
    }
}

impl ResolveStrategy for UtilityStrategy {
    fn name(&self) -> &'static str {
        "netbios-utility"
    }

    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }

    fn lookup(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
        let (Some(program), IpAddr::V4(_)) = (&self.program, addr) else {
            return Ok(None);
        };
        let output = process::run_with_timeout(
            Command::new(program).args(["-A", &addr.to_string()]),
            timeout,
        )?;
        Ok(parse_name_table(&output.stdout))
    }
}

/// First unique `<00>` or `<20>` entry of an `nbtstat -A` / `nmblookup -A`
/// name table.
///
/// ```text
///     FILESRV         <00>  UNIQUE      Registered      (nbtstat)
///     FILESRV         <00> -         B <ACTIVE>         (nmblookup)
///     WORKGROUP       <00> - <GROUP> B <ACTIVE>
/// ```
pub(crate) fn parse_name_table(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let idx = line.find("<00>").or_else(|| line.find("<20>"))?;
        if line[idx..].to_ascii_uppercase().contains("GROUP") {
            return None;
        }
        let name = line[..idx].trim();
        let first = name.chars().next()?;
        if first == '*' || first.is_control() || name.contains("__MSBROWSE__") {
            return None;
        }
        Some(name.to_string())
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
