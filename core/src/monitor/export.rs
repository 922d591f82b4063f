use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use sonar_common::models::MonitoredHostView;

const TITLE: &str = "Sonar Monitor - Export Data";
const RULE_WIDTH: usize = 60;

/// Plain-text report of every host's aggregates and sample history.
///
/// A pure function of the snapshot: hosts come out in address order.
pub fn render_export(snapshot: &BTreeMap<IpAddr, MonitoredHostView>) -> String {
    Export(snapshot).to_string()
}

struct Export<'a>(&'a BTreeMap<IpAddr, MonitoredHostView>);

impl fmt::Display for Export<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{TITLE}")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f)?;
        for (addr, view) in self.0 {
            write_host(f, addr, view)?;
        }
        Ok(())
    }
}

fn write_host(f: &mut fmt::Formatter<'_>, addr: &IpAddr, view: &MonitoredHostView) -> fmt::Result {
    writeln!(f, "Host: {addr}")?;
    if let Some(name) = &view.resolved_name {
        writeln!(f, "Hostname: {name}")?;
    }
    writeln!(f, "Status: {}", view.status_text())?;
    match view.avg_rtt_ms {
        Some(avg) => writeln!(f, "Average Latency: {avg:.1} ms")?,
        None => writeln!(f, "Average Latency: n/a")?,
    }
    writeln!(f, "Packet Loss: {:.1}%", view.packet_loss())?;
    writeln!(f, "Total Pings: {}", view.total_probes())?;
    writeln!(f)?;

    writeln!(f, "Recent Pings (last {}):", view.window_capacity)?;
    for (i, sample) in view.samples.iter().enumerate() {
        match sample.rtt_ms {
            Some(rtt) if sample.reachable => writeln!(f, "  {}. {rtt:.1} ms", i + 1)?,
            _ => writeln!(f, "  {}. TIMEOUT", i + 1)?,
        }
    }
    writeln!(f)?;
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(f)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
