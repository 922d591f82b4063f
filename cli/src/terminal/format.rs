use std::net::IpAddr;
use std::time::Duration;

use crate::terminal::colors;
use colored::*;
use sonar_common::models::{HostStatus, LatencyBand, MonitoredHostView, ProbeResult};
use unicode_width::UnicodeWidthStr;

pub fn addr(ip: &IpAddr) -> ColoredString {
    match ip {
        IpAddr::V4(_) => ip.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(_) => ip.to_string().color(colors::IPV6_ADDR),
    }
}

pub fn latency(rtt_ms: f64) -> ColoredString {
    let text = format!("{rtt_ms:.1} ms");
    match LatencyBand::classify(rtt_ms) {
        LatencyBand::Good => text.color(colors::LATENCY_GOOD),
        LatencyBand::Degraded => text.color(colors::LATENCY_DEGRADED),
        LatencyBand::Poor => text.color(colors::LATENCY_POOR),
    }
}

pub fn status(view: &MonitoredHostView) -> ColoredString {
    let text = view.status_text();
    match (view.status, view.latency_band()) {
        (HostStatus::Pending, _) => text.color(colors::PENDING),
        (HostStatus::Offline, _) => text.color(colors::OFFLINE).bold(),
        (HostStatus::Good, Some(LatencyBand::Degraded)) => text.color(colors::LATENCY_DEGRADED),
        (HostStatus::Good, Some(LatencyBand::Poor)) => text.color(colors::LATENCY_POOR),
        (HostStatus::Good, _) => text.color(colors::LATENCY_GOOD),
    }
}

pub fn elapsed(duration: Duration) -> ColoredString {
    format!("{:.2}s", duration.as_secs_f64()).bold().yellow()
}

/// Key/value details shown under a live host in the sweep tree.
pub fn result_details(result: &ProbeResult) -> Vec<(String, ColoredString)> {
    let mut details = vec![("Address".to_string(), addr(&result.address()))];
    if let Some(rtt) = result.rtt_ms() {
        details.push(("Latency".to_string(), latency(rtt)));
    }
    details
}

/// Pads `text` on the right to `width` display columns.
pub fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

/// One fixed-width row of the live monitor table.
///
/// Cells are padded before they are colored; escape codes would throw off
/// the width arithmetic otherwise.
pub fn monitor_row(view: &MonitoredHostView, name_width: usize) -> String {
    let name = view.resolved_name.as_deref().unwrap_or("-");
    let last = view.latest().and_then(|sample| sample.rtt_ms);
    format!(
        "{} {} {} {} {} {}",
        pad(&view.address.to_string(), 16).color(colors::IPV4_ADDR),
        pad(name, name_width).color(colors::HOSTNAME),
        latency_cell(last),
        latency_cell(view.avg_rtt_ms),
        format!("{:>7}", format!("{:.1}%", view.packet_loss())),
        status(view),
    )
}

fn latency_cell(rtt_ms: Option<f64>) -> ColoredString {
    match rtt_ms {
        Some(rtt) => {
            let text = format!("{:>10}", format!("{rtt:.1} ms"));
            match LatencyBand::classify(rtt) {
                LatencyBand::Good => text.color(colors::LATENCY_GOOD),
                LatencyBand::Degraded => text.color(colors::LATENCY_DEGRADED),
                LatencyBand::Poor => text.color(colors::LATENCY_POOR),
            }
        }
        None => format!("{:>10}", "-").color(colors::SEPARATOR),
    }
}

pub fn monitor_header(name_width: usize) -> String {
    format!(
        "{} {} {:>10} {:>10} {:>7} {}",
        pad("ADDRESS", 16),
        pad("NAME", name_width),
        "LAST",
        "AVG",
        "LOSS",
        "STATUS"
    )
    .bold()
    .to_string()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
