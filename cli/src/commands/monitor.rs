use std::collections::BTreeMap;
use std::net::IpAddr;

use anyhow::{Context, bail};
use colored::*;
use sonar_common::config::Config;
use sonar_common::models::MonitoredHostView;
use sonar_common::{info, success};
use sonar_core::monitor::{Monitor, MonitorState};
use sonar_core::network;
use tokio::time::{Instant, MissedTickBehavior};

use crate::commands::MonitorArgs;
use crate::sprint;
use crate::terminal::input::{InputHandle, Key};
use crate::terminal::{format, print};

const MIN_NAME_WIDTH: usize = 8;
const MAX_NAME_WIDTH: usize = 28;

pub async fn monitor(args: MonitorArgs, cfg: &Config) -> anyhow::Result<()> {
    let mut monitor = Monitor::from_config(cfg, network::default_prober());
    for host in &args.hosts {
        monitor.add(host);
    }
    if monitor.is_empty() {
        bail!("none of the given hosts could be monitored");
    }

    print::section("monitoring", cfg.quiet);
    if cfg.quiet == 0 {
        info!("Press 'p' to pause or resume, 'q' to stop");
    }

    let mut input = InputHandle::new();
    input.start();
    monitor.start()?;

    // Redraw half an interval after each probe round so the table shows it.
    let mut ticker = tokio::time::interval_at(Instant::now() + cfg.interval / 2, cfg.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if monitor.state() == MonitorState::Running {
                    cycles += 1;
                    draw(&monitor.snapshot(), cycles, cfg);
                }
                if args.count.is_some_and(|count| cycles >= count) {
                    break;
                }
            }
            key = input.next_key() => match key {
                Key::Quit => break,
                Key::Pause => match monitor.toggle_pause() {
                    MonitorState::Paused => info!("Paused"),
                    MonitorState::Running => info!("Resumed"),
                    _ => {}
                },
            },
        }
    }

    monitor.stop().await;
    drop(input);

    let snapshot = monitor.snapshot();
    print::section("summary", cfg.quiet);
    summarize(&snapshot);

    if let Some(path) = &args.export {
        std::fs::write(path, monitor.export())
            .with_context(|| format!("writing export to {}", path.display()))?;
        success!("Exported monitor data to {}", path.display());
    }
    Ok(())
}

fn name_width(snapshot: &BTreeMap<IpAddr, MonitoredHostView>) -> usize {
    snapshot
        .values()
        .filter_map(|view| view.resolved_name.as_ref())
        .map(|name| name.len())
        .max()
        .unwrap_or(0)
        .clamp(MIN_NAME_WIDTH, MAX_NAME_WIDTH)
}

fn draw(snapshot: &BTreeMap<IpAddr, MonitoredHostView>, cycle: u64, cfg: &Config) {
    let width = name_width(snapshot);
    if cfg.quiet < 2 {
        sprint!();
        sprint!(&format!("{} {}", "cycle".bright_black(), cycle.to_string().bright_cyan()));
        sprint!(&format::monitor_header(width));
    }
    for view in snapshot.values() {
        sprint!(&format::monitor_row(view, width));
    }
}

fn summarize(snapshot: &BTreeMap<IpAddr, MonitoredHostView>) {
    for (idx, view) in snapshot.values().enumerate() {
        let title = view
            .resolved_name
            .clone()
            .unwrap_or_else(|| view.address.to_string());
        print::host_heading(idx, &title);

        let avg = view
            .avg_rtt_ms
            .map_or_else(|| "n/a".normal(), format::latency);
        let min = view.min_rtt_ms.map_or_else(|| "n/a".normal(), format::latency);
        let max = view.max_rtt_ms.map_or_else(|| "n/a".normal(), format::latency);
        print::tree(&[
            ("Address".to_string(), format::addr(&view.address)),
            ("Status".to_string(), format::status(view)),
            ("Average".to_string(), avg),
            ("Min/Max".to_string(), format!("{min} / {max}").normal()),
            ("Loss".to_string(), format!("{:.1}%", view.packet_loss()).normal()),
            ("Probes".to_string(), view.total_probes().to_string().normal()),
        ]);
    }
}
