use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use sonar_common::config::Config;
use sonar_common::models::HostStatus;
use sonar_core::monitor::{Monitor, MonitorSettings, MonitorState, render_export};

use crate::support::{ScriptedProber, StaticLookup};

const HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));

fn settings() -> MonitorSettings {
    let config = Config { no_resolve: true, ..Config::default() };
    MonitorSettings::from(&config)
}

#[tokio::test(start_paused = true)]
async fn five_good_cycles_then_stop() {
    let prober = ScriptedProber::silent().reply(HOST, Duration::from_millis(20));
    let mut monitor = Monitor::new(Arc::new(prober), None, settings());
    monitor.add("192.168.1.10").unwrap();
    monitor.start().unwrap();

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    monitor.stop().await;

    let snapshot = monitor.snapshot();
    let view = &snapshot[&HOST];
    assert_eq!(view.success_count, 5);
    assert_eq!(view.fail_count, 0);
    assert_eq!(view.avg_rtt_ms, Some(20.0));
    assert_eq!(view.status, HostStatus::Good);
    assert_eq!(monitor.state(), MonitorState::Stopped);

    // Stopped loops record nothing further.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(monitor.snapshot()[&HOST].total_probes(), 5);
}

#[tokio::test(start_paused = true)]
async fn window_keeps_only_the_most_recent_samples() {
    let config = Config { no_resolve: true, window: 3, ..Config::default() };
    let prober = ScriptedProber::silent().reply(HOST, Duration::from_millis(1));
    let mut monitor = Monitor::new(Arc::new(prober), None, MonitorSettings::from(&config));
    monitor.add("192.168.1.10");
    monitor.start().unwrap();

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    monitor.stop().await;

    let snapshot = monitor.snapshot();
    let view = &snapshot[&HOST];
    assert_eq!(view.success_count, 6);
    assert_eq!(view.samples.len(), 3);
    assert_eq!(view.window_capacity, 3);
}

#[tokio::test(start_paused = true)]
async fn hostnames_mixed_hosts_and_export() {
    let gateway = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
    let prober = ScriptedProber::silent().reply(gateway, Duration::from_millis(600));
    let lookup = StaticLookup::default().with("gateway.lan", gateway);
    let mut monitor = Monitor::new(Arc::new(prober), None, settings()).with_lookup(Arc::new(lookup));

    assert_eq!(monitor.add("gateway.lan"), Some(gateway));
    assert_eq!(monitor.add("192.168.1.1"), None);
    assert_eq!(monitor.add("192.168.1.10"), Some(HOST));
    monitor.start().unwrap();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    monitor.stop().await;

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot[&gateway].status_text(), "Online (Very High Latency)");
    assert_eq!(snapshot[&HOST].status, HostStatus::Offline);

    let text = render_export(&snapshot);
    assert_eq!(text, monitor.export());
    assert!(text.find("Host: 192.168.1.1\n").unwrap() < text.find("Host: 192.168.1.10\n").unwrap());
    assert!(text.contains("Hostname: gateway.lan"));
    assert!(text.contains("  1. TIMEOUT"));
    assert!(text.contains("  1. 600.0 ms"));
}
