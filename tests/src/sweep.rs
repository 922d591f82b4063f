use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use sonar_common::config::{Aggression, DEFAULT_MAX_HOSTS};
use sonar_common::error::InputError;
use sonar_common::models::ProbeResult;
use sonar_common::network::target::{self, SystemLookup};
use sonar_core::resolver::{HostnameResolver, ResolveStrategy};
use sonar_core::scanner::{SweepEngine, SweepError, SweepObserver, SweepStatus};

use crate::support::{AlwaysUp, ScriptedProber, StaticLookup};

fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

#[derive(Default)]
struct Progress {
    calls: Vec<(usize, usize)>,
    finished: Option<SweepStatus>,
}

impl SweepObserver for Progress {
    fn on_progress(&mut self, completed: usize, total: usize, _latest: &ProbeResult) {
        self.calls.push((completed, total));
    }

    fn on_finish(&mut self, status: &SweepStatus, _results: &[ProbeResult]) {
        self.finished = Some(status.clone());
    }
}

#[tokio::test]
async fn silent_slash_30_yields_both_hosts_unreachable() {
    let targets = target::expand_str("192.168.1.0/30", &SystemLookup, DEFAULT_MAX_HOSTS).unwrap();
    let engine = SweepEngine::new(Arc::new(ScriptedProber::silent()));

    let mut report = engine
        .sweep(targets, Aggression::Aggressive, &mut Progress::default())
        .await
        .unwrap();

    assert_eq!(report.status, SweepStatus::Completed);
    report.results.sort_by_key(|r| r.address());
    let addrs: Vec<IpAddr> = report.results.iter().map(|r| r.address()).collect();
    assert_eq!(addrs, vec![v4(192, 168, 1, 1), v4(192, 168, 1, 2)]);
    assert!(report.results.iter().all(|r| !r.is_reachable() && r.rtt_ms().is_none()));
    assert_eq!(report.alive_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_large_sweep_keeps_a_prefix() {
    let targets = target::expand_str("10.0.0.1-10.0.3.232", &SystemLookup, DEFAULT_MAX_HOSTS).unwrap();
    assert_eq!(targets.len(), 1000);

    let prober = AlwaysUp { rtt: Duration::from_millis(2), delay: Duration::from_millis(10) };
    let engine = SweepEngine::new(Arc::new(prober)).with_concurrency(Some(50));
    let session = engine.session(targets, Aggression::Medium).unwrap();
    let token = session.cancel_token();

    let mut observer = |completed: usize, _total: usize, _latest: &ProbeResult| {
        if completed >= 300 {
            token.cancel();
        }
    };
    let report = session.run(&mut observer).await;

    assert_eq!(report.status, SweepStatus::Cancelled);
    assert!(report.results.len() >= 300);
    assert!(report.results.len() < 1000);
    assert_eq!(report.total, 1000);
}

#[tokio::test(start_paused = true)]
async fn progress_is_bounded_and_ends_at_total() {
    let targets = target::expand_str("10.1.0.0/24", &SystemLookup, DEFAULT_MAX_HOSTS).unwrap();
    let total = targets.len();
    let prober = ScriptedProber::silent().with_delay(Duration::from_millis(3));
    let engine = SweepEngine::new(Arc::new(prober)).with_concurrency(Some(16));

    let mut progress = Progress::default();
    let report = engine.sweep(targets, Aggression::Medium, &mut progress).await.unwrap();

    assert_eq!(report.results.len(), total);
    assert!(progress.calls.iter().all(|&(done, of)| done <= of && of == total));
    assert!(progress.calls.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(progress.calls.last(), Some(&(total, total)));
    // Throttled: far fewer callbacks than results.
    assert!(progress.calls.len() < total / 2);
    assert_eq!(progress.finished, Some(SweepStatus::Completed));
}

struct Always(&'static str);

impl ResolveStrategy for Always {
    fn name(&self) -> &'static str {
        "always"
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(50)
    }

    fn lookup(&self, _addr: IpAddr, _timeout: Duration) -> anyhow::Result<Option<String>> {
        Ok(Some(self.0.to_string()))
    }
}

#[tokio::test]
async fn live_hosts_are_named_and_declared_names_survive() {
    let lookup = StaticLookup::default().with("printer.lan", v4(10, 9, 0, 7));
    let targets = target::expand_str("10.9.0.1-3,printer.lan", &lookup, DEFAULT_MAX_HOSTS).unwrap();

    let prober = ScriptedProber::silent()
        .reply(v4(10, 9, 0, 2), Duration::from_millis(4))
        .reply(v4(10, 9, 0, 7), Duration::from_millis(9));
    let resolver = Arc::new(HostnameResolver::new(vec![Arc::new(Always("host.lan"))]));
    let engine = SweepEngine::new(Arc::new(prober)).with_resolver(resolver);

    let report = engine.sweep(targets, Aggression::Gentle, &mut Progress::default()).await.unwrap();
    assert_eq!(report.results.len(), 4);

    let mut live: Vec<(IpAddr, Option<&str>)> = report
        .reachable()
        .map(|r| (r.address(), r.resolved_name()))
        .collect();
    live.sort();
    // Resolution wins over the declared name when it produces one.
    assert_eq!(live, vec![(v4(10, 9, 0, 2), Some("host.lan")), (v4(10, 9, 0, 7), Some("host.lan"))]);
}

#[tokio::test]
async fn oversized_input_fails_before_probing() {
    let err = target::expand_str("10.0.0.0/16", &SystemLookup, DEFAULT_MAX_HOSTS).unwrap_err();
    assert!(matches!(err, InputError::TooManyAddresses { count: 65534, .. }));

    let engine = SweepEngine::new(Arc::new(ScriptedProber::silent()));
    let err = engine
        .sweep(Vec::new(), Aggression::Medium, &mut Progress::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SweepError::Input(InputError::NoTargets)));
}
