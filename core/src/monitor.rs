//! Continuous per-host latency monitoring.
//!
//! Every monitored host gets its own task: probe, record, publish, wait. The
//! task owns the host's state outright and publishes an immutable
//! [`MonitoredHostView`] after each cycle through a per-host `watch` channel,
//! so readers never contend with the loop. A shared `watch` channel carries
//! the run state; the wait between probes races it, which makes pause and stop
//! take effect immediately.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::bail;
use sonar_common::config::{Config, MONITOR_PROBE_TIMEOUT, MONITOR_RESOLVE_BUDGET};
use sonar_common::models::{MonitoredHostView, ProbeTarget, Sample, SampleWindow};
use sonar_common::network::target::{ForwardLookup, SystemLookup};
use sonar_common::{info, warn};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::network::EchoProber;
use crate::resolver::HostnameResolver;
use crate::scanner::worker;

mod export;

pub use export::render_export;

/// How long `stop` waits for each host loop before aborting it.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub window: usize,
    pub resolve_budget: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.interval,
            probe_timeout: MONITOR_PROBE_TIMEOUT,
            window: config.window.max(1),
            resolve_budget: MONITOR_RESOLVE_BUDGET,
        }
    }
}

/// Live state of one host. Owned by its loop.
#[derive(Debug)]
struct MonitoredHost {
    address: IpAddr,
    resolved_name: Option<String>,
    window: SampleWindow,
    success_count: u64,
    fail_count: u64,
    last_update: Option<SystemTime>,
}

impl MonitoredHost {
    fn new(address: IpAddr, resolved_name: Option<String>, window: usize) -> Self {
        Self {
            address,
            resolved_name,
            window: SampleWindow::new(window),
            success_count: 0,
            fail_count: 0,
            last_update: None,
        }
    }

    fn record(&mut self, sample: Sample) {
        if sample.reachable {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
        self.window.push(sample);
        self.last_update = Some(SystemTime::now());
    }

    fn view(&self) -> MonitoredHostView {
        MonitoredHostView::from_window(
            self.address,
            self.resolved_name.clone(),
            &self.window,
            self.success_count,
            self.fail_count,
            self.last_update,
        )
    }
}

struct HostEntry {
    view: watch::Receiver<MonitoredHostView>,
    /// Host state and publisher waiting for `start`.
    pending: Option<(MonitoredHost, watch::Sender<MonitoredHostView>)>,
    handle: Option<JoinHandle<()>>,
}

/// Everything a host loop needs besides its own state.
#[derive(Clone)]
struct LoopContext {
    prober: Arc<dyn EchoProber>,
    resolver: Option<Arc<HostnameResolver>>,
    settings: MonitorSettings,
    control: watch::Receiver<MonitorState>,
}

pub struct Monitor {
    prober: Arc<dyn EchoProber>,
    resolver: Option<Arc<HostnameResolver>>,
    lookup: Arc<dyn ForwardLookup + Send + Sync>,
    settings: MonitorSettings,
    control: watch::Sender<MonitorState>,
    hosts: BTreeMap<IpAddr, HostEntry>,
    runtime: Option<Handle>,
}

impl Monitor {
    pub fn new(
        prober: Arc<dyn EchoProber>,
        resolver: Option<Arc<HostnameResolver>>,
        settings: MonitorSettings,
    ) -> Self {
        let (control, _) = watch::channel(MonitorState::Idle);
        Self {
            prober,
            resolver,
            lookup: Arc::new(SystemLookup),
            settings,
            control,
            hosts: BTreeMap::new(),
            runtime: None,
        }
    }

    pub fn from_config(config: &Config, prober: Arc<dyn EchoProber>) -> Self {
        let resolver = (!config.no_resolve).then(|| Arc::new(HostnameResolver::with_defaults(config)));
        Self::new(prober, resolver, MonitorSettings::from(config))
    }

    /// Replaces the resolver used for hostnames passed to [`add`](Self::add).
    pub fn with_lookup(mut self, lookup: Arc<dyn ForwardLookup + Send + Sync>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn state(&self) -> MonitorState {
        *self.control.borrow()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.hosts.contains_key(addr)
    }

    /// Adds an address or hostname.
    ///
    /// Returns the monitored address, or `None` if the name doesn't resolve or
    /// the address is already monitored. While running, the new host's loop
    /// starts right away.
    pub fn add(&mut self, host: &str) -> Option<IpAddr> {
        let host = host.trim();
        let (address, declared) = match host.parse::<IpAddr>() {
            Ok(addr) => (addr, None),
            Err(_) => match self.lookup.lookup(host) {
                Some(addr) => (addr, Some(host.to_string())),
                None => {
                    warn!("Could not resolve {host}");
                    return None;
                }
            },
        };
        if self.hosts.contains_key(&address) {
            debug!("{address} is already monitored");
            return None;
        }

        let state = MonitoredHost::new(address, declared, self.settings.window);
        let (publisher, view) = watch::channel(state.view());
        let mut entry = HostEntry {
            view,
            pending: Some((state, publisher)),
            handle: None,
        };
        if matches!(self.state(), MonitorState::Running | MonitorState::Paused) {
            self.spawn_loop(&mut entry);
        }
        self.hosts.insert(address, entry);
        info!("Monitoring {address}");
        Some(address)
    }

    /// Stops monitoring `addr`, discarding its history.
    pub fn remove(&mut self, addr: &IpAddr) -> bool {
        match self.hosts.remove(addr) {
            Some(entry) => {
                if let Some(handle) = entry.handle {
                    handle.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Starts every host loop. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> anyhow::Result<()> {
        match self.state() {
            MonitorState::Running | MonitorState::Paused => return Ok(()),
            MonitorState::Stopped => bail!("monitor has been stopped"),
            MonitorState::Idle => {}
        }
        self.runtime = Some(Handle::try_current()?);
        self.control.send_replace(MonitorState::Running);

        let mut hosts = std::mem::take(&mut self.hosts);
        for entry in hosts.values_mut() {
            self.spawn_loop(entry);
        }
        self.hosts = hosts;
        Ok(())
    }

    pub fn pause(&self) {
        if self.state() == MonitorState::Running {
            self.control.send_replace(MonitorState::Paused);
        }
    }

    pub fn resume(&self) {
        if self.state() == MonitorState::Paused {
            self.control.send_replace(MonitorState::Running);
        }
    }

    /// Toggles between running and paused; returns the new state.
    pub fn toggle_pause(&self) -> MonitorState {
        match self.state() {
            MonitorState::Running => self.pause(),
            MonitorState::Paused => self.resume(),
            _ => {}
        }
        self.state()
    }

    /// Signals every loop to exit and waits for them, aborting stragglers.
    pub async fn stop(&mut self) {
        self.control.send_replace(MonitorState::Stopped);
        for (addr, entry) in self.hosts.iter_mut() {
            let Some(mut handle) = entry.handle.take() else {
                continue;
            };
            if tokio::time::timeout(STOP_JOIN_TIMEOUT, &mut handle).await.is_err() {
                warn!("Monitor loop for {addr} did not stop in time, aborting");
                handle.abort();
            }
        }
    }

    pub fn snapshot(&self) -> BTreeMap<IpAddr, MonitoredHostView> {
        self.hosts
            .iter()
            .map(|(addr, entry)| (*addr, entry.view.borrow().clone()))
            .collect()
    }

    pub fn export(&self) -> String {
        render_export(&self.snapshot())
    }

    fn spawn_loop(&self, entry: &mut HostEntry) {
        let (Some(runtime), Some((host, publisher))) = (&self.runtime, entry.pending.take()) else {
            return;
        };
        let ctx = LoopContext {
            prober: self.prober.clone(),
            resolver: self.resolver.clone(),
            settings: self.settings.clone(),
            control: self.control.subscribe(),
        };
        entry.handle = Some(runtime.spawn(run_host(host, publisher, ctx)));
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        for entry in self.hosts.values() {
            if let Some(handle) = &entry.handle {
                handle.abort();
            }
        }
    }
}

async fn run_host(
    mut host: MonitoredHost,
    publisher: watch::Sender<MonitoredHostView>,
    mut ctx: LoopContext,
) {
    if host.resolved_name.is_none()
        && let Some(resolver) = ctx.resolver.clone()
    {
        host.resolved_name =
            worker::resolve_blocking(resolver, host.address, ctx.settings.resolve_budget).await;
        publisher.send_replace(host.view());
    }

    loop {
        let state = *ctx.control.borrow_and_update();
        match state {
            MonitorState::Stopped => break,
            MonitorState::Running => {
                let result = worker::probe_target(
                    ctx.prober.as_ref(),
                    None,
                    ProbeTarget::new(host.address),
                    ctx.settings.probe_timeout,
                    Duration::ZERO,
                )
                .await;
                host.record(Sample::from(&result));
                publisher.send_replace(host.view());
            }
            MonitorState::Idle | MonitorState::Paused => {}
        }

        tokio::select! {
            _ = tokio::time::sleep(ctx.settings.interval) => {}
            changed = ctx.control.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("monitor loop for {} exited", host.address);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
