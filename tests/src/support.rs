use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sonar_common::network::target::ForwardLookup;
use sonar_core::network::EchoProber;

/// Answers from a fixed table; unknown addresses stay silent.
#[derive(Default)]
pub struct ScriptedProber {
    replies: HashMap<IpAddr, Duration>,
    delay: Duration,
    probes: AtomicUsize,
}

impl ScriptedProber {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn reply(mut self, addr: IpAddr, rtt: Duration) -> Self {
        self.replies.insert(addr, rtt);
        self
    }

    /// Every probe takes `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EchoProber for ScriptedProber {
    async fn echo(&self, addr: IpAddr, _timeout: Duration) -> Option<Duration> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies.get(&addr).copied()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Answers every address after `delay`.
pub struct AlwaysUp {
    pub rtt: Duration,
    pub delay: Duration,
}

#[async_trait]
impl EchoProber for AlwaysUp {
    async fn echo(&self, _addr: IpAddr, _timeout: Duration) -> Option<Duration> {
        tokio::time::sleep(self.delay).await;
        Some(self.rtt)
    }

    fn name(&self) -> &'static str {
        "always-up"
    }
}

/// Forward lookups from a fixed table.
#[derive(Default)]
pub struct StaticLookup(pub HashMap<String, IpAddr>);

impl StaticLookup {
    pub fn with(mut self, name: &str, addr: IpAddr) -> Self {
        self.0.insert(name.to_string(), addr);
        self
    }
}

impl ForwardLookup for StaticLookup {
    fn lookup(&self, name: &str) -> Option<IpAddr> {
        self.0.get(name).copied()
    }
}
