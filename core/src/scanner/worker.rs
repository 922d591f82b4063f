use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use sonar_common::models::{ProbeResult, ProbeTarget};
use tracing::trace;

use crate::network::EchoProber;
use crate::resolver::HostnameResolver;

/// Slack on top of the prober's own timeout before we stop waiting for it.
const ECHO_GRACE: Duration = Duration::from_millis(250);

/// Probes one target and, if it answers, names it.
///
/// Never fails: anything short of an echo reply is an unreachable result.
pub async fn probe_target(
    prober: &dyn EchoProber,
    resolver: Option<&Arc<HostnameResolver>>,
    target: ProbeTarget,
    timeout: Duration,
    resolve_budget: Duration,
) -> ProbeResult {
    let echo = tokio::time::timeout(timeout + ECHO_GRACE, prober.echo(target.addr, timeout)).await;
    let Ok(Some(rtt)) = echo else {
        trace!("{} did not answer", target.addr);
        return ProbeResult::unreachable(target.addr);
    };

    let resolved = match resolver {
        Some(resolver) => resolve_blocking(resolver.clone(), target.addr, resolve_budget).await,
        None => None,
    };
    ProbeResult::reachable(target.addr, rtt, resolved.or(target.name))
}

/// Runs the resolver chain on the blocking pool.
pub async fn resolve_blocking(
    resolver: Arc<HostnameResolver>,
    addr: IpAddr,
    budget: Duration,
) -> Option<String> {
    if resolver.is_empty() {
        return None;
    }
    tokio::task::spawn_blocking(move || resolver.resolve(addr, budget))
        .await
        .ok()
        .flatten()
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
    use crate::resolver::ResolveStrategy;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;

    struct FixedProber(Option<Duration>);

    #[async_trait]
    impl EchoProber for FixedProber {
        async fn echo(&self, _addr: IpAddr, _timeout: Duration) -> Option<Duration> {
            self.0
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct HangingProber;

    #[async_trait]
    impl EchoProber for HangingProber {
        async fn echo(&self, _addr: IpAddr, _timeout: Duration) -> Option<Duration> {
            std::future::pending().await
        }

        fn name(&self) -> &'static str {
            "hanging"
        }
    }

    struct Named(Option<&'static str>);

    impl ResolveStrategy for Named {
        fn name(&self) -> &'static str {
            "named"
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn lookup(&self, _addr: IpAddr, _timeout: Duration) -> anyhow::Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    fn target() -> ProbeTarget {
        ProbeTarget::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)))
    }

    const T: Duration = Duration::from_millis(300);
    const BUDGET: Duration = Duration::from_millis(1_500);

    #[tokio::test]
    async fn reachable_host_gets_resolved_name() {
        let resolver = Arc::new(HostnameResolver::new(vec![Arc::new(Named(Some("nas")))]));
        let prober = FixedProber(Some(Duration::from_millis(4)));
        let result = probe_target(&prober, Some(&resolver), target(), T, BUDGET).await;

        assert!(result.is_reachable());
        assert_eq!(result.rtt_ms(), Some(4.0));
        assert_eq!(result.resolved_name(), Some("nas"));
    }

    #[tokio::test]
    async fn declared_name_is_the_fallback() {
        let resolver = Arc::new(HostnameResolver::new(vec![Arc::new(Named(None))]));
        let prober = FixedProber(Some(Duration::from_millis(1)));
        let result = probe_target(&prober, Some(&resolver), target().with_name("router.lan"), T, BUDGET).await;
        assert_eq!(result.resolved_name(), Some("router.lan"));
    }

    #[tokio::test]
    async fn silent_host_is_unreachable_without_resolution() {
        let prober = FixedProber(None);
        let result = probe_target(&prober, None, target().with_name("ghost"), T, BUDGET).await;
        assert!(!result.is_reachable());
        assert_eq!(result.rtt_ms(), None);
        assert_eq!(result.resolved_name(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_prober_is_cut_off() {
        let result = probe_target(&HangingProber, None, target(), T, BUDGET).await;
        assert!(!result.is_reachable());
    }
}
