//! Reverse name resolution through an ordered chain of strategies.
//!
//! The chain is assembled once from whatever the current platform supports.
//! Resolution walks it in order and stops at the first plausible name; a
//! strategy that errors, times out or answers with junk is simply a miss.
//!
//! Everything here blocks. Async callers go through `spawn_blocking`.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sonar_common::config::Config;
use tracing::debug;

pub mod echo;
pub mod nbstat;
pub mod ptr;
pub mod utility;

pub use echo::EchoReverseStrategy;
pub use nbstat::NbstatStrategy;
pub use ptr::PtrStrategy;
pub use utility::UtilityStrategy;

/// Smallest slice of the budget worth handing to a strategy.
const MIN_STRATEGY_TIME: Duration = Duration::from_millis(10);

/// One way of turning an address into a name.
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the strategy can work on this platform for any address at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Upper bound on a single lookup.
    fn timeout(&self) -> Duration;

    /// Looks `addr` up, giving up after `timeout`.
    ///
    /// `Ok(None)` is a plain miss; errors are treated the same way by the chain.
    fn lookup(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>>;
}

/// A name together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub strategy: &'static str,
}

pub struct HostnameResolver {
    chain: Vec<Arc<dyn ResolveStrategy>>,
}

impl HostnameResolver {
    /// Builds a chain from `strategies`, dropping the unsupported ones.
    pub fn new(strategies: Vec<Arc<dyn ResolveStrategy>>) -> Self {
        let chain: Vec<_> = strategies
            .into_iter()
            .filter(|strategy| {
                let supported = strategy.is_supported();
                if !supported {
                    debug!("resolve strategy '{}' unsupported here", strategy.name());
                }
                supported
            })
            .collect();
        Self { chain }
    }

    /// PTR, echo-reverse, NBSTAT then the external utility.
    pub fn with_defaults(config: &Config) -> Self {
        Self::new(vec![
            Arc::new(PtrStrategy::from_config(config)),
            Arc::new(EchoReverseStrategy::new()),
            Arc::new(NbstatStrategy::new()),
            Arc::new(UtilityStrategy::detect()),
        ])
    }

    /// A resolver that never answers.
    pub fn disabled() -> Self {
        Self { chain: Vec::new() }
    }

    pub fn strategies(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.chain.iter().map(|strategy| strategy.name())
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn resolve(&self, addr: IpAddr, overall: Duration) -> Option<String> {
        self.resolve_detailed(addr, overall).map(|res| res.name)
    }

    /// Runs the chain within `overall`, reporting which strategy answered.
    pub fn resolve_detailed(&self, addr: IpAddr, overall: Duration) -> Option<Resolution> {
        let deadline = Instant::now() + overall;

        for strategy in &self.chain {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < MIN_STRATEGY_TIME {
                debug!("resolution budget for {addr} exhausted before '{}'", strategy.name());
                break;
            }
            let timeout = strategy.timeout().min(remaining);

            match strategy.lookup(addr, timeout) {
                Ok(Some(raw)) => match sanitize_name(&raw, addr) {
                    Some(name) => {
                        debug!("'{}' resolved {addr} to {name}", strategy.name());
                        return Some(Resolution { name, strategy: strategy.name() });
                    }
                    None => debug!("'{}' returned unusable name {raw:?} for {addr}", strategy.name()),
                },
                Ok(None) => debug!("'{}' found no name for {addr}", strategy.name()),
                Err(e) => debug!("'{}' failed for {addr}: {e:#}", strategy.name()),
            }
        }
        None
    }
}

/// Trims `raw` and rejects names that carry no information about the host.
pub fn sanitize_name(raw: &str, addr: IpAddr) -> Option<String> {
    let name = raw.trim().trim_end_matches('.');
    if name.is_empty()
        || name.starts_with('\u{1}')
        || name.starts_with('*')
        || name.chars().any(char::is_control)
        || name.eq_ignore_ascii_case("localhost")
        || name == addr.to_string()
    {
        return None;
    }
    Some(name.to_string())
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
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fake {
        name: &'static str,
        supported: bool,
        answer: anyhow::Result<Option<String>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Fake {
        fn answering(name: &'static str, answer: Option<&str>) -> Self {
            Self {
                name,
                supported: true,
                answer: Ok(answer.map(str::to_string)),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self { answer: Err(anyhow::anyhow!("boom")), ..Self::answering(name, None) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ResolveStrategy for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_supported(&self) -> bool {
            self.supported
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn lookup(&self, _addr: IpAddr, timeout: Duration) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay.min(timeout));
            match &self.answer {
                Ok(answer) => Ok(answer.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))
    }

    fn chain(fakes: &[Arc<Fake>]) -> HostnameResolver {
        HostnameResolver::new(fakes.iter().map(|f| f.clone() as Arc<dyn ResolveStrategy>).collect())
    }

    #[test]
    fn stops_at_first_valid_name() {
        let first = Arc::new(Fake::answering("first", Some("nas.lan")));
        let second = Arc::new(Fake::answering("second", Some("other")));
        let resolver = chain(&[first.clone(), second.clone()]);

        let res = resolver.resolve_detailed(addr(), Duration::from_secs(5)).unwrap();
        assert_eq!(res, Resolution { name: "nas.lan".into(), strategy: "first" });
        assert_eq!(second.calls(), 0);
    }

    #[test]
    fn failures_and_junk_fall_through() {
        let failing = Arc::new(Fake::failing("failing"));
        let junk = Arc::new(Fake::answering("junk", Some("192.168.1.20")));
        let good = Arc::new(Fake::answering("good", Some("printer\n")));
        let resolver = chain(&[failing.clone(), junk.clone(), good]);

        assert_eq!(resolver.resolve(addr(), Duration::from_secs(5)), Some("printer".into()));
        assert_eq!(failing.calls(), 1);
        assert_eq!(junk.calls(), 1);
    }

    #[test]
    fn unsupported_strategies_are_filtered_at_construction() {
        let mut off = Fake::answering("off", Some("never"));
        off.supported = false;
        let resolver = chain(&[Arc::new(off), Arc::new(Fake::answering("on", None))]);

        assert_eq!(resolver.strategies().collect::<Vec<_>>(), vec!["on"]);
        assert_eq!(resolver.resolve(addr(), Duration::from_secs(1)), None);
    }

    #[test]
    fn exhausted_budget_stops_the_chain() {
        let mut slow = Fake::answering("slow", None);
        slow.delay = Duration::from_millis(200);
        let later = Arc::new(Fake::answering("later", Some("late.lan")));
        let resolver = chain(&[Arc::new(slow), later.clone()]);

        let started = Instant::now();
        assert_eq!(resolver.resolve(addr(), Duration::from_millis(100)), None);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(later.calls(), 0);
    }

    #[test]
    fn disabled_resolver_never_answers() {
        let resolver = HostnameResolver::disabled();
        assert!(resolver.is_empty());
        assert_eq!(resolver.resolve(addr(), Duration::from_secs(1)), None);
    }

    #[test]
    fn sanitize_rejects_uninformative_names() {
        let a = addr();
        assert_eq!(sanitize_name("  host.lan. ", a), Some("host.lan".into()));
        assert_eq!(sanitize_name("", a), None);
        assert_eq!(sanitize_name("\u{1}\u{2}__MSBROWSE__", a), None);
        assert_eq!(sanitize_name("*", a), None);
        assert_eq!(sanitize_name("bad\u{7}name", a), None);
        assert_eq!(sanitize_name("LocalHost", a), None);
        assert_eq!(sanitize_name("192.168.1.20", a), None);
    }
}
