//! Bulk liveness sweeps.
//!
//! A sweep schedules one probe task per target up front; a [`Semaphore`] sized
//! to the aggression profile decides how many actually run at once. Workers
//! hand their [`ProbeResult`] to a single dispatch loop over a bounded channel.
//! That loop owns the result vector, throttles progress callbacks and watches
//! the [`CancelToken`].
//!
//! ```no_run
//! # async fn demo(targets: Vec<sonar_common::models::ProbeTarget>) -> anyhow::Result<()> {
//! use sonar_common::config::Aggression;
//! use sonar_core::{network, scanner::{NoopObserver, SweepEngine}};
//!
//! let engine = SweepEngine::new(network::default_prober());
//! let report = engine.sweep(targets, Aggression::Medium, &mut NoopObserver).await?;
//! println!("{} hosts up", report.alive_count());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use sonar_common::config::{Aggression, Config, SWEEP_RESOLVE_BUDGET};
use sonar_common::error::InputError;
use sonar_common::models::{ProbeResult, ProbeTarget};
use sonar_common::{success, warn};
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::debug;

use crate::network::EchoProber;
use crate::resolver::HostnameResolver;

mod cancel;
mod progress;
pub mod worker;

pub use cancel::CancelToken;
pub use progress::{PROGRESS_BATCH, PROGRESS_INTERVAL, ProgressThrottle};

/// Results buffered between workers and the dispatch loop.
const RESULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("no tokio runtime available to run the sweep")]
    Runtime,
}

/// How a sweep ended. Every run ends in exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepStatus {
    Completed,
    Cancelled,
    Failed { reason: String },
}

/// Receives progress from the dispatch loop.
///
/// Callbacks run on the dispatch loop itself; keep them short.
pub trait SweepObserver {
    /// `completed` never exceeds `total`; the last call has them equal unless
    /// the sweep was cut short.
    fn on_progress(&mut self, completed: usize, total: usize, latest: &ProbeResult);

    fn on_finish(&mut self, _status: &SweepStatus, _results: &[ProbeResult]) {}
}

/// Ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {
    fn on_progress(&mut self, _completed: usize, _total: usize, _latest: &ProbeResult) {}
}

impl<F> SweepObserver for F
where
    F: FnMut(usize, usize, &ProbeResult),
{
    fn on_progress(&mut self, completed: usize, total: usize, latest: &ProbeResult) {
        self(completed, total, latest)
    }
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub status: SweepStatus,
    /// In completion order.
    pub results: Vec<ProbeResult>,
    /// Number of targets scheduled.
    pub total: usize,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn reachable(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|result| result.is_reachable())
    }

    pub fn alive_count(&self) -> usize {
        self.reachable().count()
    }
}

/// Shared configuration for any number of sweeps.
#[derive(Clone)]
pub struct SweepEngine {
    prober: Arc<dyn EchoProber>,
    resolver: Option<Arc<HostnameResolver>>,
    concurrency: Option<usize>,
    resolve_budget: Duration,
}

impl SweepEngine {
    pub fn new(prober: Arc<dyn EchoProber>) -> Self {
        Self {
            prober,
            resolver: None,
            concurrency: None,
            resolve_budget: SWEEP_RESOLVE_BUDGET,
        }
    }

    /// Engine with the default resolver chain unless resolution is disabled.
    pub fn from_config(config: &Config, prober: Arc<dyn EchoProber>) -> Self {
        let engine = Self::new(prober).with_concurrency(config.concurrency);
        if config.no_resolve {
            engine
        } else {
            engine.with_resolver(Arc::new(HostnameResolver::with_defaults(config)))
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<HostnameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replaces the aggression profile's concurrency.
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_resolve_budget(mut self, budget: Duration) -> Self {
        self.resolve_budget = budget;
        self
    }

    pub fn prober(&self) -> &dyn EchoProber {
        self.prober.as_ref()
    }

    /// Prepares a sweep without starting it, so the caller can grab its
    /// [`CancelToken`] first.
    pub fn session(
        &self,
        targets: Vec<ProbeTarget>,
        aggression: Aggression,
    ) -> Result<SweepSession, SweepError> {
        if targets.is_empty() {
            return Err(InputError::NoTargets.into());
        }
        tokio::runtime::Handle::try_current().map_err(|_| SweepError::Runtime)?;

        let concurrency = self.concurrency.unwrap_or(aggression.concurrency()).max(1);
        Ok(SweepSession {
            engine: self.clone(),
            targets,
            timeout: aggression.timeout(),
            concurrency,
            cancel: CancelToken::new(),
        })
    }

    /// Runs a sweep to its end.
    pub async fn sweep<O: SweepObserver + ?Sized>(
        &self,
        targets: Vec<ProbeTarget>,
        aggression: Aggression,
        observer: &mut O,
    ) -> Result<SweepReport, SweepError> {
        Ok(self.session(targets, aggression)?.run(observer).await)
    }
}

/// One sweep over a fixed target list.
pub struct SweepSession {
    engine: SweepEngine,
    targets: Vec<ProbeTarget>,
    timeout: Duration,
    concurrency: usize,
    cancel: CancelToken,
}

impl SweepSession {
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub async fn run<O: SweepObserver + ?Sized>(self, observer: &mut O) -> SweepReport {
        let started = Instant::now();
        let total = self.targets.len();
        debug!(
            "sweeping {total} targets with {} workers, {:?} timeout",
            self.concurrency, self.timeout
        );

        let (tx, mut rx) = mpsc::channel::<ProbeResult>(RESULT_CHANNEL_CAPACITY.min(total).max(1));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for target in self.targets {
            let tx = tx.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let prober = self.engine.prober.clone();
            let resolver = self.engine.resolver.clone();
            let (timeout, budget) = (self.timeout, self.engine.resolve_budget);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                if cancel.is_cancelled() {
                    return;
                }
                let result =
                    worker::probe_target(prober.as_ref(), resolver.as_ref(), target, timeout, budget)
                        .await;
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut results: Vec<ProbeResult> = Vec::with_capacity(total);
        let mut throttle = ProgressThrottle::new(total);

        let status = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break SweepStatus::Cancelled,

                received = rx.recv() => {
                    let Some(result) = received else {
                        break SweepStatus::Failed {
                            reason: format!("result channel closed after {} of {total} probes", results.len()),
                        };
                    };
                    results.push(result);
                    let completed = results.len();
                    if throttle.should_emit(completed)
                        && let Some(latest) = results.last()
                    {
                        observer.on_progress(completed, total, latest);
                    }
                    if completed == total {
                        break SweepStatus::Completed;
                    }
                    if self.cancel.is_cancelled() {
                        break SweepStatus::Cancelled;
                    }
                }

                Some(joined) = tasks.join_next() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        break SweepStatus::Failed { reason: format!("probe worker panicked: {e}") };
                    }
                }
            }
        };

        // Outstanding probes are abandoned, not awaited.
        tasks.abort_all();

        match &status {
            SweepStatus::Completed => {
                let alive = results.iter().filter(|r| r.is_reachable()).count();
                success!("Sweep finished: {alive} of {total} hosts responded");
            }
            SweepStatus::Cancelled => {
                warn!("Sweep cancelled after {} of {total} probes", results.len());
            }
            SweepStatus::Failed { reason } => {
                warn!("Sweep failed: {reason}");
            }
        }

        observer.on_finish(&status, &results);
        SweepReport {
            status,
            results,
            total,
            elapsed: started.elapsed(),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
