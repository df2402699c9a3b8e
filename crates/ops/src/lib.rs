//! Kubeform Ops: readiness polling for converging objects and warning-event enrichment.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kubeform_core::{ObjectId, ReconcileError, Result};
use kubeform_kubehub::{EventSource, WarningEvent};
use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What the poller waits for: a label moving through `pending` until it equals `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessState {
    pub pending: BTreeSet<String>,
    pub target: String,
    pub timeout: Duration,
}

impl ReadinessState {
    /// Counter convergence: pending labels `"0"..target-1`, terminal label `target`.
    pub fn replica_count(target: i32, timeout: Duration) -> Self {
        Self { pending: (0..target.max(0)).map(|i| i.to_string()).collect(), target: target.to_string(), timeout }
    }
}

/// Time source for the poller; injected so waits are testable without real delays.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, d: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant { Instant::now() }
    async fn sleep(&self, d: Duration) { tokio::time::sleep(d).await }
}

/// Doubling delay between refreshes, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub min: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self { Self { min: Duration::from_millis(100), max: Duration::from_secs(10) } }
}

impl Backoff {
    fn next(&self, cur: Duration) -> Duration { cur.saturating_mul(2).clamp(self.min, self.max.max(self.min)) }
}

pub struct Poller<C: Clock = TokioClock> {
    clock: C,
    backoff: Backoff,
    cancel: Option<CancellationToken>,
}

impl Poller<TokioClock> {
    pub fn new() -> Self { Self::with_clock(TokioClock) }
}

impl Default for Poller<TokioClock> {
    fn default() -> Self { Self::new() }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(clock: C) -> Self { Self { clock, backoff: Backoff::default(), cancel: None } }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Stop waiting as soon as `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn cancelled(&self) -> bool { self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) }

    /// Refresh until the observed label reaches the target.
    ///
    /// A refresh error aborts immediately. A label outside both the pending set and the target
    /// is fatal. Sleeps never overshoot the deadline.
    pub async fn wait_until_ready<T, F, Fut>(&self, state: &ReadinessState, mut refresh: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String)>>,
    {
        let start = self.clock.now();
        let mut delay = self.backoff.min;
        loop {
            if self.cancelled() {
                return Err(ReconcileError::Cancelled { target: state.target.clone() });
            }
            let (obj, label) = refresh().await?;
            let elapsed = self.clock.now().saturating_duration_since(start);
            debug!(label = %label, target = %state.target, elapsed_ms = elapsed.as_millis() as u64, "readiness poll");
            if label == state.target {
                histogram!("readiness_wait_ms", elapsed.as_secs_f64() * 1000.0);
                return Ok(obj);
            }
            if !state.pending.contains(&label) {
                return Err(ReconcileError::UnexpectedState { label, target: state.target.clone() });
            }
            if elapsed >= state.timeout {
                counter!("readiness_timeout_total", 1u64);
                return Err(ReconcileError::Timeout {
                    target: state.target.clone(),
                    last: Some(label),
                    waited: elapsed,
                    events: String::new(),
                });
            }
            let pause = delay.min(state.timeout - elapsed);
            match &self.cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(ReconcileError::Cancelled { target: state.target.clone() }),
                    _ = self.clock.sleep(pause) => {}
                },
                None => self.clock.sleep(pause).await,
            }
            delay = self.backoff.next(delay);
        }
    }
}

/// Warning events for an object, most recent first, capped at `limit`, one display line each.
///
/// A failed query is returned as an error rather than producing an empty list.
pub async fn recent_warnings<E: EventSource + ?Sized>(events: &E, kind: &str, id: &ObjectId, limit: usize) -> Result<Vec<String>> {
    let mut items = events.warning_events(kind, id).await?;
    items.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    Ok(items.iter().take(limit).map(render_event).collect())
}

fn render_event(ev: &WarningEvent) -> String {
    match ev.last_seen {
        Some(ts) => format!("{} {}: {}", ts.format("%Y-%m-%dT%H:%M:%SZ"), ev.reason, ev.message),
        None => format!("{}: {}", ev.reason, ev.message),
    }
}

/// Text appended to a timeout message; empty when there is nothing to show.
pub fn render_warnings(lines: &[String]) -> String {
    if lines.is_empty() { return String::new(); }
    let mut out = String::from("\n\nMost recent warning events:");
    for l in lines {
        out.push_str("\n\t");
        out.push_str(l);
    }
    out
}

/// Wait for readiness; on timeout attach the object's most recent warning events.
pub async fn wait_with_diagnostics<C, E, T, F, Fut>(
    poller: &Poller<C>,
    state: &ReadinessState,
    refresh: F,
    events: &E,
    kind: &str,
    id: &ObjectId,
    limit: usize,
) -> Result<T>
where
    C: Clock,
    E: EventSource + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, String)>>,
{
    match poller.wait_until_ready(state, refresh).await {
        Err(ReconcileError::Timeout { target, last, waited, .. }) => {
            warn!(kind, id = %id, target = %target, last = ?last, waited_s = waited.as_secs(), "readiness timeout");
            let lines = recent_warnings(events, kind, id, limit).await?;
            Err(ReconcileError::Timeout { target, last, waited, events: render_warnings(&lines) })
        }
        other => other,
    }
}
