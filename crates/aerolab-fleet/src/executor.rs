//! Bounded-concurrency fleet executor
//!
//! Every resource gets its own task; a semaphore caps how many run at once.
//! A failing or panicking unit never cancels its siblings, and the call only
//! returns once every task has finished.

use crate::error::{AggregateError, RemoteError, RemoteResult};
use aerolab_inventory::Identify;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Concurrency used when a command does not say otherwise
pub const DEFAULT_PARALLEL_THREADS: usize = 10;

/// Result of one unit of work
#[derive(Debug)]
pub struct Outcome<T> {
    pub identity: String,
    pub result: RemoteResult<T>,
}

/// Results of one fan-out, in completion order
#[derive(Debug)]
pub struct FleetReport<T> {
    pub outcomes: Vec<Outcome<T>>,
}

impl<T> Default for FleetReport<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }
}

impl<T> FleetReport<T> {
    /// Report of a fan-out that had nothing to act on
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(value) => Some((o.identity.as_str(), value)),
            Err(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &RemoteError)> + '_ {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.identity.as_str(), e)),
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// Split into successful values and the joined failures
    pub fn into_parts(self) -> (Vec<(String, T)>, Option<AggregateError>) {
        let mut values = Vec::new();
        let mut errors = AggregateError::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(value) => values.push((outcome.identity, value)),
                Err(e) => errors.push(outcome.identity, e),
            }
        }
        (values, errors.into_option())
    }

    /// Successful values, or every failure joined
    pub fn into_result(self) -> Result<Vec<(String, T)>, AggregateError> {
        match self.into_parts() {
            (values, None) => Ok(values),
            (_, Some(errors)) => Err(errors),
        }
    }
}

/// Apply `unit` to every resource with at most `concurrency` running at once
///
/// `concurrency` of 0 is treated as 1. Completion order is unspecified; the
/// set of outcomes does not depend on `concurrency`.
pub async fn run_fleet<R, T, F, Fut>(
    resources: impl IntoIterator<Item = R>,
    concurrency: usize,
    unit: F,
) -> FleetReport<T>
where
    R: Identify + Send + 'static,
    T: Send + 'static,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RemoteResult<T>> + Send + 'static,
{
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let unit = Arc::new(unit);
    let started = Instant::now();

    let mut running = FuturesUnordered::new();
    for resource in resources {
        let identity = resource.identity();
        let semaphore = Arc::clone(&semaphore);
        let unit = Arc::clone(&unit);
        let task_identity = identity.clone();

        let handle = tokio::spawn(async move {
            // the semaphore is never closed
            let _permit = semaphore.acquire_owned().await.ok();
            debug!(resource = %task_identity, "Dispatching unit of work");
            unit(resource).await
        });
        running.push(async move { (identity, handle.await) });
    }

    info!(
        resources = running.len(),
        concurrency, "Starting fleet fan-out"
    );

    let mut report = FleetReport::empty();
    while let Some((identity, joined)) = running.next().await {
        let result = match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(RemoteError::WorkerPanic(panic_message(e.into_panic()))),
            Err(e) => Err(RemoteError::WorkerPanic(e.to_string())),
        };
        match &result {
            Ok(_) => debug!(resource = %identity, "Unit of work succeeded"),
            Err(e) => warn!(resource = %identity, error = %e, "Unit of work failed"),
        }
        report.outcomes.push(Outcome { identity, result });
    }

    info!(
        resources = report.len(),
        failed = report.failure_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fleet fan-out finished"
    );
    report
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
