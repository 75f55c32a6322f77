//! Multi-target iteration
//!
//! Targets are processed left to right. A fatal error from one target stops
//! the run immediately; per-node failures inside a target are collected and
//! the loop moves on.

use crate::error::{AggregateError, FleetError, Result};
use crate::executor::{FleetReport, Outcome};
use std::future::Future;
use tracing::{info, warn};

/// Fan-out result of one target
#[derive(Debug)]
pub struct TargetReport<T> {
    pub target: String,
    pub report: FleetReport<T>,
}

/// Fan-out results of every processed target
#[derive(Debug)]
pub struct MultiTargetReport<T> {
    pub targets: Vec<TargetReport<T>>,
}

impl<T> Default for MultiTargetReport<T> {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
        }
    }
}

impl<T> MultiTargetReport<T> {
    /// Number of nodes acted on across all targets
    pub fn node_count(&self) -> usize {
        self.targets.iter().map(|t| t.report.len()).sum()
    }

    /// Successful values of all targets and the failures of all targets joined
    pub fn into_parts(self) -> (Vec<(String, T)>, Option<AggregateError>) {
        let mut values = Vec::new();
        let mut errors = AggregateError::new();
        for target in self.targets {
            let (ok, failed) = target.report.into_parts();
            values.extend(ok);
            if let Some(failed) = failed {
                errors.merge(failed);
            }
        }
        (values, errors.into_option())
    }

    /// Successful values of all targets, or every failure joined
    pub fn into_result(self) -> Result<Vec<(String, T)>> {
        match self.into_parts() {
            (values, None) => Ok(values),
            (_, Some(errors)) => Err(FleetError::PartialFailure(errors)),
        }
    }
}

/// Run `per_target` for each target in order, stopping at the first fatal error
pub async fn for_each_target<T, F, Fut>(
    targets: &[String],
    mut per_target: F,
) -> Result<MultiTargetReport<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<FleetReport<T>>>,
{
    if targets.is_empty() {
        return Err(FleetError::Validation("no target names given".to_string()));
    }

    let mut multi = MultiTargetReport::default();
    for target in targets {
        info!(target = %target, "Processing target");
        match per_target(target.clone()).await {
            Ok(report) => {
                if report.failure_count() > 0 {
                    warn!(
                        target = %target,
                        failed = report.failure_count(),
                        "Target finished with failures"
                    );
                }
                multi.targets.push(TargetReport {
                    target: target.clone(),
                    report,
                });
            }
            Err(FleetError::PartialFailure(errors)) => {
                warn!(target = %target, failed = errors.len(), "Target finished with failures");
                let mut report = FleetReport::empty();
                report
                    .outcomes
                    .extend(errors.into_iter().map(|(identity, e)| Outcome {
                        identity,
                        result: Err(e),
                    }));
                multi.targets.push(TargetReport {
                    target: target.clone(),
                    report,
                });
            }
            Err(e) => {
                warn!(target = %target, error = %e, "Target failed, skipping remaining targets");
                return Err(e);
            }
        }
    }
    Ok(multi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use std::cell::RefCell;

    fn report(entries: &[(&str, bool)]) -> FleetReport<()> {
        FleetReport {
            outcomes: entries
                .iter()
                .map(|(id, ok)| Outcome {
                    identity: id.to_string(),
                    result: if *ok {
                        Ok(())
                    } else {
                        Err(RemoteError::Connect("refused".to_string()))
                    },
                })
                .collect(),
        }
    }

    fn names(list: &str) -> Vec<String> {
        aerolab_inventory::expand_target_list(list)
    }

    #[tokio::test]
    async fn test_fatal_error_stops_remaining_targets() {
        let visited = RefCell::new(Vec::new());
        let result = for_each_target(&names("bad,good"), |target| {
            visited.borrow_mut().push(target.clone());
            async move {
                if target == "bad" {
                    Err(FleetError::NotFound(format!("Cluster {} not found", target)))
                } else {
                    Ok(report(&[("good:1", true)]))
                }
            }
        })
        .await;

        assert!(matches!(result, Err(FleetError::NotFound(m)) if m.contains("bad")));
        assert_eq!(visited.into_inner(), vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_stop_the_loop() {
        let result = for_each_target(&names("a,b"), |target| async move {
            if target == "a" {
                Ok(report(&[("a:1", true), ("a:2", false)]))
            } else {
                Ok(report(&[("b:1", false), ("b:2", true)]))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.targets.len(), 2);
        assert_eq!(result.node_count(), 4);
        match result.into_result() {
            Err(FleetError::PartialFailure(errors)) => {
                let mut ids: Vec<_> = errors.identities().collect();
                ids.sort();
                assert_eq!(ids, ["a:2", "b:1"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_error_from_target_is_collected() {
        let result = for_each_target(&names("a,b"), |target| async move {
            let mut errors = AggregateError::new();
            errors.push(format!("{}:1", target), RemoteError::Transfer("x".to_string()));
            Err::<FleetReport<()>, _>(FleetError::PartialFailure(errors))
        })
        .await
        .unwrap();

        assert_eq!(result.targets.len(), 2);
        assert!(result.into_result().is_err());
    }

    #[tokio::test]
    async fn test_all_good_targets_succeed() {
        let result = for_each_target(&names("a, b"), |target| async move {
            let id = format!("{}:1", target);
            Ok(report(&[(id.as_str(), true)]))
        })
        .await
        .unwrap();
        assert_eq!(result.into_result().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_targets_is_validation_error() {
        let result = for_each_target(&names(" , "), |_| async { Ok(FleetReport::<()>::empty()) }).await;
        assert!(matches!(result, Err(FleetError::Validation(_))));
    }
}
