//! Per-page fan-out of detail fetches
//!
//! Stubs are spawned onto a `JoinSet`, each task holding a semaphore permit
//! for its whole lifetime, so at most `worker_count` fetches run at once.
//! Results are drained from the set as tasks finish: the returned order is
//! completion order, not submission order.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::fetcher::DetailFetcher;
use crate::listing::JobStub;
use crate::record::{FailureRecord, JobOutcome};

pub struct FanOut {
    fetcher: DetailFetcher,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl FanOut {
    pub fn new(fetcher: DetailFetcher, worker_count: usize, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(worker_count.max(1))),
            cancel,
        }
    }

    /// Fetch every stub and wait for all of them.
    ///
    /// Returns one outcome per dispatched stub. Stubs not yet dispatched when
    /// the cancellation token fires are skipped; in-flight ones finish.
    pub async fn dispatch(&self, stubs: Vec<JobStub>) -> Vec<JobOutcome> {
        let mut tasks = JoinSet::new();

        for stub in stubs {
            if self.cancel.is_cancelled() {
                debug!("cancelled, not dispatching remaining stubs");
                break;
            }
            let permit = tokio::select! {
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = self.cancel.cancelled() => break,
            };

            let fetcher = self.fetcher.clone();
            tasks.spawn(async move {
                // A panicking worker still owes its stub a result
                let outcome = AssertUnwindSafe(fetcher.fetch_detail(&stub))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        error!(job = %stub.title, "detail worker panicked");
                        JobOutcome::Failure(FailureRecord {
                            name: stub.title.clone(),
                            error: "Worker panicked".to_string(),
                        })
                    });
                drop(permit);
                outcome
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "detail worker did not complete"),
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use crate::test_support::{stubs, ScriptedSource};
    use std::time::Duration;

    fn fan_out(source: Arc<ScriptedSource>, workers: usize, cancel: CancellationToken) -> FanOut {
        let config = ScrapeConfig {
            worker_count: workers,
            retry_delay: Duration::from_millis(10),
            ..ScrapeConfig::default()
        };
        let fetcher = DetailFetcher::new(source, &config, cancel.clone());
        FanOut::new(fetcher, workers, cancel)
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_worker_count() {
        let source = Arc::new(
            ScriptedSource::new(vec![], 20).with_detail_delay(Duration::from_millis(50)),
        );
        let scheduler = fan_out(source.clone(), 5, CancellationToken::new());

        let outcomes = scheduler.dispatch(stubs(0, 20)).await;

        assert_eq!(outcomes.len(), 20);
        assert_eq!(source.detail_calls(), 20);
        assert!(source.peak_in_flight() <= 5);
        assert_eq!(source.peak_in_flight(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_arrive_in_completion_order() {
        let source = Arc::new(
            ScriptedSource::new(vec![], 3)
                .with_detail_delay(Duration::from_millis(10))
                .with_slow_link("/careers/jobs/0", Duration::from_millis(500)),
        );
        let scheduler = fan_out(source, 3, CancellationToken::new());

        let outcomes = scheduler.dispatch(stubs(0, 3)).await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.name()).collect();
        assert_eq!(names.len(), 3);
        // the slow first stub does not hold back the others
        assert_eq!(names[2], "Job 0");
        assert!(names[..2].contains(&"Job 1"));
        assert!(names[..2].contains(&"Job 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_outcome_per_stub_including_failures() {
        let source = Arc::new(ScriptedSource::new(vec![], 4).failing_first("/careers/jobs/2", 10));
        let scheduler = fan_out(source, 2, CancellationToken::new());

        let outcomes = scheduler.dispatch(stubs(0, 4)).await;

        assert_eq!(outcomes.len(), 4);
        let failures: Vec<_> = outcomes.iter().filter(|o| o.is_failure()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name(), "Job 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_dispatch_runs_nothing() {
        let source = Arc::new(ScriptedSource::new(vec![], 10));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let scheduler = fan_out(source.clone(), 4, cancel);

        let outcomes = scheduler.dispatch(stubs(0, 10)).await;

        assert!(outcomes.is_empty());
        assert_eq!(source.detail_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_saturated_lets_in_flight_finish() {
        let source = Arc::new(
            ScriptedSource::new(vec![], 10).with_detail_delay(Duration::from_millis(50)),
        );
        let cancel = CancellationToken::new();
        let scheduler = fan_out(source.clone(), 3, cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let outcomes = scheduler.dispatch(stubs(0, 10)).await;

        assert_eq!(source.detail_calls(), 3);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| !o.is_failure()));
    }

    #[tokio::test]
    async fn test_empty_page() {
        let source = Arc::new(ScriptedSource::new(vec![], 10));
        let scheduler = fan_out(source, 4, CancellationToken::new());
        assert!(scheduler.dispatch(Vec::new()).await.is_empty());
    }
}
