//! Bounded concurrent execution of one pass over a set of records.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::{Id, JoinSet};
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, error, info};

use crate::records::Record;
use crate::runner::{Provisioner, TaskOutcome};

/// Result of one pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Worker count the pass ran with.
    pub workers: usize,

    /// Number of records attempted.
    pub attempted: usize,

    /// Number of records that succeeded.
    pub succeeded: usize,

    /// Records that failed or crashed, in completion order.
    pub failed: Vec<Record>,

    /// How many of `failed` crashed rather than reported an error.
    pub crashed: usize,
}

impl BatchReport {
    #[must_use]
    pub fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|r| r.name.clone()).collect()
    }

    fn record(&mut self, record: Record, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Success { .. } => {
                info!("{}", outcome);
                self.succeeded += 1;
            }
            TaskOutcome::Failure { .. } => {
                error!("{}", outcome);
                self.failed.push(record);
            }
            TaskOutcome::Crashed { .. } => {
                error!("{}", outcome);
                self.crashed += 1;
                self.failed.push(record);
            }
        }
    }
}

/// Runs a provisioner over records with at most `workers` tasks in flight.
pub struct BatchExecutor<P> {
    provisioner: Arc<P>,
}

impl<P: Provisioner> BatchExecutor<P> {
    #[must_use]
    pub const fn new(provisioner: Arc<P>) -> Self {
        Self { provisioner }
    }

    /// Provisions every record and waits for all of them.
    ///
    /// No task outlives the call. A task that panics is reported as
    /// crashed and counted among the failures.
    pub async fn run(&self, workers: usize, records: Vec<Record>) -> BatchReport {
        let workers = workers.max(1);
        let mut report = BatchReport {
            workers,
            attempted: records.len(),
            ..BatchReport::default()
        };

        let mut pending = records.into_iter();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        let mut in_flight: HashMap<Id, Record> = HashMap::new();

        loop {
            while tasks.len() < workers {
                let Some(record) = pending.next() else {
                    break;
                };

                let provisioner = Arc::clone(&self.provisioner);
                let task_record = record.clone();
                let handle = tasks.spawn(
                    async move { provisioner.provision(&task_record).await }
                        .in_current_span()
                        .with_current_subscriber(),
                );
                in_flight.insert(handle.id(), record);
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };

            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(e) => {
                    let name = in_flight
                        .get(&e.id())
                        .map_or_else(|| "<unknown>".to_owned(), |r| r.name.clone());
                    let detail = if e.is_panic() {
                        "task panicked".to_owned()
                    } else {
                        e.to_string()
                    };
                    (e.id(), TaskOutcome::Crashed { name, detail })
                }
            };

            match in_flight.remove(&id) {
                Some(record) => report.record(record, &outcome),
                None => error!("Finished task {} has no record: {}", id, outcome),
            }
        }

        report
    }
}

impl<P> std::fmt::Debug for BatchExecutor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Provisioner whose outcome is decided by record name.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedProvisioner {
        always_fail: HashSet<String>,
        fail_once: HashSet<String>,
        panics: HashSet<String>,
        attempts: Mutex<HashMap<String, usize>>,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedProvisioner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn always_failing(mut self, names: &[&str]) -> Self {
            self.always_fail.extend(names.iter().map(|n| (*n).to_owned()));
            self
        }

        pub(crate) fn failing_once(mut self, names: &[&str]) -> Self {
            self.fail_once.extend(names.iter().map(|n| (*n).to_owned()));
            self
        }

        pub(crate) fn panicking(mut self, names: &[&str]) -> Self {
            self.panics.extend(names.iter().map(|n| (*n).to_owned()));
            self
        }

        pub(crate) fn attempts(&self, name: &str) -> usize {
            self.attempts.lock().unwrap().get(name).copied().unwrap_or(0)
        }

        pub(crate) fn total_attempts(&self) -> usize {
            self.attempts.lock().unwrap().values().sum()
        }

        pub(crate) fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }

        pub(crate) fn reset_peak(&self) {
            self.peak.store(0, Ordering::SeqCst);
        }
    }

    impl Provisioner for ScriptedProvisioner {
        async fn provision(&self, record: &Record) -> TaskOutcome {
            let name = record.name.clone();
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(name.clone()).or_insert(0);
                *count += 1;
                *count
            };

            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            assert!(!self.panics.contains(&name), "provisioner blew up on {name}");

            if self.always_fail.contains(&name) || (self.fail_once.contains(&name) && attempt == 1) {
                TaskOutcome::Failure {
                    name,
                    detail: format!("attempt {attempt} rejected"),
                }
            } else {
                TaskOutcome::Success {
                    name,
                    detail: Some(format!("attempt {attempt} ok")),
                }
            }
        }
    }

    fn records(names: &[&str]) -> Vec<Record> {
        names.iter().map(|n| Record::named(*n)).collect()
    }

    fn user_records(count: usize) -> Vec<Record> {
        (0..count).map(|i| Record::named(format!("u{i}"))).collect()
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let provisioner = Arc::new(ScriptedProvisioner::new());
        let executor = BatchExecutor::new(Arc::clone(&provisioner));

        let report = executor.run(3, user_records(7)).await;
        assert_eq!(report.workers, 3);
        assert_eq!(report.attempted, 7);
        assert_eq!(report.succeeded, 7);
        assert!(report.failed.is_empty());
        assert_eq!(provisioner.total_attempts(), 7);
    }

    #[tokio::test]
    async fn test_failures_collected() {
        let provisioner = Arc::new(ScriptedProvisioner::new().always_failing(&["u3", "u7"]));
        let executor = BatchExecutor::new(Arc::clone(&provisioner));

        let report = executor.run(4, user_records(10)).await;
        assert_eq!(report.succeeded, 8);
        assert_eq!(sorted(report.failed_names()), vec!["u3", "u7"]);
        assert_eq!(report.crashed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_worker_bound_respected() {
        let provisioner = Arc::new(ScriptedProvisioner::new());
        let executor = BatchExecutor::new(Arc::clone(&provisioner));

        executor.run(3, user_records(20)).await;
        assert!(provisioner.peak() <= 3);
        assert!(provisioner.peak() >= 1);

        provisioner.reset_peak();
        executor.run(1, user_records(5)).await;
        assert_eq!(provisioner.peak(), 1);
    }

    #[tokio::test]
    async fn test_zero_workers_still_runs() {
        let provisioner = Arc::new(ScriptedProvisioner::new());
        let executor = BatchExecutor::new(Arc::clone(&provisioner));

        let report = executor.run(0, user_records(2)).await;
        assert_eq!(report.workers, 1);
        assert_eq!(report.succeeded, 2);
    }

    #[tokio::test]
    async fn test_panicking_task_counted_as_crash() {
        let provisioner = Arc::new(ScriptedProvisioner::new().panicking(&["u1"]));
        let executor = BatchExecutor::new(Arc::clone(&provisioner));

        let report = executor.run(2, user_records(3)).await;
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed_names(), vec!["u1"]);
        assert_eq!(report.crashed, 1);
    }

    #[tokio::test]
    async fn test_explicit_names() {
        let provisioner = Arc::new(ScriptedProvisioner::new());
        let executor = BatchExecutor::new(Arc::clone(&provisioner));

        let report = executor.run(2, records(&["host9", "host42"])).await;
        assert_eq!(report.succeeded, 2);
        assert_eq!(provisioner.attempts("host9"), 1);
        assert_eq!(provisioner.attempts("host42"), 1);
        assert_eq!(provisioner.attempts("host0"), 0);
    }

    #[tokio::test]
    async fn test_empty_pass() {
        let executor = BatchExecutor::new(Arc::new(ScriptedProvisioner::new()));
        let report = executor.run(5, Vec::new()).await;
        assert_eq!(report.attempted, 0);
        assert!(report.failed.is_empty());
    }
}
