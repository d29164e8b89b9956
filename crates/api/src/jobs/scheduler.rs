//! Job scheduler infrastructure for background tasks.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// When a job fires.
#[derive(Debug, Clone, Copy)]
pub enum JobSchedule {
    /// Run every fixed interval.
    Every(Duration),
    /// Run once a day at a fixed UTC wall-clock time.
    DailyAt { hour: u32, minute: u32 },
}

impl JobSchedule {
    /// Time to sleep from `now` until the next firing.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match self {
            JobSchedule::Every(interval) => *interval,
            JobSchedule::DailyAt { hour, minute } => {
                let today = now
                    .date_naive()
                    .and_hms_opt(*hour, *minute, 0)
                    .unwrap_or_else(|| now.date_naive().and_hms_opt(0, 0, 0).expect("midnight"))
                    .and_utc();
                let next = if today > now {
                    today
                } else {
                    today + ChronoDuration::days(1)
                };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

/// Last-run bookkeeping for one job, surfaced on the admin API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStatus {
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<String>,
    pub last_duration_ms: Option<u64>,
}

/// Shared job-name → status map.
pub type JobStatusMap = Arc<RwLock<HashMap<&'static str, JobStatus>>>;

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging and status reporting).
    fn name(&self) -> &'static str;

    /// When this job should run.
    fn schedule(&self) -> JobSchedule;

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;
}

/// Background job scheduler.
///
/// Each registered job gets its own task that sleeps until the next firing
/// and races the timer against a shutdown signal. Shutdown is graceful: an
/// in-flight run finishes, nothing further is scheduled.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
    statuses: JobStatusMap,
}

impl JobScheduler {
    /// Create a new job scheduler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a job with the scheduler.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Handle to the shared status map, for the admin API.
    pub fn status_handle(&self) -> JobStatusMap {
        Arc::clone(&self.statuses)
    }

    /// Start all registered jobs.
    pub fn start(&mut self) {
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_rx.clone();
            let statuses = Arc::clone(&self.statuses);

            let handle = tokio::spawn(async move {
                let name = job.name();
                let schedule = job.schedule();
                info!(job = name, schedule = ?schedule, "Job scheduled");

                loop {
                    let delay = schedule.next_delay(Utc::now());
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {
                            let started_at = Utc::now();
                            let start = std::time::Instant::now();
                            info!(job = name, "Job starting");

                            let outcome = match job.execute().await {
                                Ok(()) => {
                                    info!(
                                        job = name,
                                        elapsed_ms = start.elapsed().as_millis(),
                                        "Job completed successfully"
                                    );
                                    "ok".to_string()
                                }
                                Err(e) => {
                                    error!(
                                        job = name,
                                        elapsed_ms = start.elapsed().as_millis(),
                                        error = %e,
                                        "Job failed"
                                    );
                                    format!("failed: {}", e)
                                }
                            };

                            let mut map = statuses.write().await;
                            map.insert(name, JobStatus {
                                last_run_at: Some(started_at),
                                last_outcome: Some(outcome),
                                last_duration_ms: Some(start.elapsed().as_millis() as u64),
                            });
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!(job = name, "Job shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Initiate graceful shutdown of all jobs.
    /// Returns immediately after signaling shutdown.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all jobs to complete with timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let shutdown_future = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => info!("All jobs completed gracefully"),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestJob {
        run_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for TestJob {
        fn name(&self) -> &'static str {
            "test_job"
        }

        fn schedule(&self) -> JobSchedule {
            JobSchedule::Every(Duration::from_millis(50))
        }

        async fn execute(&self) -> Result<(), String> {
            self.run_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err("Test failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_every_schedule_delay() {
        let schedule = JobSchedule::Every(Duration::from_secs(30));
        assert_eq!(schedule.next_delay(Utc::now()), Duration::from_secs(30));
    }

    #[test]
    fn test_daily_at_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let schedule = JobSchedule::DailyAt { hour: 13, minute: 0 };
        assert_eq!(schedule.next_delay(now), Duration::from_secs(3 * 3600));
    }

    #[test]
    fn test_daily_at_wraps_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 1).unwrap();
        let schedule = JobSchedule::DailyAt { hour: 13, minute: 0 };
        let delay = schedule.next_delay(now);
        assert_eq!(delay, Duration::from_secs(24 * 3600 - 1));
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = JobScheduler::new();
        assert!(scheduler.jobs.is_empty());
        assert!(scheduler.handles.is_empty());
    }

    #[test]
    fn test_scheduler_register() {
        let mut scheduler = JobScheduler::new();
        scheduler.register(TestJob {
            run_count: Arc::new(AtomicUsize::new(0)),
            should_fail: false,
        });
        assert_eq!(scheduler.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_scheduler_records_status_and_shuts_down() {
        let mut scheduler = JobScheduler::new();
        let run_count = Arc::new(AtomicUsize::new(0));
        scheduler.register(TestJob {
            run_count: Arc::clone(&run_count),
            should_fail: false,
        });
        let statuses = scheduler.status_handle();
        scheduler.start();

        // Let it fire at least once.
        tokio::time::sleep(Duration::from_millis(200)).await;

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert!(run_count.load(Ordering::SeqCst) >= 1);
        let map = statuses.read().await;
        let status = map.get("test_job").expect("status recorded");
        assert_eq!(status.last_outcome.as_deref(), Some("ok"));
        assert!(status.last_run_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_job_outcome_is_recorded() {
        let mut scheduler = JobScheduler::new();
        scheduler.register(TestJob {
            run_count: Arc::new(AtomicUsize::new(0)),
            should_fail: true,
        });
        let statuses = scheduler.status_handle();
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        let map = statuses.read().await;
        let status = map.get("test_job").expect("status recorded");
        assert!(status
            .last_outcome
            .as_deref()
            .unwrap_or_default()
            .starts_with("failed"));
    }
}
