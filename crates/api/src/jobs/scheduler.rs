//! Periodic background jobs.
//!
//! Each registered job runs on its own task with a fixed period. A job decides
//! whether its first run happens at start or one period later; the adherence
//! tick waits because the monitoring session evaluates once by hand when it
//! starts.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// When a job first runs after the scheduler starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRun {
    /// Run as soon as the scheduler starts.
    Immediately,
    /// Wait one full period.
    AfterPeriod,
}

#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    /// Time between runs. A slow run delays the following ones.
    fn period(&self) -> Duration;

    fn first_run(&self) -> FirstRun {
        FirstRun::AfterPeriod
    }

    async fn execute(&self) -> anyhow::Result<()>;
}

/// Runs registered jobs until shut down.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    stop: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            stop,
            tasks: JoinSet::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawns one task per registered job. Jobs registered later are not started.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");
        for job in self.jobs.drain(..) {
            self.tasks.spawn(run_job(job, self.stop.subscribe()));
        }
    }

    /// Signals every job to stop after its current run.
    pub fn shutdown(&self) {
        self.stop.send_replace(true);
    }

    /// Waits for stopped jobs, abandoning any still running after `timeout`.
    pub async fn wait_for_shutdown(mut self, timeout: Duration) {
        let drained = tokio::time::timeout(timeout, async {
            while let Some(joined) = self.tasks.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "Job task panicked");
                }
            }
        })
        .await;

        match drained {
            Ok(()) => info!("Job scheduler stopped"),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Job shutdown timed out");
                self.tasks.abort_all();
            }
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_job(job: Arc<dyn Job>, mut stop: watch::Receiver<bool>) {
    let name = job.name();
    let period = job.period();
    let first_run = job.first_run();
    let first_at = match first_run {
        FirstRun::Immediately => Instant::now(),
        FirstRun::AfterPeriod => Instant::now() + period,
    };
    let mut interval = tokio::time::interval_at(first_at, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(job = name, period_ms = period.as_millis() as u64, ?first_run, "Job scheduled");

    while !*stop.borrow_and_update() {
        tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => run_once(job.as_ref()).await,
        }
    }
    debug!(job = name, "Job stopped");
}

async fn run_once(job: &dyn Job) {
    let name = job.name();
    let started = std::time::Instant::now();
    let result = job.execute().await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            debug!(job = name, elapsed_ms, "Job run completed");
            counter!("job_runs_total", "job" => name, "result" => "ok").increment(1);
        }
        Err(e) => {
            error!(job = name, elapsed_ms, error = %e, "Job run failed");
            counter!("job_runs_total", "job" => name, "result" => "error").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
        first_run: FirstRun,
        fail: bool,
    }

    impl CountingJob {
        fn new(first_run: FirstRun) -> (Self, Arc<AtomicUsize>) {
            let runs = Arc::new(AtomicUsize::new(0));
            let job = Self {
                runs: Arc::clone(&runs),
                first_run,
                fail: false,
            };
            (job, runs)
        }
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn period(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn first_run(&self) -> FirstRun {
            self.first_run
        }

        async fn execute(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("sink unreachable");
            }
            Ok(())
        }
    }

    async fn run_for(job: CountingJob, elapsed: Duration) {
        let mut scheduler = JobScheduler::new();
        scheduler.register(job);
        scheduler.start();
        tokio::time::sleep(elapsed).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_after_period_waits_for_first_run() {
        let (job, runs) = CountingJob::new(FirstRun::AfterPeriod);
        run_for(job, Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_immediately_runs_at_start() {
        let (job, runs) = CountingJob::new(FirstRun::Immediately);
        run_for(job, Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_job_keeps_its_schedule() {
        let (mut job, runs) = CountingJob::new(FirstRun::Immediately);
        job.fail = true;
        run_for(job, Duration::from_millis(1300)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_without_start_returns() {
        let (job, _) = CountingJob::new(FirstRun::Immediately);
        let mut scheduler = JobScheduler::default();
        scheduler.register(job);
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_millis(50)).await;
    }

    #[test]
    fn test_default_first_run_waits() {
        struct Quiet;

        #[async_trait::async_trait]
        impl Job for Quiet {
            fn name(&self) -> &'static str {
                "quiet"
            }

            fn period(&self) -> Duration {
                Duration::from_secs(60)
            }

            async fn execute(&self) -> anyhow::Result<()> {
                Ok(())
            }
        }

        assert_eq!(Quiet.first_run(), FirstRun::AfterPeriod);
    }
}
