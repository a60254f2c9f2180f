use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use uuid::Uuid;

use image_reducer_core::{
    run_batch_with_cancel, BatchConfig, BatchOutcome, BatchSummary, CancelFlag, EncodingStrategy,
    FileResult, ProgressSink, ResultsLog,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    /// The input folder held no images.
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Snapshot of a batch job, as returned by `GET /batches/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub status: JobStatus,
    pub strategy: EncodingStrategy,
    pub current_file: Option<String>,
    pub progress: Progress,
    pub results: Vec<FileResult>,
    pub summary: Option<BatchSummary>,
    pub error: Option<String>,
}

impl JobState {
    fn new(strategy: EncodingStrategy) -> Self {
        Self {
            status: JobStatus::Running,
            strategy,
            current_file: None,
            progress: Progress::default(),
            results: Vec::new(),
            summary: None,
            error: None,
        }
    }

    fn finish(&mut self, outcome: Result<BatchOutcome, image_reducer_core::BatchError>) {
        self.current_file = None;
        match outcome {
            Ok(BatchOutcome::Completed(summary)) => {
                self.status = JobStatus::Completed;
                self.summary = Some(summary);
            }
            Ok(BatchOutcome::EmptyInput) => self.status = JobStatus::Empty,
            Err(e) => {
                self.status = JobStatus::Failed;
                self.error = Some(e.to_string());
            }
        }
    }
}

struct Job {
    state: JobState,
    cancel: CancelFlag,
}

/// Finished jobs kept around for polling before the oldest is dropped.
pub const DEFAULT_FINISHED_RETENTION: usize = 64;

#[derive(Default)]
struct Jobs {
    by_id: HashMap<Uuid, Job>,
    /// Ids of jobs that are no longer running, oldest first.
    finished: VecDeque<Uuid>,
}

/// What `DELETE /batches/{id}` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The job is still running; it stops before its next file.
    Cancelling,
    /// The job had finished and is gone from the registry.
    Removed,
}

/// All batch jobs started by this server process. Running jobs are always
/// kept; finished ones are dropped once more than `retention` pile up.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<Mutex<Jobs>>,
    retention: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_FINISHED_RETENTION)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Jobs::default())),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Jobs> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a job and run it on the blocking pool. Returns immediately.
    pub fn start(&self, config: BatchConfig) -> Uuid {
        let id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        self.lock().by_id.insert(
            id,
            Job {
                state: JobState::new(config.strategy),
                cancel: cancel.clone(),
            },
        );

        let sink = JobSink {
            registry: self.clone(),
            id,
        };
        tokio::task::spawn_blocking(move || {
            log::info!("Job {} started for {}", id, config.input_folder.display());
            let outcome = run_batch_with_cancel(&config, &sink, &sink, &cancel);
            if let Err(e) = &outcome {
                log::error!("Job {} failed: {}", id, e);
            }
            sink.registry.complete(id, outcome);
            log::info!("Job {} finished", id);
        });

        id
    }

    /// Record the outcome and evict the oldest finished jobs over retention.
    fn complete(&self, id: Uuid, outcome: Result<BatchOutcome, image_reducer_core::BatchError>) {
        let mut guard = self.lock();
        let jobs = &mut *guard;
        let Some(job) = jobs.by_id.get_mut(&id) else {
            return;
        };
        job.state.finish(outcome);
        jobs.finished.push_back(id);

        while jobs.finished.len() > self.retention {
            match jobs.finished.pop_front() {
                Some(old) => {
                    log::debug!("Evicting finished job {}", old);
                    jobs.by_id.remove(&old);
                }
                None => break,
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<JobState> {
        self.lock().by_id.get(&id).map(|job| job.state.clone())
    }

    /// Cancel a running job, or forget a finished one. `None` for unknown ids.
    pub fn cancel(&self, id: Uuid) -> Option<Removal> {
        let mut jobs = self.lock();
        let job = jobs.by_id.get(&id)?;
        if job.state.status == JobStatus::Running {
            job.cancel.cancel();
            return Some(Removal::Cancelling);
        }

        jobs.by_id.remove(&id);
        jobs.finished.retain(|f| *f != id);
        Some(Removal::Removed)
    }

    /// Number of jobs currently held, running or not.
    pub fn job_count(&self) -> usize {
        self.lock().by_id.len()
    }
}

/// Sink that writes straight into the job's state.
struct JobSink {
    registry: JobRegistry,
    id: Uuid,
}

impl JobSink {
    fn update(&self, f: impl FnOnce(&mut JobState)) {
        if let Some(job) = self.registry.lock().by_id.get_mut(&self.id) {
            f(&mut job.state);
        }
    }
}

impl ProgressSink for JobSink {
    fn processing(&self, filename: &str) {
        self.update(|state| state.current_file = Some(filename.to_string()));
    }

    fn progress(&self, current: usize, total: usize) {
        self.update(|state| state.progress = Progress { current, total });
    }
}

impl ResultsLog for JobSink {
    fn record(&self, result: &FileResult) {
        self.update(|state| state.results.push(result.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_until_finished(registry: &JobRegistry, id: Uuid) {
        for _ in 0..200 {
            match registry.get(id) {
                Some(state) if state.status == JobStatus::Running => {
                    tokio::time::sleep(Duration::from_millis(20)).await
                }
                _ => return,
            }
        }
        panic!("job {id} never finished");
    }

    fn empty_job_config(dir: &std::path::Path) -> BatchConfig {
        BatchConfig::new(dir, dir.join("out"), EncodingStrategy::Lossless)
    }

    #[tokio::test]
    async fn test_oldest_finished_job_is_evicted() {
        let input = tempfile::tempdir().unwrap();
        let registry = JobRegistry::with_retention(2);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let id = registry.start(empty_job_config(input.path()));
            wait_until_finished(&registry, id).await;
            ids.push(id);
        }

        assert_eq!(registry.job_count(), 2);
        assert!(registry.get(ids[0]).is_none());
        assert_eq!(registry.get(ids[1]).unwrap().status, JobStatus::Empty);
        assert_eq!(registry.get(ids[2]).unwrap().status, JobStatus::Empty);
    }

    #[tokio::test]
    async fn test_delete_forgets_finished_job() {
        let input = tempfile::tempdir().unwrap();
        let registry = JobRegistry::new();

        let id = registry.start(empty_job_config(input.path()));
        wait_until_finished(&registry, id).await;

        assert_eq!(registry.cancel(id), Some(Removal::Removed));
        assert!(registry.get(id).is_none());
        assert_eq!(registry.job_count(), 0);
        assert_eq!(registry.cancel(id), None);
    }

    #[test]
    fn test_running_job_is_only_flagged() {
        let registry = JobRegistry::new();
        let id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        registry.lock().by_id.insert(
            id,
            Job {
                state: JobState::new(EncodingStrategy::Lossless),
                cancel: cancel.clone(),
            },
        );

        assert_eq!(registry.cancel(id), Some(Removal::Cancelling));
        assert!(cancel.is_cancelled());
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Running);
    }
}
