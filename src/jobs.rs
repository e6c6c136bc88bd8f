use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::JobsConfig;
use crate::error::Result;
use crate::job::{Job, JobRequest, JobStatus};
use crate::workflow::Pipeline;

/// Accepts translation requests, returns a job id immediately, and runs jobs
/// on a bounded worker pool. Status is held in memory for polling; artifacts
/// live under the job-id–scoped directory on disk.
pub struct JobManager {
    pipeline: Arc<Pipeline>,
    output_root: PathBuf,
    statuses: Arc<RwLock<HashMap<Uuid, JobStatus>>>,
    permits: Arc<Semaphore>,
}

impl JobManager {
    pub fn new(pipeline: Pipeline, config: &JobsConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            output_root: config.output_root.clone(),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
        }
    }

    /// Validate and accept a request. Returns the job id without waiting for
    /// any pipeline work; invalid requests are rejected here, before a job
    /// entry or directory exists.
    pub async fn submit(&self, request: JobRequest) -> Result<Uuid> {
        request.validate()?;

        let job = Job::new(request, &self.output_root);
        let id = job.id;

        self.statuses.write().await.insert(id, JobStatus::Queued);
        info!("Accepted job {} for {}", id, job.request.source_url);

        let pipeline = self.pipeline.clone();
        let statuses = self.statuses.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    statuses.write().await.insert(
                        id,
                        JobStatus::Failed {
                            error: "worker pool closed".to_string(),
                        },
                    );
                    return;
                }
            };

            statuses.write().await.insert(id, JobStatus::Running);

            match pipeline.run(&job).await {
                Ok(result) => {
                    info!("Job {} completed", id);
                    statuses.write().await.insert(id, JobStatus::Completed(result));
                }
                Err(e) => {
                    error!("Job {} failed: {}", id, e);
                    statuses.write().await.insert(
                        id,
                        JobStatus::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        });

        Ok(id)
    }

    /// Current status of a job, or None for an unknown id.
    pub async fn status(&self, id: &Uuid) -> Option<JobStatus> {
        self.statuses.read().await.get(id).cloned()
    }

    /// The on-disk directory owned by a job id.
    pub fn job_dir(&self, id: &Uuid) -> PathBuf {
        self.output_root.join(id.to_string())
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}
