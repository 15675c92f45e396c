//! Job-related API endpoints

use std::time::Duration;

use nbrun_core::dto::job::{JobStatusResponse, LaunchJob, LaunchedJob};
use tracing::debug;
use uuid::Uuid;

use crate::NbrunClient;
use crate::error::Result;

impl NbrunClient {
    /// Launch a notebook in the background
    ///
    /// # Returns
    /// The id of the new job
    pub async fn launch(&self, name: &str) -> Result<Uuid> {
        let url = format!("{}/api/run_notebook", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LaunchJob {
                name: Some(name.to_string()),
            })
            .send()
            .await?;

        let launched: LaunchedJob = self.handle_response(response).await?;
        Ok(launched.job_id)
    }

    /// Get the status of a job
    pub async fn status(&self, job_id: Uuid) -> Result<JobStatusResponse> {
        let url = format!("{}/api/notebook_status", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("job_id", job_id.to_string())])
            .send()
            .await?;

        let mut status: JobStatusResponse = self.handle_response(response).await?;
        status.job_id.get_or_insert(job_id);
        Ok(status)
    }

    /// Get the most recently started job for a notebook
    pub async fn latest_for_task(&self, name: &str) -> Result<JobStatusResponse> {
        let url = format!("{}/api/notebook_status", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Poll a job until it reaches a terminal state
    ///
    /// `on_update` is called with every status seen, including the last one.
    pub async fn wait_for_completion<F>(
        &self,
        job_id: Uuid,
        poll_interval: Duration,
        mut on_update: F,
    ) -> Result<JobStatusResponse>
    where
        F: FnMut(&JobStatusResponse),
    {
        loop {
            let status = self.status(job_id).await?;
            on_update(&status);

            if status.status.is_terminal() {
                return Ok(status);
            }

            debug!(
                "Job {} is {} ({}%), polling again in {:?}",
                job_id, status.status, status.progress, poll_interval
            );
            tokio::time::sleep(poll_interval).await;
        }
    }
}
