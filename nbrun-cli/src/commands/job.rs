//! Job command handlers
//!
//! Launching notebooks, showing job status, and following a job to the end.

use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;
use nbrun_client::{ClientError, NbrunClient};
use nbrun_core::domain::job::JobStatus;
use nbrun_core::dto::job::JobStatusResponse;
use uuid::Uuid;

/// Launch a notebook, optionally waiting for it to finish
pub async fn launch(client: &NbrunClient, name: &str, wait: Option<Duration>) -> Result<()> {
    let job_id = match client.launch(name).await {
        Ok(job_id) => job_id,
        Err(e) if e.is_forbidden() => {
            anyhow::bail!("{} is not on the server's list of allowed notebooks", name)
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to launch {}", name)),
    };

    println!("{} Launched {}", "✓".green(), name.bold());
    println!("  Job ID: {}", job_id.to_string().cyan());

    if let Some(interval) = wait {
        println!();
        follow(client, job_id, interval).await?;
    }

    Ok(())
}

/// Show a job by id, or the latest job for a notebook
pub async fn status(
    client: &NbrunClient,
    id: Option<&str>,
    name: Option<&str>,
    json: bool,
) -> Result<()> {
    let job = match (id, name) {
        (Some(id), _) => client
            .status(parse_job_id(id)?)
            .await
            .map_err(|e| lookup_error(e, &format!("Job {}", id)))?,
        (None, Some(name)) => client
            .latest_for_task(name)
            .await
            .map_err(|e| lookup_error(e, &format!("Notebook {}", name)))?,
        (None, None) => anyhow::bail!("Provide --id or --name"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_job_details(&job);
    }

    Ok(())
}

/// Follow a job until it finishes
pub async fn watch(client: &NbrunClient, id: &str, interval: Duration) -> Result<()> {
    follow(client, parse_job_id(id)?, interval).await
}

async fn follow(client: &NbrunClient, job_id: Uuid, interval: Duration) -> Result<()> {
    let mut last_seen: Option<(JobStatus, String)> = None;

    let job = client
        .wait_for_completion(job_id, interval, |job| {
            let current = (job.status, job.message.clone());
            if last_seen.as_ref() != Some(&current) {
                print_progress_line(job);
                last_seen = Some(current);
            }
        })
        .await?;

    println!();
    print_job_details(&job);

    if job.status == JobStatus::Error {
        anyhow::bail!("Job {} failed", job_id);
    }

    Ok(())
}

/// Turn a 404 into a readable message; other errors keep their context
fn lookup_error(err: ClientError, target: &str) -> anyhow::Error {
    if err.is_not_found() {
        anyhow::anyhow!("{} has no jobs on the server", target)
    } else {
        anyhow::Error::new(err).context(format!("Failed to get status for {}", target))
    }
}

fn parse_job_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("'{}' is not a valid job ID", id))
}

/// Print a one-line progress update
fn print_progress_line(job: &JobStatusResponse) {
    println!(
        "  {} {:>3}% {}",
        colorize_status(job.status),
        job.progress,
        first_line(&job.message).dimmed()
    );
}

/// Print detailed job information
fn print_job_details(job: &JobStatusResponse) {
    println!("{}", "Job Details:".bold());
    if let Some(id) = job.job_id {
        println!("  ID:        {}", id.to_string().cyan());
    }
    println!("  Notebook:  {}", job.name);
    println!("  Status:    {}", colorize_status(job.status));
    println!("  Progress:  {}%", job.progress);

    if let Some(started) = job.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = job.finished_at {
        println!("  Finished:  {}", finished.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.started_at {
            let seconds = finished.signed_duration_since(started).num_seconds();
            println!("  Duration:  {}", format_duration(seconds));
        }
    }

    if job.status == JobStatus::Error {
        println!("\n{}", "Error:".bold());
        println!("{}", job.message.red());
    } else {
        println!("  Message:   {}", job.message);
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        JobStatus::Pending => label.yellow(),
        JobStatus::Running => label.cyan(),
        JobStatus::Done => label.green(),
        JobStatus::Error => label.red(),
    }
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    match (seconds / 3600, (seconds % 3600) / 60, seconds % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, s) => format!("{}h {}m {}s", h, m, s),
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
