//! Job handling shared by the clusrun and diagnostic commands
//!
//! Listing, waiting, cancelling and printing look the same for both job
//! kinds; only the columns that describe what a job runs differ.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use acm_client::AcmClient;
use acm_core::domain::job::{Job, JobKind, JobState};
use acm_ops::{JobWatch, MissingPolicy, Outcome, Scheduler, WaitOutcome};

use super::ListArgs;
use crate::config::Config;

/// List jobs of one kind
pub async fn list_jobs(client: &AcmClient, kind: JobKind, args: &ListArgs) -> Result<()> {
    let jobs = client
        .list_jobs(kind, &args.query())
        .await
        .with_context(|| format!("Failed to list {} jobs", kind))?;

    if jobs.is_empty() {
        println!("{}", format!("No {} jobs found.", kind).yellow());
    } else {
        println!(
            "{}",
            format!("Found {} {} job(s):", jobs.len(), kind).bold()
        );
        println!();
        for job in &jobs {
            print_job_summary(job);
        }
    }

    Ok(())
}

/// Fetch a job, or with `wait` keep fetching until it is over
pub async fn fetch_job(
    client: &Arc<AcmClient>,
    kind: JobKind,
    id: i64,
    wait: bool,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Job> {
    if !wait {
        return client
            .get_job(kind, id)
            .await
            .with_context(|| format!("Failed to fetch {} job {}", kind, id));
    }

    let watch = JobWatch::new(Arc::clone(client), kind, id, MissingPolicy::Fail);
    let mut scheduler = Scheduler::new(config.scheduler_config()).with_cancellation(cancel.clone());

    println!("{}", format!("Waiting for {} job {}...", kind, id).dimmed());
    let outcome = match scheduler.wait_all(vec![watch]).await {
        WaitOutcome::Complete { results, summary } => {
            debug!(passes = summary.passes, "job wait finished");
            results.into_iter().next()
        }
        WaitOutcome::Cancelled { .. } => {
            return Err(anyhow!("Stopped waiting for {} job {}", kind, id));
        }
    };

    match outcome {
        Some(Outcome::Value(job)) => Ok(job),
        Some(Outcome::Absent) => Err(anyhow!("{} job {} not found", kind, id)),
        Some(Outcome::GaveUp { attempts }) => Err(anyhow!(
            "Gave up on {} job {} after {} attempts",
            kind,
            id,
            attempts
        )),
        Some(Outcome::Failed(message)) => Err(anyhow!(
            "Failed to fetch {} job {}: {}",
            kind,
            id,
            message
        )),
        None => Err(anyhow!("No result for {} job {}", kind, id)),
    }
}

/// Cancel each job in turn; a failure is reported and the rest still go
pub async fn cancel_jobs(client: &AcmClient, kind: JobKind, ids: &[i64]) -> Result<()> {
    let mut failed = 0;

    for &id in ids {
        match client.cancel_job(kind, id).await {
            Ok(()) => println!("{} Job {} is canceled.", "✓".green(), id),
            Err(e) => {
                failed += 1;
                println!("{} Failed to cancel job {}: {}", "✗".red(), id, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} job(s) could not be canceled", failed, ids.len());
    }
    Ok(())
}

/// Name given to jobs created from the CLI
pub fn new_job_name(prefix: &str) -> String {
    format!("{}@{}", prefix, Utc::now().format("%Y-%m-%dT%H:%M:%S"))
}

/// Print a job summary
pub fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().bold());
    println!("    {:<12} {}", "Name:", job.name.as_deref().unwrap_or("-"));
    if let Some(command) = &job.command_line {
        println!("    {:<12} {}", "Command:", shorten(command, 60));
    }
    println!("    {:<12} {}", "State:", colorize_state(job.state));
    println!("    {:<12} {}", "Nodes:", job.target_nodes.len());
    if let Some(created) = job.created_at {
        println!(
            "    {:<12} {}",
            "Created:",
            created.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!();
}

/// Print detailed job information
pub fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Name:        {}", job.name.as_deref().unwrap_or("-"));
    println!("  State:       {}", colorize_state(job.state));

    if let Some(progress) = job.progress {
        println!("  Progress:    {}", progress);
    }

    if let Some(command) = &job.command_line {
        println!("  Command:     {}", command);
    }

    if let Some(test) = &job.diagnostic_test {
        println!("  Test:        {}/{}", test.category, test.name);
    }

    if let Some(created) = job.created_at {
        println!("  Created:     {}", created.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(updated) = job.updated_at {
        println!("  Updated:     {}", updated.format("%Y-%m-%d %H:%M:%S"));
        if let Some(created) = job.created_at {
            let seconds = updated.signed_duration_since(created).num_seconds();
            println!("  Duration:    {}s", seconds);
        }
    }

    println!(
        "\n{}",
        format!("Target nodes ({}):", job.target_nodes.len()).bold()
    );
    for node in &job.target_nodes {
        println!("  {}", node);
    }
}

/// Colorize job state for display
pub fn colorize_state(state: JobState) -> ColoredString {
    let label = state.to_string();
    match state {
        JobState::Queued => label.yellow(),
        JobState::Running | JobState::Finishing => label.cyan(),
        JobState::Finished => label.green(),
        JobState::Failed => label.red(),
        JobState::Canceling | JobState::Canceled => label.dimmed(),
        JobState::Unknown => label.normal(),
    }
}

/// Cut `text` to at most `limit` characters, marking the cut
pub fn shorten(text: &str, limit: usize) -> String {
    const TRAIL: &str = " ...";

    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(TRAIL.len());
    let mut short: String = text.chars().take(keep).collect();
    short.push_str(TRAIL);
    short
}
