//! Clusrun command handlers
//!
//! A clusrun job runs one command line on many nodes. Showing a finished
//! job lists its tasks; each task's result (and with `--output`, its full
//! output) is fetched by one operation, and all of them are driven together
//! so a line is printed as soon as any task is ready.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tokio_util::sync::CancellationToken;

use acm_client::AcmClient;
use acm_core::domain::job::{Job, JobKind};
use acm_core::domain::task::{Task, TaskState};
use acm_core::dto::job::CreateClusrunJob;
use acm_ops::{
    LogProgress, MissingPolicy, NoProgress, Outcome, Progress, Scheduler, TaskKey, TaskOperation,
    TaskOutput, TerminalProgress, WaitSummary,
};

use super::job::{
    cancel_jobs, fetch_job, list_jobs, new_job_name, print_job_details, print_job_summary,
};
use super::{ListArgs, NodeSelection};
use crate::config::Config;

/// Clusrun subcommands
#[derive(Subcommand)]
pub enum ClusCommands {
    /// List clusrun jobs
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show a clusrun job and, once it is over, its tasks
    Show {
        /// Job ID
        id: i64,

        /// Wait until the job is over
        #[arg(long)]
        wait: bool,

        /// Print each task's full output
        #[arg(long)]
        output: bool,
    },
    /// Create a clusrun job
    New {
        #[command(flatten)]
        nodes: NodeSelection,

        /// Command line to run on the nodes
        #[arg(long = "command", value_name = "CMD")]
        command_line: String,
    },
    /// Cancel clusrun jobs
    Cancel {
        /// Job IDs
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

/// Handle clusrun commands
pub async fn handle_clus_command(
    command: ClusCommands,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = Arc::new(AcmClient::new(config.host.as_str()));

    match command {
        ClusCommands::List { list } => list_jobs(&client, JobKind::Clusrun, &list).await,
        ClusCommands::Show { id, wait, output } => {
            let job = fetch_job(&client, JobKind::Clusrun, id, wait, config, cancel).await?;
            print_job_details(&job);

            if job.state.is_terminal() {
                println!();
                list_tasks(&client, &job, output, config, cancel).await?;
            }
            Ok(())
        }
        ClusCommands::New {
            nodes,
            command_line,
        } => create_job(&client, nodes, command_line).await,
        ClusCommands::Cancel { ids } => cancel_jobs(&client, JobKind::Clusrun, &ids).await,
    }
}

async fn create_job(client: &AcmClient, nodes: NodeSelection, command_line: String) -> Result<()> {
    let target_nodes = nodes.resolve(client).await?;
    let request = CreateClusrunJob {
        name: new_job_name("Command"),
        target_nodes,
        command_line,
    };

    let job = client
        .create_clusrun_job(&request)
        .await
        .context("Failed to create clusrun job")?;

    println!("{}", "Created clusrun job:".green().bold());
    println!();
    print_job_summary(&job);
    Ok(())
}

/// Lookup policy for one task's result record
///
/// Queued tasks never ran and have nothing to look up. Tasks that ran to an
/// end will get a record, so a 404 is retried per configuration. Anything
/// else (canceled mid-run, unknown) is asked once.
fn task_lookup(job_id: i64, task: &Task, config: &Config) -> (Option<TaskKey>, MissingPolicy) {
    match task.state {
        TaskState::Queued => (None, MissingPolicy::Fail),
        state if state.is_complete() => {
            (Some(TaskKey::clusrun(job_id, task.id)), config.missing_policy())
        }
        _ => (Some(TaskKey::clusrun(job_id, task.id)), MissingPolicy::Fail),
    }
}

async fn list_tasks(
    client: &Arc<AcmClient>,
    job: &Job,
    with_output: bool,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let tasks = client
        .list_tasks(JobKind::Clusrun, job.id)
        .await
        .with_context(|| format!("Failed to list tasks of job {}", job.id))?;

    if tasks.is_empty() {
        println!("{}", "No tasks found.".yellow());
        return Ok(());
    }

    let operations: Vec<_> = tasks
        .iter()
        .map(|task| {
            let (key, policy) = task_lookup(job.id, task, config);
            if with_output {
                TaskOperation::output(Arc::clone(client), key, policy, config.page_size)
            } else {
                TaskOperation::result(Arc::clone(client), key, policy)
            }
        })
        .collect();

    let mode = ProgressMode::choose(config.show_progress, std::io::stderr().is_terminal());
    let live_counter = mode == ProgressMode::Counter;
    let progress: Box<dyn Progress> = match mode {
        ProgressMode::Counter => Box::new(TerminalProgress::new("tasks", tasks.len() as u64)),
        ProgressMode::Log => Box::new(LogProgress::new("tasks", tasks.len() as u64)),
        ProgressMode::Off => Box::new(NoProgress),
    };

    println!(
        "{}",
        format!("Tasks of job {} ({}):", job.id, tasks.len()).bold()
    );

    let mut scheduler = Scheduler::new(config.scheduler_config())
        .with_progress(progress)
        .with_cancellation(cancel.clone());
    let summary = scheduler
        .wait_each(operations, |index, outcome| {
            if live_counter {
                clear_counter_line();
            }
            print_task(client, &tasks[index], &outcome);
        })
        .await;

    ensure_finished(&summary)
}

/// How task progress is reported while waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressMode {
    /// Live counter on the terminal
    Counter,
    /// Progress lines through the log
    Log,
    Off,
}

impl ProgressMode {
    fn choose(show_progress: bool, stderr_is_terminal: bool) -> Self {
        match (show_progress, stderr_is_terminal) {
            (false, _) => ProgressMode::Off,
            (true, true) => ProgressMode::Counter,
            (true, false) => ProgressMode::Log,
        }
    }
}

/// A cancelled wait is an error, after saying how far it got
fn ensure_finished(summary: &WaitSummary) -> Result<()> {
    if summary.cancelled {
        println!(
            "{}",
            format!(
                "Stopped after {} of {} task(s).",
                summary.completed, summary.total
            )
            .yellow()
        );
        anyhow::bail!(
            "Cancelled after {} of {} task(s)",
            summary.completed,
            summary.total
        );
    }
    Ok(())
}

/// Erase the progress counter so a task line can take its place
fn clear_counter_line() {
    eprint!("\r\x1b[2K");
}

fn print_task(client: &AcmClient, task: &Task, outcome: &Outcome<TaskOutput>) {
    println!(
        "  {} Task {} on {}  {}  {}",
        "▸".cyan(),
        task.id.to_string().bold(),
        task.node,
        colorize_task_state(task.state),
        task_detail(client, outcome)
    );

    if let Outcome::Value(TaskOutput {
        content: Some(content),
        ..
    }) = outcome
    {
        println!("{}", "─".repeat(80).dimmed());
        print!("{}", content);
        if !content.ends_with('\n') {
            println!();
        }
        println!("{}", "─".repeat(80).dimmed());
    }
}

/// Where to find a task's output, or why there is nothing to show
fn task_detail(client: &AcmClient, outcome: &Outcome<TaskOutput>) -> ColoredString {
    match outcome {
        Outcome::Value(output) => {
            let url = client.raw_output_url(&output.result.result_key);
            match output.result.exit_code {
                Some(code) => format!("exit {}  {}", code, url).normal(),
                None => url.normal(),
            }
        }
        Outcome::Absent => "(none)".dimmed(),
        Outcome::GaveUp { attempts } => format!("(gave up after {} attempts)", attempts).yellow(),
        Outcome::Failed(message) => format!("(failed: {})", message).red(),
    }
}

fn colorize_task_state(state: TaskState) -> ColoredString {
    let label = state.to_string();
    match state {
        TaskState::Queued | TaskState::Dispatching => label.yellow(),
        TaskState::Running => label.cyan(),
        TaskState::Finished => label.green(),
        TaskState::Failed => label.red(),
        TaskState::Canceled => label.dimmed(),
        TaskState::Unknown => label.normal(),
    }
}
