//! Diagnostic command handlers

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tokio_util::sync::CancellationToken;

use acm_client::AcmClient;
use acm_core::domain::job::{AggregationResult, JobKind};
use acm_core::dto::job::CreateDiagnosticJob;

use super::job::{
    cancel_jobs, fetch_job, list_jobs, new_job_name, print_job_details, print_job_summary,
};
use super::{ListArgs, NodeSelection};
use crate::config::Config;

/// Diagnostic subcommands
#[derive(Subcommand)]
pub enum DiagCommands {
    /// List diagnostic jobs
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show a diagnostic job and its aggregated result
    Show {
        /// Job ID
        id: i64,

        /// Wait until the job is over
        #[arg(long)]
        wait: bool,
    },
    /// Create an MPI ping-pong diagnostic job
    New {
        #[command(flatten)]
        nodes: NodeSelection,
    },
    /// Cancel diagnostic jobs
    Cancel {
        /// Job IDs
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

/// Handle diagnostic commands
pub async fn handle_diag_command(
    command: DiagCommands,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = Arc::new(AcmClient::new(config.host.as_str()));

    match command {
        DiagCommands::List { list } => list_jobs(&client, JobKind::Diagnostics, &list).await,
        DiagCommands::Show { id, wait } => {
            let job = fetch_job(&client, JobKind::Diagnostics, id, wait, config, cancel).await?;
            print_job_details(&job);
            println!();
            show_aggregation(&client, id).await
        }
        DiagCommands::New { nodes } => create_job(&client, nodes).await,
        DiagCommands::Cancel { ids } => cancel_jobs(&client, JobKind::Diagnostics, &ids).await,
    }
}

async fn create_job(client: &AcmClient, nodes: NodeSelection) -> Result<()> {
    let target_nodes = nodes.resolve(client).await?;
    let request = CreateDiagnosticJob::mpi_pingpong(new_job_name("Mpi Pingpong"), target_nodes);

    let job = client
        .create_diagnostic_job(&request)
        .await
        .context("Failed to create diagnostic job")?;

    println!("{}", "Created diagnostic job:".green().bold());
    println!();
    print_job_summary(&job);
    Ok(())
}

/// The aggregation result only exists once the job has been evaluated
async fn show_aggregation(client: &AcmClient, id: i64) -> Result<()> {
    match client.get_aggregation_result(id).await {
        Ok(result) => {
            print_aggregation(&result);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("{}", "Aggregation result is not ready yet.".yellow());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to fetch aggregation result of job {}", id)),
    }
}

fn print_aggregation(result: &AggregationResult) {
    for (title, nodes) in aggregation_groups(result) {
        let heading = format!("{} ({}):", title, nodes.len());
        if title == "Good nodes" {
            println!("{}", heading.green().bold());
        } else {
            println!("{}", heading.red().bold());
        }
        for node in nodes {
            println!("  {}", node);
        }
    }
}

/// Sorted node groups present in the result
fn aggregation_groups(result: &AggregationResult) -> Vec<(&'static str, Vec<&str>)> {
    let groups = [
        ("Good nodes", result.good_nodes.as_ref()),
        ("Bad nodes", result.bad_nodes.as_ref()),
    ];

    groups
        .into_iter()
        .filter_map(|(title, nodes)| {
            let mut names: Vec<&str> = nodes?.iter().map(String::as_str).collect();
            names.sort_unstable();
            Some((title, names))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_groups_sorted_and_skips_missing() {
        let result = AggregationResult::from_value(serde_json::json!(
            r#"{"GoodNodes": ["n3", "n1"], "BadNodes": null}"#
        ))
        .unwrap();

        let groups = aggregation_groups(&result);
        assert_eq!(groups, vec![("Good nodes", vec!["n1", "n3"])]);
    }

    #[test]
    fn test_aggregation_groups_keeps_empty_lists() {
        let result = AggregationResult {
            good_nodes: Some(vec![]),
            bad_nodes: Some(vec!["b".to_string()]),
        };

        let groups = aggregation_groups(&result);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].1.is_empty());
        assert_eq!(groups[1], ("Bad nodes", vec!["b"]));
    }
}
