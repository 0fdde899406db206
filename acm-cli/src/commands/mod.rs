//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod clus;
mod diag;
mod job;
mod node;

pub use clus::ClusCommands;
pub use diag::DiagCommands;
pub use node::NodeCommands;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;

use acm_client::AcmClient;
use acm_core::dto::ListQuery;

use crate::config::Config;
use crate::glob::filter_names;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Query cluster nodes
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },
    /// Query, create and cancel clusrun jobs
    Clus {
        #[command(subcommand)]
        command: ClusCommands,
    },
    /// Query, create and cancel diagnostic jobs
    Diag {
        #[command(subcommand)]
        command: DiagCommands,
    },
}

/// Handle a CLI command
///
/// `cancel` fires on Ctrl-C or when the configured timeout runs out; it
/// only interrupts commands that wait on the service.
pub async fn handle_command(
    command: Commands,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Commands::Node { command } => node::handle_node_command(command, config).await,
        Commands::Clus { command } => clus::handle_clus_command(command, config, cancel).await,
        Commands::Diag { command } => diag::handle_diag_command(command, config, cancel).await,
    }
}

/// Paging flags shared by the job list commands
#[derive(Args)]
pub struct ListArgs {
    /// Number of jobs to query
    #[arg(long, default_value_t = 25)]
    count: u32,

    /// Job id after which (exclusive) to start
    #[arg(long)]
    last_id: Option<String>,

    /// List in ascending id order instead of newest first
    #[arg(long)]
    asc: bool,
}

impl ListArgs {
    pub fn query(&self) -> ListQuery {
        ListQuery {
            count: Some(self.count),
            last_id: self.last_id.clone(),
            reverse: Some(!self.asc),
        }
    }
}

/// Target nodes of a new job: explicit names or a name pattern
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct NodeSelection {
    /// Names of the target nodes
    #[arg(long, num_args = 1.., value_name = "NODE")]
    nodes: Vec<String>,

    /// Shell-style pattern (`*`, `?`, `[..]`) matched against node names
    #[arg(long, value_name = "GLOB")]
    pattern: Option<String>,
}

/// Enough to cover every node of a cluster in one page
const ALL_NODES: u32 = 1_000_000;

impl NodeSelection {
    /// Resolve the selection to concrete node names
    pub async fn resolve(self, client: &AcmClient) -> Result<Vec<String>> {
        let Some(pattern) = self.pattern else {
            return Ok(self.nodes);
        };

        let nodes = client
            .list_nodes(&ListQuery::first(ALL_NODES))
            .await
            .context("Failed to fetch nodes for pattern matching")?;
        let names = filter_names(nodes.iter().map(|n| n.name.as_str()), &pattern);

        if names.is_empty() {
            anyhow::bail!("No node name matches pattern '{}'", pattern);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        nodes: NodeSelection,
        #[command(flatten)]
        list: ListArgs,
    }

    #[test]
    fn test_list_args_default_to_newest_first() {
        let cli = TestCli::parse_from(["test", "--nodes", "n1"]);
        let query = cli.list.query();
        assert_eq!(query.count, Some(25));
        assert_eq!(query.reverse, Some(true));
        assert_eq!(query.last_id, None);

        let cli = TestCli::parse_from(["test", "--pattern", "n*", "--asc", "--last-id", "7"]);
        let query = cli.list.query();
        assert_eq!(query.reverse, Some(false));
        assert_eq!(query.last_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_node_selection_needs_exactly_one_source() {
        assert!(TestCli::try_parse_from(["test"]).is_err());
        assert!(TestCli::try_parse_from(["test", "--nodes", "a", "--pattern", "b*"]).is_err());

        let cli = TestCli::parse_from(["test", "--nodes", "a", "b"]);
        assert_eq!(cli.nodes.nodes, vec!["a".to_string(), "b".to_string()]);
        assert!(cli.nodes.pattern.is_none());
    }

    #[tokio::test]
    async fn test_explicit_nodes_skip_the_service() {
        let cli = TestCli::parse_from(["test", "--nodes", "a", "b"]);
        // nothing listens here; resolving must not touch the network
        let client = AcmClient::new("http://127.0.0.1:9");
        let names = cli.nodes.resolve(&client).await.unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
