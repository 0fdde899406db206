//! Node command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use acm_client::AcmClient;
use acm_core::domain::node::{Node, NodeHealth, NodeState};
use acm_core::dto::ListQuery;

use super::job::shorten;
use crate::config::Config;

/// Node subcommands
#[derive(Subcommand)]
pub enum NodeCommands {
    /// List nodes
    List {
        /// Number of nodes to query
        #[arg(long, default_value_t = 25)]
        count: u32,

        /// Node id after which (exclusive) to start
        #[arg(long)]
        last_id: Option<String>,
    },
    /// Show a node
    Show {
        /// Node ID
        id: String,
    },
}

/// Handle node commands
pub async fn handle_node_command(command: NodeCommands, config: &Config) -> Result<()> {
    let client = AcmClient::new(config.host.as_str());

    match command {
        NodeCommands::List { count, last_id } => {
            let query = ListQuery {
                count: Some(count),
                last_id,
                reverse: None,
            };
            list_nodes(&client, &query).await
        }
        NodeCommands::Show { id } => {
            let node = client
                .get_node(&id)
                .await
                .with_context(|| format!("Failed to fetch node {}", id))?;
            print_node_details(&node);
            Ok(())
        }
    }
}

async fn list_nodes(client: &AcmClient, query: &ListQuery) -> Result<()> {
    let nodes = client.list_nodes(query).await.context("Failed to list nodes")?;

    if nodes.is_empty() {
        println!("{}", "No nodes found.".yellow());
    } else {
        println!("{}", format!("Found {} node(s):", nodes.len()).bold());
        println!();
        for node in &nodes {
            print_node_summary(node);
        }
    }

    Ok(())
}

/// Print a node summary
fn print_node_summary(node: &Node) {
    println!("  {} Node {}", "▸".cyan(), node.name.bold());
    println!("    Health:       {}", colorize_health(node.health));
    println!("    State:        {}", colorize_state(node.state));
    println!("    Running Jobs: {}", node.running_job_count);
    if let Some(info) = &node.node_registration_info {
        println!(
            "    Hardware:     {} cores, {} MB",
            info.core_count, info.memory_megabytes
        );
        println!("    OS:           {}", shorten(&info.distro_info, 60).dimmed());
    }
    println!();
}

/// Print detailed node information
fn print_node_details(node: &Node) {
    println!("{}", "Node Details:".bold());
    println!("  ID:           {}", node.id.cyan());
    println!("  Name:         {}", node.name);
    println!("  Health:       {}", colorize_health(node.health));
    println!("  State:        {}", colorize_state(node.state));
    println!("  Running Jobs: {}", node.running_job_count);

    match &node.node_registration_info {
        Some(info) => {
            println!("  Cores:        {}", info.core_count);
            println!("  Memory:       {} MB", info.memory_megabytes);
            println!("  OS:           {}", info.distro_info);
        }
        None => println!("  {}", "Not registered yet".dimmed()),
    }
}

fn colorize_health(health: NodeHealth) -> ColoredString {
    let label = health.to_string();
    match health {
        NodeHealth::Ok => label.green(),
        NodeHealth::Warning => label.yellow(),
        NodeHealth::Error => label.red(),
        NodeHealth::Unknown => label.dimmed(),
    }
}

fn colorize_state(state: NodeState) -> ColoredString {
    let label = state.to_string();
    match state {
        NodeState::Online => label.green(),
        NodeState::Offline => label.red(),
        NodeState::Unknown => label.dimmed(),
    }
}
