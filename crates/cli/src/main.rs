//! `xplore` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the API server.
//! - `migrate`: run pending database migrations.
//! - `validate`: check a roadmap JSON file and show its laid-out graph.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engine::layout::{compute_ranks, LayoutConfig};
use engine::GraphMode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "xplore",
    about = "Roadmap graph engine and tracking API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        #[arg(long, default_value_t = 10)]
        max_connections: u32,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Validate a roadmap JSON file (step array or generation envelope).
    Validate {
        /// Path to the roadmap JSON file.
        path: PathBuf,
        /// Print the full laid-out graph as JSON.
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Auto-layout spacing flags.
#[derive(Args)]
struct LayoutArgs {
    #[arg(long, default_value_t = 250.0)]
    node_width: f64,
    #[arg(long, default_value_t = 80.0)]
    node_height: f64,
    #[arg(long, default_value_t = 80.0)]
    rank_separation: f64,
    #[arg(long, default_value_t = 50.0)]
    node_separation: f64,
    #[arg(long, default_value_t = 8)]
    max_sweeps: usize,
}

impl From<LayoutArgs> for LayoutConfig {
    fn from(args: LayoutArgs) -> Self {
        LayoutConfig {
            node_width: args.node_width,
            node_height: args.node_height,
            rank_separation: args.rank_separation,
            node_separation: args.node_separation,
            max_sweeps: args.max_sweeps,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            bind,
            database_url,
            max_connections,
            layout,
        } => {
            info!("Starting API server on {bind}");
            let pool = db::pool::create_pool(&database_url, max_connections)
                .await
                .context("failed to connect to database")?;
            api::serve(&bind, pool, layout.into()).await?;
        }
        Command::Migrate { database_url } => {
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool)
                .await
                .context("migration failed")?;
            info!("Migrations applied successfully");
        }
        Command::Validate { path, json, layout } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read file {}", path.display()))?;

            let parsed = match engine::parse_roadmap(&content) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("❌ Validation failed: {e}");
                    std::process::exit(1);
                }
            };

            let graph = engine::assemble_graph(
                &parsed.steps,
                &Default::default(),
                &Default::default(),
                &layout.into(),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&graph)?);
                return Ok(());
            }

            let mode = match graph.mode {
                GraphMode::Dag => "dependency graph",
                GraphMode::Linear => "linear sequence",
            };
            println!("✅ Roadmap is valid: {} steps, {}.", graph.nodes.len(), mode);

            let ranks = compute_ranks(&graph.nodes, &graph.edges);
            for (node, rank) in graph.nodes.iter().zip(ranks) {
                println!(
                    "  [rank {rank}] {} {} @ ({}, {})",
                    node.id, node.step.title, node.position.x, node.position.y
                );
            }
            for edge in &graph.edges {
                println!("  {} -> {}", edge.source, edge.target);
            }
            if let Some(project) = parsed.suggested_project {
                println!("Suggested project: {}", project.title);
            }
        }
    }

    Ok(())
}
