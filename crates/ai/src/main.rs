//! StudyMate MCP Server - AI interface for the study companion
//!
//! This binary provides an MCP (Model Context Protocol) server
//! for AI assistants to track progress, reminders and quizzes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use studymate_ai::{McpServer, McpServerConfig, ToolRouter, MCP_VERSION};
use studymate_storage::{StoreBackend, StoreConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studymate-ai")]
#[command(about = "StudyMate MCP Server - AI interface for learning progress", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage path for StudyMate data
    #[arg(short, long, default_value = ".studymate", global = true)]
    store: std::path::PathBuf,

    /// Storage backend (memory, json, sqlite)
    #[arg(short, long, default_value = "json", global = true)]
    backend: StoreBackend,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP Server in stdio mode
    Stdio,

    /// List available tools
    ListTools,

    /// Print server info
    Info,
}

fn init_logging() {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = McpServerConfig {
        store: StoreConfig {
            backend: cli.backend,
            path: cli.store,
        },
        ..Default::default()
    };

    match cli.command {
        Commands::Stdio => {
            info!("Starting StudyMate MCP Server (stdio mode)");
            let server = McpServer::with_config(config).await?;
            server.start().await?;
        }

        Commands::ListTools => {
            let tools = ToolRouter::definitions();
            println!("Available tools ({}):", tools.len());
            for tool in tools {
                println!("  - {}: {}", tool.name, tool.description);
            }
        }

        Commands::Info => {
            println!("StudyMate MCP Server v{}", config.version);
            println!("Protocol: MCP {}", MCP_VERSION);
            println!("Transport: stdio");
            println!("Store: {} at {}", config.store.backend, config.store.path.display());
            println!("Tools: {}", ToolRouter::definitions().len());
        }
    }

    Ok(())
}
