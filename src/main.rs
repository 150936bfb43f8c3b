use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mnemo::{config, server};

#[derive(Parser)]
#[command(name = "mnemo", version, about = "Semantic memory MCP server for AI agents")]
struct Cli {
    /// Path to a config file (default: ~/.mnemo/config.toml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Start the HTTP server (REST API + MCP Streamable HTTP)
    Http {
        /// Override the listen port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::MnemoConfig::load_from(path)?,
        None => config::MnemoConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve_stdio(config).await?;
        }
        Command::Http { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve_http(config).await?;
        }
    }

    Ok(())
}
