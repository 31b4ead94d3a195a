// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use bedrock_kb_mcp::utils::{format_success, init_logger};
use bedrock_kb_mcp::{
    Config, CredentialSource, KnowledgeBaseMcp, Retriever, S3Presigner, generate_presigned_url,
    mcp,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "bedrock_kb_mcp")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "MCP server for Bedrock Knowledge Base retrieval", long_about = None)]
struct Cli {
    /// Optional TOML file layered under the environment
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    StreamableHttp,
    Stdio,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server
    Serve {
        #[arg(long, value_enum, default_value_t = Transport::StreamableHttp)]
        transport: Transport,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one retrieve call and print what the MCP tool would return
    Retrieve {
        /// Search query text
        query: String,
    },

    /// Print a presigned link for an s3:// URI
    Presign { uri: String },

    /// Show the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);

    if let Some(path) = &cli.config {
        info!("Loading configuration from: {}", path.display());
    }
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve {
            transport,
            host,
            port,
        } => {
            cmd_serve(config, transport, host, port).await?;
        }
        Commands::Retrieve { query } => {
            cmd_retrieve(config, &query).await?;
        }
        Commands::Presign { uri } => {
            cmd_presign(&config, &uri).await?;
        }
        Commands::Config => {
            cmd_config(&config)?;
        }
    }

    Ok(())
}

async fn cmd_serve(
    config: Config,
    transport: Transport,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.mcp_host.clone());
    let port = port.unwrap_or(config.mcp_port);
    let path = config.mcp_path.clone();

    match &config.knowledge_base_id {
        Some(id) => info!("Knowledge base: {}", id),
        None => info!("KNOWLEDGE_BASE_ID is not set; retrieve calls will report an error"),
    }

    let server = KnowledgeBaseMcp::from_config(config)
        .await
        .context("Failed to initialise MCP server")?;

    info!("MCP server ready. Available tools:");
    for tool in server.get_tool_router().list_all() {
        info!("  - {}", tool.name);
    }

    match transport {
        Transport::StreamableHttp => {
            mcp::serve_streamable_http(server, &host, port, &path)
                .await
                .context("HTTP transport failed")?;
        }
        Transport::Stdio => {
            mcp::serve_stdio(server)
                .await
                .context("stdio transport failed")?;
        }
    }

    Ok(())
}

async fn cmd_retrieve(config: Config, query: &str) -> Result<()> {
    let retriever = Retriever::from_config(Arc::new(config))
        .await
        .context("Failed to initialise retriever")?;

    // failures arrive as report text, same as the tool
    println!("{}", retriever.retrieve(query).await);
    Ok(())
}

async fn cmd_presign(config: &Config, uri: &str) -> Result<()> {
    let credentials = CredentialSource::from_config(config).await?;
    let presigner = S3Presigner::new(config, credentials)?;

    let link = generate_presigned_url(&presigner, uri).await;
    println!("{}", link);
    if link != uri && link.starts_with("http") {
        eprintln!(
            "{}",
            format_success(&format!(
                "valid for {} seconds",
                config.presigned_url_expiration
            ))
        );
    }

    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&config.redacted())
        .context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}
