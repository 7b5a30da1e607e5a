//! Video generation MCP server
//!
//! MCP server for video generation with Replicate models, FFmpeg editing
//! tools and Gemini image checks.

use anyhow::Result;
use clap::Parser;
use videogen_mcp::VideoGenServer;
use videogen_mcp_common::{Config, McpServerBuilder, TransportArgs};

/// Command-line arguments for the video generation server.
#[derive(Parser, Debug)]
#[command(name = "videogen-mcp")]
#[command(about = "MCP server for video generation using Replicate")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    videogen_mcp_common::tracing::init_tracing();

    tracing::info!("videogen-mcp server starting...");

    let args = Args::parse();

    let config = Config::from_env()?;
    tracing::info!(
        save_dir = %config.save_dir.display(),
        replicate_token = config.replicate_api_token.is_some(),
        storage = config.supabase_url.is_some(),
        vision = config.google_api_key.is_some(),
        "Configuration loaded"
    );

    let server = VideoGenServer::new(config);

    let transport = args.transport.into_transport();
    tracing::info!(transport = %transport, "Starting MCP server");

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
