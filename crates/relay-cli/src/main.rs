//! Relay CLI: chat with an OpenAI model that can call tools on an MCP server.

mod logging;
mod render;

use anyhow::Result;
use clap::Parser;
use relay_api::OpenAiProvider;
use relay_config::{CliOverrides, RelayConfig};
use relay_core::{Conversation, Relay, run_chat_loop};
use relay_mcp::McpClient;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Chat with an OpenAI model that can call MCP server tools"
)]
struct Cli {
    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Maximum tokens in each response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Command that launches the tool server
    #[arg(long)]
    server_command: Option<String>,

    /// Argument for the tool server command (repeatable)
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let overrides = CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        max_tokens: cli.max_tokens,
        server_command: cli.server_command,
        server_args: cli.server_args,
    };
    let config = match RelayConfig::load(overrides.clone()) {
        Ok(config) => config,
        Err(e) => {
            let server = relay_config::configured_server(&overrides);
            render::print_startup_failure(&anyhow::Error::new(e), server.display_name());
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::debug!("Loaded config: {config:?}");

    let provider = match OpenAiProvider::new(&config.api_key, &config.api_base_url) {
        Ok(provider) => provider,
        Err(e) => {
            render::print_startup_failure(&anyhow::Error::new(e), config.server.display_name());
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("Connecting to tool server...");
    let client = match McpClient::connect(&config.server).await {
        Ok(client) => client,
        Err(e) => {
            render::print_startup_failure(&anyhow::Error::new(e), config.server.display_name());
            return Ok(ExitCode::FAILURE);
        }
    };

    let names: Vec<&str> = client.tools().iter().map(|t| t.name.as_str()).collect();
    println!("\n{}", render::connected_banner(client.server_name(), &names));

    let tools = client.tool_definitions();
    let client = Arc::new(client);
    let relay = Relay::new(
        Arc::new(provider),
        client.clone(),
        tools,
        config.model.clone(),
        config.max_tokens,
    );

    println!("\n{}", render::started_banner(&config.model, relay.provider_name()));
    println!("Type your query or 'quit' to exit.");

    let mut conversation = Conversation::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let result = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        run_chat_loop(&relay, &mut conversation, stdin, |event| {
            if let Err(e) = render::render_event(&mut out, event) {
                tracing::warn!("Failed to write to stdout: {e}");
            }
        })
        .await
    };

    drop(relay);
    match Arc::try_unwrap(client) {
        Ok(client) => client.shutdown().await,
        Err(_) => tracing::warn!("Tool server session still shared; leaving it to kill_on_drop"),
    }

    let usage = result?;
    println!();
    render::print_usage(&usage);
    Ok(ExitCode::SUCCESS)
}
