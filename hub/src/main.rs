use std::path::PathBuf;
use std::sync::Arc;

use agent_hub::{serve, HubConfig, HubState, MessageRouter};
use anyhow::Result;
use clap::{ArgAction, Parser};

#[derive(Parser)]
#[command(name = "agent-hub")]
#[command(about = "Multi-agent message hub: tools, agents and workflows over WebSocket")]
struct Cli {
    /// Host to bind to (default: from .agent-hub.toml or localhost)
    #[arg(long, env = "AGENT_HUB_HOST")]
    host: Option<String>,

    /// Port to bind to (default: from .agent-hub.toml or 8765)
    #[arg(long, env = "AGENT_HUB_PORT")]
    port: Option<u16>,

    /// Config file to use instead of discovering .agent-hub.toml
    #[arg(short, long, env = "AGENT_HUB_CONFIG")]
    config: Option<PathBuf>,

    /// List available tools and exit
    #[arg(long)]
    list_tools: bool,

    /// List available agents and exit
    #[arg(long)]
    list_agents: bool,

    /// List available workflows and exit
    #[arg(long)]
    list_workflows: bool,

    /// Increase verbosity (-v debug, -vv trace). Default is info.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tool_common::init_tracing("agent_hub", cli.verbose)?;

    let mut config = HubConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let router = MessageRouter::from_config(&config)?;

    if cli.list_tools {
        println!("{}", serde_json::to_string_pretty(&router.tools().definitions())?);
        return Ok(());
    }
    if cli.list_agents {
        println!("{}", serde_json::to_string_pretty(&router.orchestrator().agent_definitions())?);
        return Ok(());
    }
    if cli.list_workflows {
        println!("{}", serde_json::to_string_pretty(&router.orchestrator().workflow_definitions())?);
        return Ok(());
    }

    let state = HubState::new(Arc::new(router));
    serve(state, &config.server.host, config.server.port, config.retention()).await?;

    Ok(())
}
