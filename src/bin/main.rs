use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use agentlaunch::launchpad::{DEFAULT_CHAIN_ID, derive_ticker};
use agentlaunch::{ApiConfig, SecretEntry, TokenRequest, Toolkit, create_server};

// rmcp imports for MCP stdio server mode
use rmcp::service::ServiceExt;
use rmcp::transport::stdio;

#[derive(Parser)]
#[command(name = "agentlaunch")]
#[command(about = "Deploy hosted agents and launch tokens for them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a python agent to Agentverse hosting and wait for it to start
    Deploy {
        /// Display name for the hosted agent
        name: String,
        /// Path to the python source file to upload as agent.py
        #[arg(short, long)]
        file: PathBuf,
        /// Extra secret to provision, as NAME=VALUE (repeatable)
        #[arg(short, long = "secret")]
        secrets: Vec<String>,
        /// Agentverse API key (falls back to the environment)
        #[arg(long, env = "AGENTVERSE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// How many 5s status polls to attempt before giving up
        #[arg(long, default_value_t = 12)]
        max_polls: u32,
    },
    /// Create a token on the launchpad backend
    Launch {
        /// Token name
        name: String,
        /// Token symbol (derived from the name when omitted)
        #[arg(long)]
        ticker: Option<String>,
        /// Token description
        #[arg(long)]
        description: Option<String>,
        /// Logo image URL
        #[arg(long)]
        logo: Option<String>,
        /// Target chain id (97 = BSC testnet, 56 = BSC mainnet)
        #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
        chain_id: u64,
        #[arg(long, env = "AGENTVERSE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Tokenize an already-hosted agent
    Tokenize {
        /// The hosted agent's address
        address: String,
        #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
        chain_id: u64,
        #[arg(long, env = "AGENTVERSE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// List agents hosted under the configured credential
    ListAgents {
        #[arg(long, env = "AGENTVERSE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Fetch one status snapshot for a hosted agent
    Status {
        /// The hosted agent's address
        address: String,
        #[arg(long, env = "AGENTVERSE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Run as an MCP stdio server (for use in mcp.json)
    McpStdio,
    /// Run as an MCP HTTP server
    McpHttp {
        /// Bind address, e.g. 0.0.0.0:3952
        #[arg(long, default_value = "0.0.0.0:3952")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("agentlaunch=info".parse()?)
                .add_directive("rmcp=warn".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            name,
            file,
            secrets,
            api_key,
            max_polls,
        } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let secrets = secrets
                .iter()
                .map(|raw| parse_secret(raw))
                .collect::<Result<Vec<_>>>()?;

            let toolkit = Toolkit::new(ApiConfig::from_env(api_key.as_deref()))?;

            info!("Deploying agent '{}' from {}", name, file.display());
            let deployment = toolkit
                .deploy_agent(&name, &source, secrets, Some(max_polls), None)
                .await?;

            println!("Agent deployed.");
            println!("  Address: {}", deployment.address);
            println!("  Status:  {}", deployment.status);
            if let Some(wallet) = &deployment.wallet_address {
                println!("  Wallet:  {}", wallet);
            }
            for err in &deployment.secret_errors {
                println!("  Secret failed: {}", err);
            }
        }
        Commands::Launch {
            name,
            ticker,
            description,
            logo,
            chain_id,
            api_key,
        } => {
            let toolkit = Toolkit::new(ApiConfig::from_env(api_key.as_deref()))?;

            let ticker = ticker.unwrap_or_else(|| derive_ticker(&name));
            let mut request = TokenRequest::new(name, ticker);
            request.description = description;
            request.logo = logo;
            request.chain_id = chain_id;

            let (token, handoff) = toolkit.launch_token(&request).await?;

            println!("Token created.");
            if let Some(name) = token.name() {
                println!("  Name:   {}", name);
            }
            if let Some(symbol) = token.symbol() {
                println!("  Symbol: {}", symbol);
            }
            match handoff {
                Some(url) => {
                    println!();
                    println!("Open this link to deploy the token with your wallet:");
                    println!("  {}", url);
                }
                None => println!("  (backend returned no token id; no handoff link)"),
            }
        }
        Commands::Tokenize {
            address,
            chain_id,
            api_key,
        } => {
            let toolkit = Toolkit::new(ApiConfig::from_env(api_key.as_deref()))?;

            let (token, handoff) = toolkit.tokenize_agent(&address, chain_id).await?;

            println!("Agent tokenized.");
            if let Some(symbol) = token.symbol() {
                println!("  Symbol: {}", symbol);
            }
            if let Some(url) = handoff {
                println!();
                println!("Open this link to deploy the token with your wallet:");
                println!("  {}", url);
            }
        }
        Commands::ListAgents { api_key } => {
            let toolkit = Toolkit::new(ApiConfig::from_env(api_key.as_deref()))?;

            let agents = toolkit.list_agents().await?;
            if agents.is_empty() {
                println!("No hosted agents found.");
                return Ok(());
            }

            println!("{:<68} {:<10} {:<10}", "ADDRESS", "COMPILED", "RUNNING");
            for agent in agents {
                println!(
                    "{:<68} {:<10} {:<10}",
                    agent.address.as_deref().unwrap_or("-"),
                    agent.compiled,
                    agent.running,
                );
            }
        }
        Commands::Status { address, api_key } => {
            let toolkit = Toolkit::new(ApiConfig::from_env(api_key.as_deref()))?;

            let agent = toolkit.agent_status(&address).await?;
            println!("Agent {}", address);
            println!("  Compiled: {}", agent.compiled);
            println!("  Running:  {}", agent.running);
            if let Some(wallet) = &agent.wallet_address {
                println!("  Wallet:   {}", wallet);
            }
        }
        Commands::McpStdio => {
            info!("Starting MCP stdio server (rmcp)");

            let server = create_server(ApiConfig::from_env(None))?;

            // Run as an MCP stdio server. McpServer implements ServerHandler.
            let service = server
                .as_ref()
                .clone()
                .serve(stdio())
                .await
                .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

            // Block until the MCP session ends.
            service.waiting().await?;
            info!("MCP stdio server session ended");
        }
        Commands::McpHttp { bind } => {
            info!("Starting MCP HTTP server (rmcp) on {}", bind);

            let server = create_server(ApiConfig::from_env(None))?;
            agentlaunch::server::start_mcp_http(server, &bind).await?;
        }
    }

    Ok(())
}

/// Parse a NAME=VALUE secret argument.
fn parse_secret(raw: &str) -> Result<SecretEntry> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid secret '{}', expected NAME=VALUE", raw))?;
    if name.is_empty() {
        anyhow::bail!("invalid secret '{}', name must not be empty", raw);
    }
    Ok(SecretEntry::new(name, value))
}
