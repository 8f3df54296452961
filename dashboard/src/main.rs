use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::config::{create_config_template, load_config};
use common::{logging, DashboardConfig};
use market_intel::IntelStores;
use research_agents::AgentKind;
use std::path::{Path, PathBuf};
use tracing::info;

mod commands;

const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";

#[derive(Debug, Parser)]
#[command(name = "dashboard", about = "Query and maintain the market dashboard data stores")]
struct Cli {
    /// Configuration file (defaults to ./dashboard.toml when present)
    #[arg(long, short, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the data directory and empty store files
    Init,

    /// Save every record of a JSON array file into a store
    Ingest { domain: AgentKind, file: PathBuf },

    /// List records, optionally filtered
    List(ListArgs),

    /// Aggregated stats over the domain's recency window
    Stats {
        domain: AgentKind,
        /// Window in days (defaults to the configured window)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Export recent records from one agent to another
    Export {
        from: AgentKind,
        to: AgentKind,
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Write a commented default configuration file
    ConfigTemplate {
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    pub domain: AgentKind,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// At most one filter per listing
#[derive(Debug, Default, Args)]
#[group(multiple = false)]
pub struct FilterArgs {
    #[arg(long)]
    pub sentiment: Option<String>,
    #[arg(long)]
    pub token: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub narrative: Option<String>,
    #[arg(long)]
    pub channel: Option<String>,
    #[arg(long)]
    pub days: Option<i64>,
}

fn resolve_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let config = match path {
        Some(path) => load_config(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(DEFAULT_CONFIG_PATH).context("Failed to load ./dashboard.toml")?
        }
        None => DashboardConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::ConfigTemplate { path } = &cli.command {
        create_config_template(path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = resolve_config(cli.config.as_deref())?;
    logging::init(&config.log_level);
    info!("Using data directory {}", config.data_dir.display());

    let stores = IntelStores::open(&config);

    match cli.command {
        Command::Init => {
            stores.initialize().await;
            println!("Initialized stores in {}", config.data_dir.display());
        }
        Command::Ingest { domain, file } => {
            let saved = commands::ingest(&stores, domain, &file).await?;
            println!("Saved {} {} records", saved, domain);
        }
        Command::List(args) => {
            print_json(&commands::list(&stores, &args).await?)?;
        }
        Command::Stats { domain, days } => {
            print_json(&commands::stats(&stores, domain, days).await?)?;
        }
        Command::Export { from, to, days } => {
            print_json(&commands::export(&stores, &config, from, to, days).await?)?;
        }
        Command::ConfigTemplate { .. } => {}
    }

    Ok(())
}
