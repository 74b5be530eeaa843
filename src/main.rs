use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use userbook::config::{DEFAULT_CONFIG_FILE, UserbookConfig};
use userbook::server::ServerConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "userbook")]
#[command(version, about = "User records service and form manager")]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the user records collection service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// Path to the SQLite database
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Enable permissive CORS for a separately served front end
        #[arg(long)]
        dev: bool,
        /// Only initialize the database, then exit
        #[arg(long)]
        init: bool,
    },
    /// Browse and edit records against a running service
    Browse {
        /// Service base URL, e.g. http://127.0.0.1:8080
        #[arg(long)]
        base_url: Option<String>,
        /// Records requested per load-more
        #[arg(long)]
        page_size: Option<u32>,
    },
}

fn load_config(cli: &Cli) -> Result<UserbookConfig> {
    let mut config = UserbookConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    config.apply_env()?;

    match &cli.command {
        Commands::Serve {
            host,
            port,
            db_path,
            dev,
            ..
        } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(db_path) = db_path {
                config.server.db_path = db_path.clone();
            }
            config.server.dev_mode |= *dev;
        }
        Commands::Browse {
            base_url,
            page_size,
        } => {
            if let Some(base_url) = base_url {
                config.client.base_url = base_url.clone();
            }
            if let Some(page_size) = page_size {
                config.client.page_size = *page_size;
            }
        }
    }

    let problems = config.validate();
    if !problems.is_empty() {
        bail!("Invalid configuration:\n  {}", problems.join("\n  "));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    userbook::logging::init_logging(cli.verbose, cli.log_json)?;

    let config = load_config(&cli)?;
    debug!(?config, "configuration loaded");

    match &cli.command {
        Commands::Serve { init, .. } => {
            cmd::cmd_serve(ServerConfig::from(config.server), *init).await?;
        }
        Commands::Browse { .. } => {
            cmd::cmd_browse(&config.client).await?;
        }
    }

    Ok(())
}
