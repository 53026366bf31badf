use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paper_registry::config::{find_config_file, load_config, Config};
use paper_registry::ui::Style;
use paper_registry::{PaperServer, Session};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Registry - share papers between clients and get notified when new ones arrive
#[derive(Parser, Debug)]
#[command(name = "paper-registry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent paper registry with live notifications", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the registry server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Start an interactive session against a running server
    #[command(alias = "c")]
    Connect {
        /// Server address as host:port (overrides config)
        #[arg(long, short)]
        server: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn log_filter(cli: &Cli, config: &Config) -> String {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return filter;
    }

    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };
    format!("paper_registry={}", level)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from environment".to_string(),
    })?;

    // Logs go to stderr so they never mix with the interactive session
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter(&cli, &config)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let addr = server_config.bind_addr();
            let server = PaperServer::builder()
                .queue_capacity(config.events.queue_capacity)
                .subscriber_capacity(config.events.subscriber_capacity)
                .bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            server
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for shutdown signal: {}", e);
                    }
                    tracing::info!("Shutting down");
                })
                .await?;
        }

        Commands::Connect { server } => {
            let addr = server.unwrap_or_else(|| config.client.server_addr.clone());
            let session = Session::connect(addr.as_str())
                .await
                .with_context(|| format!("Failed to connect to {}", addr))?;

            if let Err(e) = session
                .run(tokio::io::stdin(), tokio::io::stdout(), Style::detect())
                .await
            {
                // A pending stdin read would keep the runtime from shutting down
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
