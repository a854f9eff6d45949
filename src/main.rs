mod cli;

use vodbridge::{config, remote, server};
use vodbridge_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use remote::ConversionClient;
use std::path::{Path, PathBuf};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting vodbridge");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let data_dir = resolve_data_dir(&config, config_path);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let db_path = data_dir.join("vodbridge.db");
    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    let db_pool = init_pool(&db_path_str)?;

    server::start_server(config, db_pool).await
}

/// Data directory from config, else next to the config file, else the
/// current directory.
fn resolve_data_dir(config: &config::Config, config_path: Option<&Path>) -> PathBuf {
    if let Some(dir) = config.server.data_dir.as_deref() {
        let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
        return PathBuf::from(expanded);
    }

    config_path
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vodbridge=trace,vodbridge_db=debug,vodbridge_common=debug,tower_http=debug".to_string()
        } else {
            "vodbridge=debug,vodbridge_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vodbridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::HashKey { key } => {
            println!("{}", remote::api_key_hash(&key));
            Ok(())
        }
        Commands::QueueStatus => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(queue_status(cli.config.as_deref()))
        }
    }
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Configuration is valid");
    println!("  Server:   {}:{}", config.server.host, config.server.port);
    println!("  Callback: {}", config.callback_url());
    println!(
        "  Remote:   {}",
        config.remote.server_url().unwrap_or("(not set)")
    );
    println!(
        "  API key:  {}",
        if config.remote.api_key().is_some() {
            "set"
        } else {
            "(not set)"
        }
    );
    if let Some(base) = config.remote.public_url_base() {
        println!("  Public URL base: {}", base);
    }

    Ok(())
}

async fn queue_status(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let client = remote::HttpConversionClient::from_config(&config)?;

    let status = client.queue_status().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
