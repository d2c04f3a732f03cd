mod cli;

use trailerio::{config, server, trailer::TrailerResolver};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!(
        sources = ?config.sources.enabled,
        edge = config.server.edge.as_deref().unwrap_or("-"),
        "Starting Trailerio"
    );

    server::start_server(config).await
}

async fn resolve_id(id: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = TrailerResolver::from_config(&config).context("Failed to build HTTP client")?;

    let result = resolver.resolve_all(id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Title: {}", result.title);
    if result.links.is_empty() {
        println!("No trailers found.");
        return Ok(());
    }
    for link in &result.links {
        let kind = if link.descriptor.is_hls() { "HLS" } else { "file" };
        println!("  [{}] {} ({})", link.priority, link.label(), kind);
        println!("      {}", link.descriptor.url);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Fetch timeout: {} ms", config.fetch.timeout_ms);
            println!(
                "  Cache: {} s TTL, {} entries max",
                config.cache.ttl_secs, config.cache.max_entries
            );
            let enabled: Vec<&str> = config.sources.enabled.iter().map(|k| k.as_str()).collect();
            println!("  Sources: {}", enabled.join(", "));
            println!("  Title lookup: {}", config.sources.title_lookup);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trailerio=trace,tower_http=debug".to_string()
        } else {
            "trailerio=info,tower_http=info".to_string()
        }
    });

    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Resolve { id, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_id(&id, json, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("trailerio {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
