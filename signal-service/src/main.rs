use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use signal_service::{api, ServiceConfig, SignalService};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "signal-service",
    about = "Daily news-sentiment trading signals",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the news and model caches
    #[arg(long, global = true, env = "SIGNAL_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /signal/latest/{identifier}
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = 3005)]
        port: u16,
    },

    /// Print the sentiment of an entity for one day or a range of days
    Analyze {
        /// Company name or ticker
        entity: String,

        /// First day to analyze (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Last day to analyze, inclusive (defaults to --date)
        #[arg(short, long)]
        until: Option<NaiveDate>,
    },

    /// Classify articles read from a JSON array of {url, title, text} records
    Classify {
        /// Company name or ticker
        entity: String,

        /// JSON file holding the article records
        #[arg(short, long)]
        articles: PathBuf,

        /// Day the articles belong to (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show how many entries each cache holds
    Cache {
        /// Remove every entry
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = ServiceConfig::from_env();
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    if config.llm.api_key.is_empty() {
        error!("OPEN_API_TOKEN is not set, model requests will be rejected");
    }

    let service = SignalService::from_config(&config).await.map_err(|e| {
        error!("Failed to start signal service: {}", e);
        Box::new(e) as Box<dyn std::error::Error>
    })?;

    match cli.command.unwrap_or(Commands::Serve {
        host: "127.0.0.1".to_string(),
        port: 3005,
    }) {
        Commands::Serve { host, port } => {
            info!("Starting signal service on {}:{}", host, port);
            let listener = TcpListener::bind((host.as_str(), port)).await?;
            api::serve(listener, Arc::new(service)).await?;
        }
        Commands::Analyze {
            entity,
            date,
            until,
        } => {
            let from = date.unwrap_or_else(|| Local::now().date_naive());
            let until = until.unwrap_or(from);
            for day in service.analyze_range(&entity, from, until).await? {
                println!("{}", serde_json::to_string(&day)?);
            }
        }
        Commands::Classify {
            entity,
            articles,
            date,
        } => {
            let raw = tokio::fs::read_to_string(&articles).await?;
            let records: Vec<HashMap<String, String>> = serde_json::from_str(&raw)?;
            info!("Read {} article records from {}", records.len(), articles.display());

            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let day = service.classify_records(&entity, date, &records).await?;
            println!("{}", serde_json::to_string(&day)?);
        }
        Commands::Cache { clear } => {
            for cache in service.caches() {
                if clear {
                    let removed = cache.clear().await?;
                    println!("{}: removed {} entries", cache.name(), removed);
                } else if cache.is_empty().await? {
                    println!("{}: empty", cache.name());
                } else {
                    println!("{}: {} entries", cache.name(), cache.len().await?);
                }
            }
        }
    }

    Ok(())
}
