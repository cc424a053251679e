//! Leaderboard - ranked leaderboards over scraped content records

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use leaderboard::{
    config::Args,
    db::MongoClient,
    server::{self, AppState, StoreBackend},
    services::{LeaderboardService, ScraperClient},
    store::{MemoryStore, MongoStore, Stores},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("leaderboard={},info", args.log_level).into());
    let fmt_layer = if args.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    if let Err(e) = args.validate() {
        error!(code = e.code(), "{}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Leaderboard API");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!("Scraper: {}", args.scraper_base_url());
    info!("Recent window: {}h", args.recent_window_hours);
    if args.debug_pipeline {
        info!("Aggregation pipelines will be logged");
    }
    info!("======================================");

    // Connect to MongoDB (in-memory fallback in dev mode)
    let (stores, backend) = match connect_mongo(&args).await {
        Ok(store) => {
            info!("MongoDB connected successfully");
            (Stores::from_backend(Arc::new(store)), StoreBackend::Mongo)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                (Stores::from_backend(Arc::new(MemoryStore::new())), StoreBackend::Memory)
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let notifier = Arc::new(ScraperClient::new(args.scraper_config()));
    let service = LeaderboardService::new(stores, notifier, args.engine_config());
    let state = Arc::new(AppState::new(args, service, backend));

    server::run(state).await?;
    Ok(())
}

async fn connect_mongo(args: &Args) -> leaderboard::Result<MongoStore> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    MongoStore::new(client, args.debug_pipeline).await
}
