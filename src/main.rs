//! # Volley Poll Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database,
//! starts the daily poll service, and runs the Telegram bot alongside
//! the web API server.

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volley_poll_bot::bot::handlers::BotHandler;
use volley_poll_bot::config::Config;
use volley_poll_bot::database::connection::DatabaseManager;
use volley_poll_bot::services::poller::PollService;
use volley_poll_bot::services::transport::TelegramTransport;
use volley_poll_bot::web;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volley_poll_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Volley Poll Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}",
        config.database_url, config.http_port
    );

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let handler = BotHandler::new(db_arc.as_ref().clone(), transport);
    info!("Telegram bot initialized successfully");

    // Initialize and start the daily poll service
    info!("Initializing poll service...");
    let mut poll_service = match PollService::new(bot.clone(), db_arc.clone()).await {
        Ok(service) => {
            info!("Poll service initialized successfully");
            service
        }
        Err(e) => {
            tracing::error!("Failed to create poll service: {}", e);
            return Err(anyhow::anyhow!("Failed to create poll service: {}", e));
        }
    };

    if let Err(e) = poll_service.start().await {
        tracing::error!("Failed to start poll service: {}", e);
    } else {
        info!("Poll service started successfully");
    }

    // Initialize the web API server
    let state = web::AppState::new(db_arc.clone(), Arc::new(config.clone()));
    let app = web::router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Web API server starting on port {}", config.http_port);

    // Run both the bot and the web server concurrently
    let bot_task = tokio::spawn(async move {
        let storage: Arc<InMemStorage<()>> = InMemStorage::new().into();
        Dispatcher::builder(bot, handler.schema())
            .dependencies(dptree::deps![storage])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let web_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Web server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = web_task => {
            if let Err(e) = result2 {
                tracing::error!("Web task error: {}", e);
            }
        }
    }

    // Stop the poll service on shutdown
    if let Err(e) = poll_service.stop().await {
        tracing::warn!("Error stopping poll service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
