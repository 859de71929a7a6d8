use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{extract::Request, extract::State, http::StatusCode, routing::post, Router};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kikbot::config::Config;
use kikbot::{KikClient, KikError, Message, Payload, WebhookCallback};

/// Replies to every text message with the same text
struct EchoBot {
    sender: KikClient,
}

#[async_trait]
impl WebhookCallback for EchoBot {
    async fn on_webhook(&self, payload: Payload, error: Option<KikError>) {
        if let Some(e) = error {
            warn!("Dropping webhook for '{}': {}", payload.username, e);
            return;
        }

        let replies: Vec<Message> = payload
            .messages
            .iter()
            .filter(|m| m.is_text())
            .filter_map(|m| {
                Some(Message::text(
                    m.chat_id.clone()?,
                    m.from.clone()?,
                    m.body.clone()?,
                ))
            })
            .collect();

        for batch in replies.chunks(kikbot::BATCH_LIMIT) {
            if let Err(e) = self.sender.send_messages(batch).await {
                error!("Failed to send echo replies: {}", e);
            }
        }
    }
}

async fn incoming(State(client): State<KikClient>, request: Request) -> StatusCode {
    client.handle_webhook(request).await;
    StatusCode::OK
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kikbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Bot: {}", config.kik.username);
    info!("  API: {}", config.kik.base_url);
    info!("  Webhook path: {}", config.server.webhook_path);

    let sender = config
        .client_builder()
        .build()
        .context("Failed to build sending client")?;

    if let Some(bot) = &config.bot {
        sender
            .set_config(&bot.to_bot_config())
            .await
            .context("Failed to push bot configuration")?;
        info!("Bot configuration pushed to Kik");
    }

    let client = config
        .client_builder()
        .callback(EchoBot { sender })
        .build()
        .context("Failed to build webhook client")?;

    let app = Router::new()
        .route(&config.server.webhook_path, post(incoming))
        .with_state(client);

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!("Kik bot listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
