use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::client::KikClient;
use crate::error::KikError;
use crate::message::{null_as_empty, Message};

/// Header carrying the bot username the messages were sent to.
pub const USERNAME_HEADER: &str = "X-Kik-Username";

/// Set of messages received via webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Taken from the `X-Kik-Username` header, never from the body
    #[serde(skip)]
    pub username: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub messages: Vec<Message>,
}

/// Application code receiving webhook events.
///
/// Called exactly once per inbound request. `error` is set when the body
/// could not be read or parsed; `payload.username` is populated either way.
/// Plain closures `Fn(Payload, Option<KikError>)` implement this trait.
#[async_trait]
pub trait WebhookCallback: Send + Sync {
    async fn on_webhook(&self, payload: Payload, error: Option<KikError>);
}

#[async_trait]
impl<F> WebhookCallback for F
where
    F: Fn(Payload, Option<KikError>) + Send + Sync,
{
    async fn on_webhook(&self, payload: Payload, error: Option<KikError>) {
        self(payload, error)
    }
}

impl KikClient {
    /// Parse an inbound webhook request and hand it to the registered callback.
    ///
    /// Never sends a response: acknowledging the platform is up to the caller.
    pub async fn handle_webhook(&self, request: Request) {
        let Some(callback) = self.callback() else {
            error!("Kik webhook error: no callback set");
            return;
        };

        let (parts, body) = request.into_parts();
        let username = parts
            .headers
            .get(USERNAME_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();

        if self.is_verbose() {
            debug!("Kik webhook: incoming payload for user '{}'", username);
        }

        let (payload, err) = self.read_payload(username, body).await;
        callback.on_webhook(payload, err).await;
    }

    async fn read_payload(&self, username: String, body: Body) -> (Payload, Option<KikError>) {
        let mut payload = Payload {
            username,
            messages: Vec::new(),
        };

        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(b) => b,
            Err(e) => {
                if self.is_verbose() {
                    debug!("Kik webhook error (read body): {}", e);
                }
                return (payload, Some(KikError::BodyRead(e)));
            }
        };

        if bytes.is_empty() {
            if self.is_verbose() {
                debug!("Kik webhook: received empty body");
            }
            return (payload, None);
        }

        if self.is_verbose() {
            debug!("Kik webhook: {}", String::from_utf8_lossy(&bytes));
        }

        match serde_json::from_slice::<Payload>(&bytes) {
            Ok(parsed) => {
                payload.messages = parsed.messages;
                (payload, None)
            }
            Err(e) => {
                if self.is_verbose() {
                    debug!("Kik webhook error (JSON): {}", e);
                }
                (payload, Some(KikError::Decode(e)))
            }
        }
    }
}
