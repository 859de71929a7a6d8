//! Client for the Kik bot messaging API.
//!
//! [`KikClient`] sends messages and manages bot configuration over
//! authenticated HTTP, and turns inbound webhook requests into calls to a
//! registered [`WebhookCallback`].

pub mod bot_config;
pub mod client;
pub mod config;
pub mod error;
pub mod keyboard;
pub mod message;
pub mod webhook;

pub use bot_config::{BotConfig, Features};
pub use client::{ApiMethod, ApiResponse, Credentials, KikClient, KikClientBuilder, BATCH_LIMIT};
pub use error::{ApiError, KikError, Result};
pub use keyboard::{Keyboard, KeyboardResponse};
pub use message::{Attribution, Message, MessageType, StructuredAttribution};
pub use webhook::{Payload, WebhookCallback, USERNAME_HEADER};
