use std::sync::Arc;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::bot_config::BotConfig;
use crate::error::{ApiError, KikError, Result};
use crate::message::Message;
use crate::webhook::WebhookCallback;

pub const DEFAULT_BASE_URL: &str = "https://api.kik.com/v1";

/// Maximum number of messages Kik accepts in a single `/message` call.
pub const BATCH_LIMIT: usize = 5;

/// HTTP methods used by the Kik API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
}

impl ApiMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            ApiMethod::Get => reqwest::Method::GET,
            ApiMethod::Post => reqwest::Method::POST,
        }
    }
}

impl std::fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMethod::Get => write!(f, "GET"),
            ApiMethod::Post => write!(f, "POST"),
        }
    }
}

/// Bot username and API key, sent as HTTP Basic auth on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// A successful exchange with the Kik API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Always 200; any other status is returned as an error
    pub status: u16,
    pub body: Bytes,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    verbose: bool,
    callback: Option<Arc<dyn WebhookCallback>>,
}

/// Kik API client. Cheap to clone; immutable once built.
#[derive(Clone)]
pub struct KikClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for KikClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KikClient")
            .field("base_url", &self.inner.base_url)
            .field("credentials", &self.inner.credentials)
            .field("verbose", &self.inner.verbose)
            .field("callback", &self.inner.callback.is_some())
            .finish()
    }
}

pub struct KikClientBuilder {
    credentials: Credentials,
    base_url: String,
    verbose: bool,
    http: Option<reqwest::Client>,
    callback: Option<Arc<dyn WebhookCallback>>,
}

impl KikClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Log every outgoing request and incoming response/webhook at debug level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Use a preconfigured HTTP client, e.g. one with a request timeout.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn callback(mut self, callback: impl WebhookCallback + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Result<KikClient> {
        url::Url::parse(&self.base_url)?;

        Ok(KikClient {
            inner: Arc::new(Inner {
                http: self.http.unwrap_or_default(),
                base_url: self.base_url.trim_end_matches('/').to_string(),
                credentials: self.credentials,
                verbose: self.verbose,
                callback: self.callback,
            }),
        })
    }
}

impl KikClient {
    pub fn builder(username: impl Into<String>, api_key: impl Into<String>) -> KikClientBuilder {
        KikClientBuilder {
            credentials: Credentials {
                username: username.into(),
                api_key: api_key.into(),
            },
            base_url: DEFAULT_BASE_URL.to_string(),
            verbose: false,
            http: None,
            callback: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn is_verbose(&self) -> bool {
        self.inner.verbose
    }

    pub(crate) fn callback(&self) -> Option<&Arc<dyn WebhookCallback>> {
        self.inner.callback.as_ref()
    }

    /// Perform one authenticated exchange against `{base_url}{path}`.
    ///
    /// Only HTTP 200 counts as success. Any other status is decoded as an
    /// [`ApiError`] and returned as [`KikError::Platform`]; if that body is not
    /// valid JSON the result is [`KikError::ErrorBody`] instead.
    pub async fn api_request(
        &self,
        method: ApiMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.inner.base_url, path);

        if self.inner.verbose {
            let shown = body
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            debug!("-> Kik API: {} {} {}", method, path, shown);
        }

        let creds = &self.inner.credentials;
        let mut request = self
            .inner
            .http
            .request(method.as_reqwest(), &url)
            .basic_auth(&creds.username, Some(&creds.api_key))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let res_body = response.bytes().await?;

        if self.inner.verbose {
            debug!(
                "<- Kik API: {} {}",
                status.as_u16(),
                String::from_utf8_lossy(&res_body)
            );
        }

        if status != StatusCode::OK {
            let error: ApiError = match serde_json::from_slice(&res_body) {
                Ok(e) => e,
                Err(e) => {
                    if self.inner.verbose {
                        debug!("Kik API error body is not JSON: {}", e);
                    }
                    return Err(KikError::ErrorBody {
                        status: status.as_u16(),
                        source: e,
                    });
                }
            };
            if self.inner.verbose {
                debug!(
                    "Kik API error: {} - {}",
                    error.error.as_deref().unwrap_or_default(),
                    error
                );
            }
            return Err(KikError::Platform {
                status: status.as_u16(),
                error,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body: res_body,
        })
    }

    /// Send up to [`BATCH_LIMIT`] messages in one call.
    ///
    /// POST /message
    pub async fn send_messages(&self, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        if messages.len() > BATCH_LIMIT {
            return Err(KikError::BatchTooLarge {
                len: messages.len(),
                limit: BATCH_LIMIT,
            });
        }

        #[derive(Serialize)]
        struct Outgoing<'a> {
            messages: &'a [Message],
        }

        let body = serde_json::to_vec(&Outgoing { messages }).map_err(KikError::Encode)?;
        // The 200 body carries nothing useful for sends
        self.api_request(ApiMethod::Post, "/message", Some(body))
            .await?;
        Ok(())
    }

    pub async fn send_message(&self, message: Message) -> Result<()> {
        self.send_messages(std::slice::from_ref(&message)).await
    }

    /// GET /config
    pub async fn get_config(&self) -> Result<BotConfig> {
        let response = self.api_request(ApiMethod::Get, "/config", None).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// POST /config
    pub async fn set_config(&self, config: &BotConfig) -> Result<()> {
        let body = serde_json::to_vec(config).map_err(KikError::Encode)?;
        self.api_request(ApiMethod::Post, "/config", Some(body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot_config::Features;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("bot:secret")
    const AUTH: &str = "Basic Ym90OnNlY3JldA==";

    fn client_for(server: &MockServer) -> KikClient {
        KikClient::builder("bot", "secret")
            .base_url(server.uri())
            .verbose(true)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_config_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .and(header("authorization", AUTH))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "webhook": "https://x",
                "features": {
                    "receiveReadReceipts": true,
                    "receiveIsTyping": false,
                    "manuallySendReadReceipts": true,
                    "receiveDeliveryReceipts": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = client_for(&server).get_config().await.unwrap();
        assert_eq!(config.webhook.as_deref(), Some("https://x"));
        assert_eq!(
            config.features,
            Features {
                receive_read_receipts: true,
                receive_is_typing: false,
                manually_send_read_receipts: true,
                receive_delivery_receipts: false,
            }
        );
    }

    #[tokio::test]
    async fn test_api_request_returns_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/alice"))
            .and(header("authorization", AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"firstName":"Alice"}"#))
            .mount(&server)
            .await;

        let response = client_for(&server)
            .api_request(ApiMethod::Get, "/user/alice", None)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from_static(br#"{"firstName":"Alice"}"#));
    }

    #[tokio::test]
    async fn test_platform_error_on_403() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "not_authorized",
                "message": "bad creds"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_config().await.unwrap_err();
        assert!(err.is_platform());
        assert_eq!(err.to_string(), "bad creds");
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.api_error().and_then(|e| e.error.as_deref()),
            Some("not_authorized")
        );
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/message"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_message(Message::text("c", "alice", "hi"))
            .await
            .unwrap_err();
        assert!(err.is_decode());
        assert!(matches!(err, KikError::ErrorBody { status: 500, .. }));
        assert_eq!(err.status(), Some(500));
        assert!(err.api_error().is_none());
    }

    #[tokio::test]
    async fn test_non_200_success_status_is_still_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .set_config(&BotConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_platform());
        assert_eq!(err.status(), Some(201));
    }

    #[tokio::test]
    async fn test_send_messages_wraps_in_messages_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/message"))
            .and(header("authorization", AUTH))
            .and(body_json(json!({
                "messages": [
                    {"chatId": "c1", "type": "text", "to": "alice", "body": "one"},
                    {"chatId": "c1", "type": "link", "to": "alice", "url": "https://kik.com"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .send_messages(&[
                Message::text("c1", "alice", "one"),
                Message::link("c1", "alice", "https://kik.com"),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_messages_over_batch_limit_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let messages: Vec<Message> = (0..BATCH_LIMIT + 1)
            .map(|i| Message::text("c", "alice", i.to_string()))
            .collect();
        let err = client_for(&server)
            .send_messages(&messages)
            .await
            .unwrap_err();
        assert!(matches!(err, KikError::BatchTooLarge { len: 6, limit: 5 }));
    }

    #[tokio::test]
    async fn test_set_config_posts_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config"))
            .and(body_json(json!({
                "webhook": "https://example.com/hook",
                "features": {
                    "receiveReadReceipts": false,
                    "receiveIsTyping": true,
                    "manuallySendReadReceipts": false,
                    "receiveDeliveryReceipts": false
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = BotConfig {
            webhook: Some("https://example.com/hook".to_string()),
            features: Features {
                receive_is_typing: true,
                ..Default::default()
            },
        };
        client_for(&server).set_config(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Grab a free port, then close it so nothing listens there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = KikClient::builder("bot", "secret")
            .base_url(format!("http://127.0.0.1:{port}"))
            .build()
            .unwrap();

        let err = client.get_config().await.unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_platform());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = KikClient::builder("bot", "secret")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, KikError::InvalidUrl(_)));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = KikClient::builder("bot", "supersecret").build().unwrap();
        let shown = format!("{:?}", client);
        assert!(shown.contains("bot"));
        assert!(!shown.contains("supersecret"));
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
