use std::time::Duration;

use arogya_core::preview_text;
use arogya_observability::mask_phone;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected delivery with status {status}")]
    Rejected { status: StatusCode },
}

/// Outbound channel for replies and broadcasts.
#[async_trait]
pub trait MessageSender: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, phone: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Writes deliveries to the log instead of a provider.
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl MessageSender for LogSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, phone: &str, text: &str) -> Result<(), DeliveryError> {
        info!(
            to = %mask_phone(phone),
            text = %preview_text(text, 160),
            "[SEND]"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct OutboundPayload<'a> {
    to: &'a str,
    text: &'a str,
}

/// Posts `{ "to", "text" }` JSON to a messaging provider relay.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpSender {
    pub fn new(endpoint: impl Into<String>, bearer_token: Option<String>) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            bearer_token,
        })
    }
}

#[async_trait]
impl MessageSender for HttpSender {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, phone: &str, text: &str) -> Result<(), DeliveryError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&OutboundPayload { to: phone, text });
        if let Some(token) = self.bearer_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected { status });
        }

        Ok(())
    }
}

/// Keeps every delivery in memory. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    failing_phones: Vec<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to these phones fail with a rejected status.
    pub fn failing_for(phones: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_phones: phones.iter().map(|phone| phone.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, phone: &str, text: &str) -> Result<(), DeliveryError> {
        if self.failing_phones.iter().any(|failing| failing == phone) {
            return Err(DeliveryError::Rejected {
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }

        self.sent.lock().push((phone.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn recording_sender_keeps_order_and_failures() {
        let sender = RecordingSender::failing_for(&["2"]);
        sender.send("1", "a").await.unwrap();
        assert!(matches!(
            sender.send("2", "b").await,
            Err(DeliveryError::Rejected { .. })
        ));
        sender.send("3", "c").await.unwrap();

        assert_eq!(
            sender.sent(),
            vec![
                ("1".to_string(), "a".to_string()),
                ("3".to_string(), "c".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        assert!(LogSender.send("919876543210", "hello").await.is_ok());
    }

    #[tokio::test]
    async fn http_sender_reports_connection_failures() {
        let sender = HttpSender::new("http://127.0.0.1:9/relay", None).unwrap();
        assert!(matches!(
            sender.send("919876543210", "hello").await,
            Err(DeliveryError::Http(_))
        ));
    }

    #[tokio::test]
    async fn http_sender_posts_json_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relay"))
            .and(header("authorization", "Bearer relay-secret"))
            .and(body_json(json!({"to": "919876543210", "text": "टीका आज"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = HttpSender::new(
            format!("{}/relay", server.uri()),
            Some("relay-secret".to_string()),
        )
        .unwrap();

        sender.send("919876543210", "टीका आज").await.unwrap();
    }

    #[tokio::test]
    async fn http_sender_omits_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relay"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let sender = HttpSender::new(format!("{}/relay", server.uri()), None).unwrap();
        sender.send("911", "hello").await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].headers.get("authorization").is_none());
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body, json!({"to": "911", "text": "hello"}));
    }

    #[tokio::test]
    async fn http_sender_maps_error_status_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let sender = HttpSender::new(format!("{}/relay", server.uri()), None).unwrap();
        match sender.send("911", "hello").await {
            Err(DeliveryError::Rejected { status }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected rejected delivery, got {other:?}"),
        }
    }
}
