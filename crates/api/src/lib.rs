mod config;
mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use arogya_agents::{HealthAgent, HttpSender, LogSender, MessageSender};
use arogya_core::{
    BroadcastRequest, CatalogContentProvider, ContentProvider, Language, MessageRequest,
    StaticContentProvider,
};
use arogya_observability::{AppMetrics, MetricsSnapshot};
use arogya_storage::Store;
use axum::body::{Body, Bytes};
use axum::extract::{Form, Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use crate::config::ServiceConfig;
pub use crate::rate_limit::IpRateLimiter;

const MAX_BODY_BYTES: usize = 64 * 1024;
const WHATSAPP_PREFIX: &str = "whatsapp:";

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<HealthAgent<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub admin_key: String,
    pub limiter: IpRateLimiter,
}

impl ApiState {
    pub fn new(agent: Arc<HealthAgent<Store>>, metrics: Arc<AppMetrics>, config: &ServiceConfig) -> Self {
        Self {
            agent,
            metrics,
            admin_key: config.admin_key.clone(),
            limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    time: String,
    subscribers: usize,
    langs: Vec<&'static str>,
    sender: &'static str,
    store: &'static str,
    metrics: MetricsSnapshot,
}

/// Twilio-style inbound form. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct TwilioInbound {
    #[serde(rename = "WaId")]
    wa_id: Option<String>,
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "Body")]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    phone: String,
    lang: String,
}

pub async fn build_app(config: ServiceConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let content: Arc<dyn ContentProvider> = match config.content_path.as_deref() {
        Some(path) => Arc::new(
            CatalogContentProvider::from_path(path).context("failed to initialize content")?,
        ),
        None => Arc::new(StaticContentProvider::new()),
    };

    let sender: Arc<dyn MessageSender> = match config.sender_url.as_deref() {
        Some(url) => Arc::new(
            HttpSender::new(url, config.sender_token.clone())
                .context("failed to build HTTP sender")?,
        ),
        None => Arc::new(LogSender),
    };

    let store = Store::from_database_url(config.database_url.as_deref()).await?;
    info!(
        store = store.backend(),
        sender = sender.name(),
        catalog = config.content_path.is_some(),
        "arogya services wired"
    );

    let agent = Arc::new(HealthAgent::new(
        content,
        sender,
        Arc::new(store),
        metrics.clone(),
    ));

    Ok(build_router(ApiState::new(agent, metrics, &config)))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/twilio", post(twilio_webhook))
        .route("/admin/subscribe", post(admin_subscribe))
        .route("/admin/broadcast", post(admin_broadcast))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let subscribers = match state.agent.subscriber_count().await {
        Ok(count) => count,
        Err(error) => {
            warn!(error = %error, "subscriber count unavailable");
            0
        }
    };

    let payload = HealthResponse {
        status: "ok",
        time: chrono::Utc::now().to_rfc3339(),
        subscribers,
        langs: Language::codes(),
        sender: state.agent.sender_name(),
        store: state.agent.store().backend(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

/// JSON webhook. Malformed bodies are treated as an empty object, and
/// numeric phone or pincode values are accepted.
async fn webhook(State(state): State<ApiState>, body: Bytes) -> impl IntoResponse {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let request = message_request_from_json(&payload);
    let result = state.agent.handle_message(request);
    (StatusCode::OK, Json(result))
}

async fn twilio_webhook(
    State(state): State<ApiState>,
    form: Option<Form<TwilioInbound>>,
) -> impl IntoResponse {
    let inbound = form.map(|Form(inbound)| inbound).unwrap_or_default();
    let request = message_request_from_twilio(inbound);
    let result = state.agent.handle_message(request);
    (StatusCode::OK, Json(result))
}

async fn admin_subscribe(
    State(state): State<ApiState>,
    Json(input): Json<SubscribeRequest>,
) -> Response {
    let phone = input.phone.trim();
    if phone.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "phone_required",
                "message": "phone must not be empty"
            })),
        )
            .into_response();
    }

    let Some(lang) = Language::from_code(input.lang.as_str()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "unsupported_language",
                "message": format!("lang must be one of {}", Language::codes().join(", "))
            })),
        )
            .into_response();
    };

    match state.agent.subscribe(phone, lang).await {
        Ok(subscriber) => (StatusCode::OK, Json(subscriber)).into_response(),
        Err(error) => internal_error("subscribe_failed", &error),
    }
}

async fn admin_broadcast(
    State(state): State<ApiState>,
    Json(input): Json<BroadcastRequest>,
) -> Response {
    match state.agent.broadcast(&input).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => internal_error("broadcast_failed", &error),
    }
}

fn internal_error(code: &'static str, error: &anyhow::Error) -> Response {
    warn!(error = %error, code, "admin request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": code,
            "message": error.to_string()
        })),
    )
        .into_response()
}

fn message_request_from_json(payload: &Value) -> MessageRequest {
    MessageRequest {
        phone: json_scalar(payload, "phone").unwrap_or_default(),
        text: json_scalar(payload, "text").unwrap_or_default(),
        pincode: json_scalar(payload, "pincode"),
        language_hint: payload
            .get("lang")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn message_request_from_twilio(inbound: TwilioInbound) -> MessageRequest {
    let phone = inbound
        .wa_id
        .filter(|wa_id| !wa_id.is_empty())
        .unwrap_or_else(|| {
            inbound
                .from
                .unwrap_or_default()
                .replace(WHATSAPP_PREFIX, "")
        });

    MessageRequest {
        phone,
        text: inbound.body.unwrap_or_default(),
        pincode: None,
        language_hint: None,
    }
}

/// String or number field rendered as text.
fn json_scalar(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

async fn admin_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || !is_admin_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !constant_time_eq(header_key, &state.admin_key) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_inbound_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let key = format!("{}:{}", request.uri().path(), request_ip(&request));
    if !state.limiter.allow(&key) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this client"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn constant_time_eq(lhs: &str, rhs: &str) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    lhs.bytes()
        .zip(rhs.bytes())
        .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

fn is_admin_endpoint(path: &str) -> bool {
    path.starts_with("/admin/")
}

fn is_inbound_endpoint(path: &str) -> bool {
    matches!(path, "/webhook" | "/twilio")
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(
    State(_state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payload_coerces_numbers() {
        let request = message_request_from_json(&serde_json::json!({
            "phone": 919876543210_u64,
            "text": "outbreak",
            "pincode": 560001,
            "lang": "kn"
        }));
        assert_eq!(request.phone, "919876543210");
        assert_eq!(request.pincode.as_deref(), Some("560001"));
        assert_eq!(request.language_hint.as_deref(), Some("kn"));
    }

    #[test]
    fn non_object_payload_is_empty_request() {
        let request = message_request_from_json(&Value::Null);
        assert_eq!(request, MessageRequest::default());

        let request = message_request_from_json(&serde_json::json!(["phone", "text"]));
        assert_eq!(request, MessageRequest::default());
    }

    #[test]
    fn non_string_hint_is_dropped() {
        let request = message_request_from_json(&serde_json::json!({"text": "hi", "lang": 7}));
        assert!(request.language_hint.is_none());
    }

    #[test]
    fn twilio_prefers_wa_id() {
        let request = message_request_from_twilio(TwilioInbound {
            wa_id: Some("919812345678".to_string()),
            from: Some("whatsapp:+919812345678".to_string()),
            body: Some("hello".to_string()),
        });
        assert_eq!(request.phone, "919812345678");
        assert_eq!(request.text, "hello");
    }

    #[test]
    fn twilio_strips_whatsapp_prefix() {
        let request = message_request_from_twilio(TwilioInbound {
            wa_id: Some(String::new()),
            from: Some("whatsapp:+919812345678".to_string()),
            body: None,
        });
        assert_eq!(request.phone, "+919812345678");
        assert_eq!(request.text, "");
    }

    #[test]
    fn admin_key_comparison() {
        assert!(constant_time_eq("dev-arogya-key", "dev-arogya-key"));
        assert!(!constant_time_eq("dev-arogya-key", "dev-arogya-kez"));
        assert!(!constant_time_eq("dev-arogya-key", "dev-arogya"));
        assert!(!constant_time_eq("", "dev-arogya-key"));
    }

    #[test]
    fn admin_paths_are_guarded() {
        assert!(is_admin_endpoint("/admin/broadcast"));
        assert!(!is_admin_endpoint("/webhook"));
        assert!(is_inbound_endpoint("/twilio"));
        assert!(!is_inbound_endpoint("/health"));
    }
}
