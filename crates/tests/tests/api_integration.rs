use std::sync::Arc;
use std::time::Duration;

use arogya_agents::{HealthAgent, RecordingSender};
use arogya_api::{build_app, build_router, ApiState, ServiceConfig};
use arogya_core::{reply_template, Intent, Language, StaticContentProvider};
use arogya_observability::AppMetrics;
use arogya_storage::Store;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_KEY: &str = "dev-arogya-key";

async fn app() -> Router {
    build_app(ServiceConfig::default())
        .await
        .expect("app should build")
}

fn app_with_recorder(sender: Arc<RecordingSender>) -> Router {
    let metrics = AppMetrics::shared();
    let agent = Arc::new(HealthAgent::new(
        Arc::new(StaticContentProvider::new()),
        sender,
        Arc::new(Store::memory()),
        metrics.clone(),
    ));
    build_router(ApiState::new(agent, metrics, &ServiceConfig::default()))
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", ADMIN_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|value| value.to_str().ok()),
        Some("nosniff")
    );

    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["subscribers"], 0);
    assert_eq!(parsed["langs"], json!(["en", "hi", "te", "kn", "ta"]));
    assert_eq!(parsed["store"], "memory");
    assert_eq!(parsed["sender"], "log");
    assert!(parsed["time"].as_str().is_some());
}

#[tokio::test]
async fn webhook_answers_romanized_hindi() {
    let response = app()
        .await
        .oneshot(json_post(
            "/webhook",
            json!({"phone": "919000000001", "text": "namaste"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["to"], "919000000001");
    assert_eq!(parsed["lang"], "hi");
    assert_eq!(parsed["intent"], "help");
    assert_eq!(parsed["reply"], reply_template(Language::Hi, Intent::Help));
}

#[tokio::test]
async fn webhook_classifies_symptoms() {
    let response = app()
        .await
        .oneshot(json_post(
            "/webhook",
            json!({"phone": "919000000002", "text": "I have fever and cough"}),
        ))
        .await
        .unwrap();

    let parsed = read_json(response).await;
    assert_eq!(parsed["lang"], "en");
    assert_eq!(parsed["intent"], "symptoms");
    assert_eq!(
        parsed["reply"],
        "Watch for fever, cough, cold, headache. Seek a doctor for breathing issues."
    );
}

#[tokio::test]
async fn webhook_age_returns_infant_schedule() {
    let response = app()
        .await
        .oneshot(json_post(
            "/webhook",
            json!({"phone": "919000000003", "text": "my child is 1"}),
        ))
        .await
        .unwrap();

    let parsed = read_json(response).await;
    let reply = parsed["reply"].as_str().unwrap();
    assert!(reply.starts_with("Sample vaccination schedule:"));
    assert!(reply.contains("- 9-12 months: Measles/Rubella"));
    assert!(!reply.contains("Tetanus"));
}

#[tokio::test]
async fn webhook_outbreak_with_numeric_fields() {
    let response = app()
        .await
        .oneshot(json_post(
            "/webhook",
            json!({"phone": 919000000004_u64, "text": "outbreak alert please", "pincode": 560001}),
        ))
        .await
        .unwrap();

    let parsed = read_json(response).await;
    assert_eq!(parsed["to"], "919000000004");
    assert_eq!(parsed["intent"], "outbreak");
    assert!(parsed["reply"]
        .as_str()
        .unwrap()
        .ends_with("Outbreak update for 560001: Dengue risk is moderate. Remove stagnant water."));
}

#[tokio::test]
async fn webhook_honors_language_hint() {
    let response = app()
        .await
        .oneshot(json_post(
            "/webhook",
            json!({"phone": "919000000005", "text": "hello", "lang": "kn"}),
        ))
        .await
        .unwrap();

    let parsed = read_json(response).await;
    assert_eq!(parsed["lang"], "kn");
}

#[tokio::test]
async fn malformed_webhook_body_is_an_empty_message() {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "text/plain")
        .body(Body::from("this is {not json"))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["to"], "");
    assert_eq!(parsed["lang"], "en");
    assert_eq!(parsed["intent"], "greet");
}

#[tokio::test]
async fn twilio_form_strips_whatsapp_prefix() {
    let request = Request::builder()
        .method("POST")
        .uri("/twilio")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("From=whatsapp%3A%2B919812345678&Body=vanakkam"))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["to"], "+919812345678");
    assert_eq!(parsed["lang"], "ta");
}

#[tokio::test]
async fn twilio_prefers_wa_id() {
    let request = Request::builder()
        .method("POST")
        .uri("/twilio")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("WaId=919812345678&From=whatsapp%3A%2B919812345678&Body=hello"))
        .unwrap();

    let parsed = read_json(app().await.oneshot(request).await.unwrap()).await;
    assert_eq!(parsed["to"], "919812345678");
    assert_eq!(parsed["intent"], "greet");
}

#[tokio::test]
async fn admin_routes_require_api_key() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(json_post(
            "/admin/subscribe",
            json!({"phone": "919000000010", "lang": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_post("/admin/broadcast", json!({"message_en": "hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_rejects_near_miss_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/admin/subscribe")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-arogya-kez")
        .body(Body::from(json!({"phone": "919000000012", "lang": "hi"}).to_string()))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn subscribe_rejects_unknown_language() {
    let response = app()
        .await
        .oneshot(admin_post(
            "/admin/subscribe",
            json!({"phone": "919000000011", "lang": "fr"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed = read_json(response).await;
    assert_eq!(parsed["error"], "unsupported_language");
}

#[tokio::test]
async fn subscribe_then_broadcast_localizes() {
    let sender = Arc::new(RecordingSender::new());
    let app = app_with_recorder(sender.clone());

    for (phone, lang) in [("911", "hi"), ("912", "te")] {
        let response = app
            .clone()
            .oneshot(admin_post(
                "/admin/subscribe",
                json!({"phone": phone, "lang": lang}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(admin_post(
            "/admin/broadcast",
            json!({"message_en": "Polio drive on Sunday", "message_hi": "रविवार को पोलियो अभियान"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = read_json(response).await;
    assert_eq!(report["count"], 2);
    assert_eq!(report["details"][0]["lang"], "hi");
    assert_eq!(report["details"][1]["sent"], "yes");
    assert_eq!(
        sender.sent(),
        vec![
            ("911".to_string(), "रविवार को पोलियो अभियान".to_string()),
            ("912".to_string(), "Polio drive on Sunday".to_string()),
        ]
    );

    let health = read_json(
        app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(health["subscribers"], 2);
}

#[tokio::test]
async fn webhook_reply_reaches_sender() {
    let sender = Arc::new(RecordingSender::new());
    let app = app_with_recorder(sender.clone());

    let parsed = read_json(
        app.oneshot(json_post(
            "/webhook",
            json!({"phone": "919000000020", "text": "vaccine info"}),
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(parsed["intent"], "vaccine");

    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "919000000020");
    assert_eq!(sent[0].1, parsed["reply"].as_str().unwrap());
}

#[tokio::test]
async fn webhook_is_rate_limited_per_client() {
    let config = ServiceConfig {
        rate_limit_max: 2,
        ..ServiceConfig::default()
    };
    let app = build_app(config).await.expect("app should build");

    let request = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(json!({"phone": "1", "text": "hi"}).to_string()))
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(request("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(request("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app.oneshot(request("10.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
