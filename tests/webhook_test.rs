use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use quiz_backend::config::{Config, LogFormat, DEFAULT_NOTCHPAY_BASE_URL};
use quiz_backend::database::Stores;
use quiz_backend::error::Result;
use quiz_backend::middleware::auth::issue_token;
use quiz_backend::routes::webhook::SIGNATURE_HEADER;
use quiz_backend::services::payment_gateway::{
    ChargeRequest, ChargeResponse, InitializePayment, InitializedPayment, PaymentGateway,
    VerifiedPayment,
};
use quiz_backend::utils::signature::sign;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const JWT_SECRET: &str = "test_secret_key";
const HASH_KEY: &str = "whsec_test";

/// Gateway that accepts every request; initialization echoes the merchant reference.
struct AcceptingGateway;

#[async_trait]
impl PaymentGateway for AcceptingGateway {
    async fn initialize(&self, request: InitializePayment) -> Result<InitializedPayment> {
        Ok(InitializedPayment {
            reference: format!("trx.{}", request.reference),
            authorization_url: Some(format!("https://pay.notchpay.co/{}", request.reference)),
            status: "pending".into(),
        })
    }

    async fn charge(&self, _reference: String, _request: ChargeRequest) -> Result<ChargeResponse> {
        Ok(ChargeResponse {
            status: "processing".into(),
            message: None,
        })
    }

    async fn verify(&self, reference: String) -> Result<VerifiedPayment> {
        Ok(VerifiedPayment {
            reference,
            status: "pending".into(),
            amount: None,
        })
    }
}

fn test_config(hash_key: Option<&str>) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: JWT_SECRET.into(),
        notchpay_public_key: "pk_test".into(),
        notchpay_hash_key: hash_key.map(str::to_string),
        notchpay_base_url: DEFAULT_NOTCHPAY_BASE_URL.into(),
        payment_callback_url: None,
        payment_currency: "XAF".into(),
        attempt_ttl_hours: None,
        log_format: LogFormat::Text,
    }
}

fn setup_app(hash_key: Option<&str>) -> Router {
    let (stores, _) = Stores::memory();
    let state = quiz_backend::AppState::with_gateway(
        test_config(hash_key),
        stores,
        Arc::new(AcceptingGateway),
    );
    quiz_backend::routes::router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhook/notchpay")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Starts a hosted-checkout payment over HTTP and returns `(payment_id, gateway_reference, auth)`.
async fn create_payment(app: &Router) -> (String, String, String) {
    let token = issue_token(JWT_SECRET, Uuid::new_v4(), chrono::Duration::hours(1)).unwrap();
    let auth = format!("Bearer {}", token);
    let req = Request::builder()
        .method("POST")
        .uri("/api/payments")
        .header("content-type", "application/json")
        .header("authorization", auth.clone())
        .body(Body::from(
            json!({ "purpose": "course:rust-101", "amount": 2500 }).to_string(),
        ))
        .unwrap();
    let (status, outcome) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["next_action"]["type"], "redirect_to_checkout");
    assert_eq!(outcome["payment"]["status"], "pending");

    (
        outcome["payment"]["id"].as_str().unwrap().to_string(),
        outcome["payment"]["gateway_reference"]
            .as_str()
            .unwrap()
            .to_string(),
        auth,
    )
}

#[tokio::test]
async fn signed_webhook_completes_the_payment() {
    let app = setup_app(Some(HASH_KEY));
    let (payment_id, reference, auth) = create_payment(&app).await;

    let body = json!({
        "event": "payment.complete",
        "data": { "reference": reference, "status": "complete" }
    })
    .to_string();
    let signature = sign(HASH_KEY, body.as_bytes()).unwrap();

    let (status, ack) = send(&app, webhook_request(&body, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["received"], true);
    assert_eq!(ack["matched"], true);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/payments/{}", payment_id))
        .header("authorization", auth)
        .body(Body::empty())
        .unwrap();
    let (status, payment) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "completed");
}

#[tokio::test]
async fn webhook_rejects_missing_or_wrong_signatures() {
    let app = setup_app(Some(HASH_KEY));
    let body = json!({
        "event": "payment.complete",
        "data": { "reference": "trx.any" }
    })
    .to_string();

    let (status, err) = send(&app, webhook_request(&body, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "missing_webhook_signature");

    let forged = sign("some_other_key", body.as_bytes()).unwrap();
    let (status, err) = send(&app, webhook_request(&body, Some(&forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "invalid_webhook_signature");

    // Signature over a different body.
    let signature = sign(HASH_KEY, b"{}").unwrap();
    let (status, _) = send(&app, webhook_request(&body, Some(&signature))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_is_refused_when_no_hash_key_is_configured() {
    let app = setup_app(None);
    let body = json!({ "event": "payment.complete", "data": { "reference": "trx.any" } }).to_string();
    let signature = sign(HASH_KEY, body.as_bytes()).unwrap();

    let (status, err) = send(&app, webhook_request(&body, Some(&signature))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "webhook_not_configured");
}

#[tokio::test]
async fn webhook_for_unknown_reference_is_acknowledged_unmatched() {
    let app = setup_app(Some(HASH_KEY));
    let body = json!({
        "event": "payment.failed",
        "data": { "reference": "trx.nobody" }
    })
    .to_string();
    let signature = sign(HASH_KEY, body.as_bytes()).unwrap().to_uppercase();

    let (status, ack) = send(&app, webhook_request(&body, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matched"], false);
}

#[tokio::test]
async fn signed_but_malformed_webhook_is_a_bad_request() {
    let app = setup_app(Some(HASH_KEY));
    let body = r#"{"event": "payment.complete"}"#;
    let signature = sign(HASH_KEY, body.as_bytes()).unwrap();

    let (status, _) = send(&app, webhook_request(body, Some(&signature))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
