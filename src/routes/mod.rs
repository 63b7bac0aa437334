pub mod health;
pub mod payment;
pub mod quiz;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::require_bearer_auth;
use crate::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let quiz_api = Router::new()
        .route("/api/quizzes/:quiz_id/attempts", post(quiz::create_attempt))
        .route(
            "/api/quizzes/:quiz_id/attempts/reset",
            post(quiz::reset_attempt),
        )
        .route(
            "/api/quizzes/:quiz_id/best-attempt",
            get(quiz::get_best_attempt),
        )
        .route(
            "/api/attempts/:id/answers",
            get(quiz::list_answers).post(quiz::save_answer),
        )
        .route("/api/attempts/:id/progress", patch(quiz::update_progress))
        .route("/api/attempts/:id/finish", post(quiz::finish_quiz))
        .route("/api/attempts/:id/status", get(quiz::get_status))
        .route(
            "/api/questions/:id/justification",
            put(quiz::save_justification),
        );

    let payment_api = Router::new()
        .route("/api/payments", post(payment::initiate_payment))
        .route("/api/payments/:id", get(payment::get_payment))
        .route("/api/payments/:id/verify", post(payment::verify_payment));

    let authenticated = quiz_api
        .merge(payment_api)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/webhook/notchpay", post(webhook::handle_notchpay))
        .merge(authenticated)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
