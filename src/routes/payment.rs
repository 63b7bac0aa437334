use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::payment_dto::InitiatePaymentRequest;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::payment::Payment;
use crate::services::payment_service::PaymentOutcome;
use crate::AppState;

#[axum::debug_handler]
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentOutcome>)> {
    req.validate()?;
    tracing::info!(user_id = %user.user_id, purpose = %req.purpose, amount = req.amount, "initiating payment");
    let outcome = state
        .payment_service
        .initiate_payment(user.user_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment retrieved successfully", body = Payment),
        (status = 404, description = "Payment not found"),
    ),
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>> {
    let payment = state
        .payment_service
        .get_payment(user.user_id, payment_id)
        .await?;
    Ok(Json(payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/{id}/verify",
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment status refreshed from the gateway", body = Payment),
        (status = 400, description = "Payment was never initialized with the gateway"),
        (status = 404, description = "Payment not found"),
        (status = 502, description = "Gateway error"),
    ),
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>> {
    let payment = state
        .payment_service
        .verify_payment(user.user_id, payment_id)
        .await?;
    Ok(Json(payment))
}
