use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::{
    dto::payment_dto::{NotchPayWebhookEvent, WebhookAck},
    error::{Error, Result},
    utils::signature::verify_signature,
    AppState,
};

pub const SIGNATURE_HEADER: &str = "x-notch-signature";

pub async fn handle_notchpay(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    verify_notchpay_signature(&state, &headers, &body)?;

    let event: NotchPayWebhookEvent = serde_json::from_slice(&body)?;
    let matched = state.payment_service.apply_webhook(event).await?.is_some();

    Ok(Json(WebhookAck {
        received: true,
        matched,
    }))
}

fn verify_notchpay_signature(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let Some(hash_key) = state.config.notchpay_hash_key.as_deref() else {
        return Err(Error::Unauthorized("webhook_not_configured".into()));
    };
    let Some(signature_hdr) = headers.get(SIGNATURE_HEADER) else {
        return Err(Error::Unauthorized("missing_webhook_signature".into()));
    };
    let provided = signature_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_signature_header".into()))?;

    if verify_signature(hash_key, body, provided) {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_signature".into()))
    }
}
