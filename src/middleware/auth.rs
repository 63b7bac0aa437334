use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// The authenticated caller, inserted into request extensions by [`require_bearer_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    ttl: chrono::Duration,
) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
        role: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data.claims,
        Err(_) => return unauthorized("invalid_token"),
    };

    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return unauthorized("invalid_subject");
    };

    req.extensions_mut().insert(AuthUser { user_id });
    req.extensions_mut().insert(claims);
    next.run(req).await
}
