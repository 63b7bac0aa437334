use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::quiz_dto::{
    BestAttemptResponse, FinishQuizResponse, SaveAnswerRequest, SaveAnswerResponse,
    SaveJustificationRequest, UpdateProgressRequest,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::justification::QuestionJustification;
use crate::models::quiz_attempt::{AttemptStatusSnapshot, QuizAttempt};
use crate::models::user_answer::UserAnswer;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
) -> Result<(StatusCode, Json<QuizAttempt>)> {
    let attempt = state
        .quiz_service
        .create_attempt(quiz_id, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

#[axum::debug_handler]
pub async fn reset_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
) -> Result<(StatusCode, Json<QuizAttempt>)> {
    let attempt = state
        .quiz_service
        .reset_attempt(quiz_id, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/best-attempt",
    params(
        ("quiz_id" = Uuid, Path, description = "Quiz ID")
    ),
    responses(
        (status = 200, description = "Highest-scoring completed attempt, if any", body = BestAttemptResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
)]
pub async fn get_best_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<BestAttemptResponse>> {
    let attempt = state
        .quiz_service
        .get_best_attempt(quiz_id, user.user_id)
        .await?;
    Ok(Json(BestAttemptResponse { attempt }))
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SaveAnswerRequest>,
) -> Result<Json<SaveAnswerResponse>> {
    req.validate()?;
    state
        .quiz_service
        .get_owned_attempt(attempt_id, user.user_id)
        .await?;

    let question_id = req.question_id;
    let is_correct = state.quiz_service.save_answer(attempt_id, req).await?;
    Ok(Json(SaveAnswerResponse {
        saved: true,
        question_id,
        is_correct,
    }))
}

pub async fn list_answers(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<Vec<UserAnswer>>> {
    state
        .quiz_service
        .get_owned_attempt(attempt_id, user.user_id)
        .await?;
    let answers = state.quiz_service.list_attempt_answers(attempt_id).await?;
    Ok(Json(answers))
}

#[utoipa::path(
    patch,
    path = "/api/attempts/{id}/progress",
    request_body = UpdateProgressRequest,
    params(
        ("id" = Uuid, Path, description = "Quiz attempt ID")
    ),
    responses(
        (status = 200, description = "Progress checkpoint stored", body = QuizAttempt),
        (status = 400, description = "Invalid request payload"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Attempt already completed"),
    ),
)]
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<QuizAttempt>> {
    req.validate()?;
    state
        .quiz_service
        .get_owned_attempt(attempt_id, user.user_id)
        .await?;
    let attempt = state
        .quiz_service
        .update_attempt_progress(attempt_id, req.time_spent, req.current_question_index)
        .await?;
    Ok(Json(attempt))
}

#[axum::debug_handler]
pub async fn finish_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<FinishQuizResponse>> {
    state
        .quiz_service
        .get_owned_attempt(attempt_id, user.user_id)
        .await?;
    let results = state.quiz_service.finish_quiz(attempt_id).await?;
    Ok(Json(FinishQuizResponse {
        attempt_id,
        results,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attempts/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Quiz attempt ID")
    ),
    responses(
        (status = 200, description = "Attempt progress snapshot", body = AttemptStatusSnapshot),
        (status = 404, description = "Attempt not found"),
    ),
)]
pub async fn get_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<AttemptStatusSnapshot>> {
    state
        .quiz_service
        .get_owned_attempt(attempt_id, user.user_id)
        .await?;
    let snapshot = state.quiz_service.get_attempt_status(attempt_id).await?;
    Ok(Json(snapshot))
}

pub async fn save_justification(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(req): Json<SaveJustificationRequest>,
) -> Result<Json<QuestionJustification>> {
    req.validate()?;
    let saved = state
        .quiz_service
        .save_justification(question_id, req.justification.trim())
        .await?;
    Ok(Json(saved))
}
