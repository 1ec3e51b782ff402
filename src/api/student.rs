use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::{metrics, state::AppState};
use crate::quiz::test_code::normalize_test_code;
use crate::schemas::quiz::{JoinRequest, JoinResponse, QuestionResponse, ResultResponse, SubmitRequest};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/join", post(join_test))
        .route("/submit", post(submit_test))
        .route("/result", post(get_result))
}

async fn join_test(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session = state.session().read().await;
    let questions = session.join(&payload.student_name, &payload.test_code)?;

    tracing::info!(student = %payload.student_name.trim(), "Student joined");

    Ok(Json(JoinResponse {
        student_name: payload.student_name.trim().to_string(),
        test_code: normalize_test_code(&payload.test_code),
        questions: QuestionResponse::list(questions),
    }))
}

async fn submit_test(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut session = state.session().write().await;
    let submission =
        session.submit(&payload.student_name, &payload.test_code, payload.answers)?.clone();
    let review = session.review(&submission);

    metrics::record_submission(review.score, review.total);

    Ok((StatusCode::CREATED, Json(ResultResponse::new(&submission, review))))
}

async fn get_result(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<ResultResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session = state.session().read().await;
    let submission = session.submission_for(&payload.student_name, &payload.test_code)?;
    let review = session.review(submission);

    Ok(Json(ResultResponse::new(submission, review)))
}
