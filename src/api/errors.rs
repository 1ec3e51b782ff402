use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::quiz::SessionError;
use crate::services::question_extraction::ExtractionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnprocessableEntity(String),
    BadGateway(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let detail = err.to_string();
        match err {
            SessionError::SubmissionNotFound(_) => ApiError::NotFound(detail),
            SessionError::NotInSetup(_)
            | SessionError::InvalidTransition { .. }
            | SessionError::NotLive
            | SessionError::DuplicateSubmission(_) => ApiError::Conflict(detail),
            SessionError::NoQuestions | SessionError::QuestionWithoutOptions { .. } => {
                ApiError::UnprocessableEntity(detail)
            }
            SessionError::QuestionOutOfRange { .. }
            | SessionError::OptionOutOfRange { .. }
            | SessionError::IncompleteAnswerKey
            | SessionError::MissingName
            | SessionError::MissingCode
            | SessionError::InvalidCode => ApiError::BadRequest(detail),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        let detail = err.to_string();
        match err {
            ExtractionError::Upstream(_) => ApiError::BadGateway(detail),
            ExtractionError::EmptyResponse
            | ExtractionError::MalformedQuestions
            | ExtractionError::InvalidFormat => ApiError::UnprocessableEntity(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadGateway(message) => {
                tracing::warn!(error = %message, "Upstream extraction failed");
                message
            }
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::PayloadTooLarge(message)
            | ApiError::UnprocessableEntity(message) => message,
        };

        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}
