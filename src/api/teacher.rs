use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::validation::{image_mime_type, validate_image_upload};
use crate::core::{metrics, state::AppState};
use crate::quiz::{SessionError, TestStatus};
use crate::schemas::quiz::{
    DashboardResponse, MarkAnswerRequest, QuestionPaperResponse, QuestionResponse, StatusResponse,
};
use crate::services::question_extraction::{ExtractionError, PaperImage};

const READ_FAILURE: &str = "Failed to read the file.";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/questions/upload", post(upload_question_paper))
        .route("/answer-key/:question_index", put(mark_answer))
        .route("/start", post(start_test))
        .route("/end", post(end_test))
        .route("/reset", post(reset_test))
        .route("/dashboard", get(dashboard))
}

async fn upload_question_paper(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<QuestionPaperResponse>), ApiError> {
    let status = state.session().read().await.status();
    if status != TestStatus::Setup {
        return Err(SessionError::NotInSetup(status).into());
    }

    let image = read_paper_image(&state, &mut multipart).await?;

    // The session lock is not held while the OCR backend works; load_questions
    // re-checks the status once the questions are back.
    let questions = match state.extractor().extract(&image).await {
        Ok(questions) => questions,
        Err(err) => {
            metrics::record_extraction_failure(failure_reason(&err));
            return Err(err.into());
        }
    };

    let mut session = state.session().write().await;
    let test_code = session.load_questions(questions)?.to_string();
    metrics::record_extraction(session.questions().len());

    Ok((
        StatusCode::CREATED,
        Json(QuestionPaperResponse {
            status: session.status(),
            test_code,
            questions: QuestionResponse::list(session.questions()),
        }),
    ))
}

async fn read_paper_image(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<PaperImage, ApiError> {
    let uploads = state.settings().uploads();
    let max_bytes = uploads.max_upload_bytes();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, uploads.max_upload_size_mb))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("paper.jpg").to_string();
        let content_type = image_mime_type(&filename, field.content_type());
        validate_image_upload(&filename, &content_type, &uploads.allowed_image_extensions)?;

        let mut bytes = Vec::new();
        while let Some(chunk) =
            field.chunk().await.map_err(|err| multipart_error(err, uploads.max_upload_size_mb))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(too_large(uploads.max_upload_size_mb));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ApiError::BadRequest(READ_FAILURE.to_string()));
        }

        return Ok(PaperImage { bytes, content_type });
    }

    Err(ApiError::BadRequest(READ_FAILURE.to_string()))
}

/// The body limit layer surfaces as a multipart error; keep it a 413.
fn multipart_error(err: MultipartError, max_upload_size_mb: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_upload_size_mb)
    } else {
        ApiError::BadRequest(READ_FAILURE.to_string())
    }
}

fn too_large(max_upload_size_mb: u64) -> ApiError {
    ApiError::PayloadTooLarge(format!("File size exceeds {max_upload_size_mb}MB limit"))
}

fn failure_reason(err: &ExtractionError) -> &'static str {
    match err {
        ExtractionError::EmptyResponse => "empty",
        ExtractionError::MalformedQuestions => "malformed",
        ExtractionError::InvalidFormat => "invalid_format",
        ExtractionError::Upstream(_) => "upstream",
    }
}

async fn mark_answer(
    Path(question_index): Path<usize>,
    State(state): State<AppState>,
    Json(payload): Json<MarkAnswerRequest>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let mut session = state.session().write().await;
    session.mark_answer(question_index, payload.option_index)?;
    Ok(Json(DashboardResponse::from_session(&session)))
}

async fn start_test(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let mut session = state.session().write().await;
    session.start()?;
    Ok(Json(StatusResponse::from_session(&session)))
}

async fn end_test(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let mut session = state.session().write().await;
    session.end()?;
    Ok(Json(StatusResponse::from_session(&session)))
}

async fn reset_test(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut session = state.session().write().await;
    session.reset();
    Json(StatusResponse::from_session(&session))
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let session = state.session().read().await;
    Json(DashboardResponse::from_session(&session))
}
