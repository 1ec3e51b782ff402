use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower::ServiceExt;

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::quiz::Question;
use crate::services::question_extraction::{ExtractionError, PaperImage, QuestionExtractor};

const MULTIPART_BOUNDARY: &str = "snapquiz-test-boundary";

/// Answer key that matches `sample_questions`.
pub(crate) const SAMPLE_KEY: [(usize, usize); 3] = [(0, 1), (1, 0), (2, 2)];

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) extractor: Arc<StubExtractor>,
    _guard: OwnedMutexGuard<()>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum StubFailure {
    Empty,
    Malformed,
    Upstream,
}

/// Stands in for the OCR backend: returns the configured paper or failure
/// and counts how often it was asked.
#[derive(Debug)]
pub(crate) struct StubExtractor {
    questions: StdMutex<Vec<Question>>,
    failure: StdMutex<Option<StubFailure>>,
    calls: AtomicUsize,
}

impl Default for StubExtractor {
    fn default() -> Self {
        Self::returning(sample_questions())
    }
}

impl StubExtractor {
    pub(crate) fn returning(questions: Vec<Question>) -> Self {
        Self {
            questions: StdMutex::new(questions),
            failure: StdMutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(failure: StubFailure) -> Self {
        let stub = Self::returning(Vec::new());
        stub.set_failure(Some(failure));
        stub
    }

    /// Changes the outcome of later calls; `None` goes back to the paper.
    pub(crate) fn set_failure(&self, failure: Option<StubFailure>) {
        *self.failure.lock().expect("stub failure lock") = failure;
    }

    pub(crate) fn set_questions(&self, questions: Vec<Question>) {
        *self.questions.lock().expect("stub questions lock") = questions;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionExtractor for StubExtractor {
    async fn extract(&self, _image: &PaperImage) -> Result<Vec<Question>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = *self.failure.lock().expect("stub failure lock");
        match failure {
            None => Ok(self.questions.lock().expect("stub questions lock").clone()),
            Some(StubFailure::Empty) => Err(ExtractionError::EmptyResponse),
            Some(StubFailure::Malformed) => Err(ExtractionError::MalformedQuestions),
            Some(StubFailure::Upstream) => {
                Err(ExtractionError::Upstream(anyhow::anyhow!("stub backend unavailable")))
            }
        }
    }
}

pub(crate) fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            text: "What is 2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
        },
        Question {
            text: "Solve x - 1 = 0".to_string(),
            options: vec!["x = 1".to_string(), "x = 0".to_string(), "x = -1".to_string()],
        },
        Question {
            text: "What is 9 / 3?".to_string(),
            options: vec!["1".to_string(), "2".to_string(), "3".to_string()],
        },
    ]
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("SNAPQUIZ_ENV", "test");
    std::env::set_var("SNAPQUIZ_STRICT_CONFIG", "0");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    for key in [
        "ENVIRONMENT",
        "SNAPQUIZ_HOST",
        "SNAPQUIZ_PORT",
        "PROJECT_NAME",
        "VERSION",
        "API_V1_STR",
        "BACKEND_CORS_ORIGINS",
        "GEMINI_API_KEY",
        "GEMINI_BASE_URL",
        "GEMINI_MODEL",
        "OCR_REQUEST_TIMEOUT",
        "MAX_UPLOAD_SIZE_MB",
        "ALLOWED_IMAGE_EXTENSIONS",
        "SNAPQUIZ_LOG_LEVEL",
        "SNAPQUIZ_LOG_JSON",
    ] {
        std::env::remove_var(key);
    }
}

pub(crate) async fn setup_test_context() -> TestContext {
    setup_test_context_with(StubExtractor::default()).await
}

pub(crate) async fn setup_test_context_with(extractor: StubExtractor) -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    build_test_context(guard, extractor)
}

/// Builds the app from whatever the environment holds right now.
pub(crate) fn build_test_context(guard: OwnedMutexGuard<()>, extractor: StubExtractor) -> TestContext {
    let settings = Settings::load().expect("settings");
    let extractor = Arc::new(extractor);
    let state = AppState::new(settings, extractor.clone());
    let app = api::router::router(state.clone());

    TestContext { state, app, extractor, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) fn image_upload_request(
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/teacher/questions/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("multipart request")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

/// Uploads the stub paper and returns the issued test code.
pub(crate) async fn upload_sample_paper(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(image_upload_request("paper.png", "image/png", b"\x89PNG fake image"))
        .await
        .expect("upload paper");

    let status = response.status();
    let body = read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body["test_code"].as_str().expect("test code").to_string()
}

pub(crate) async fn mark_answer(app: &Router, question_index: usize, option_index: usize) -> StatusCode {
    app.clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/teacher/answer-key/{question_index}"),
            Some(serde_json::json!({ "option_index": option_index })),
        ))
        .await
        .expect("mark answer")
        .status()
}

/// Uploads, marks `SAMPLE_KEY` and starts the test; returns the test code.
pub(crate) async fn start_sample_test(app: &Router) -> String {
    let code = upload_sample_paper(app).await;
    for (question_index, option_index) in SAMPLE_KEY {
        assert_eq!(mark_answer(app, question_index, option_index).await, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/teacher/start", None))
        .await
        .expect("start test");
    assert_eq!(response.status(), StatusCode::OK);

    code
}
