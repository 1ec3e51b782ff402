use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::config::Settings;
use crate::quiz::Question;

const EXTRACTION_PROMPT: &str = "You are an expert Optical Character Recognition (OCR) system specialized in math question papers.
Your task is to meticulously extract all multiple-choice math questions from the provided image.
For each question, you must identify the question text and all its corresponding options. Pay close attention to mathematical notations, symbols, and equations.
Your response must be a valid JSON array of objects conforming to the provided schema. Do not include any introductory text or markdown formatting.";

/// An uploaded question paper, already read into memory.
#[derive(Debug, Clone)]
pub(crate) struct PaperImage {
    pub(crate) bytes: Vec<u8>,
    pub(crate) content_type: String,
}

#[derive(Debug, Error)]
pub(crate) enum ExtractionError {
    #[error("AI returned an empty response. The image might be unclear or contain no questions.")]
    EmptyResponse,
    #[error(
        "AI failed to parse questions correctly. Please try a different image or ensure questions are in a multiple-choice format."
    )]
    MalformedQuestions,
    #[error("The AI returned an invalid format. Please try again with a clearer image.")]
    InvalidFormat,
    #[error(
        "Failed to parse questions from the image. Please ensure the image is clear and contains standard multiple-choice questions."
    )]
    Upstream(#[source] anyhow::Error),
}

#[async_trait]
pub(crate) trait QuestionExtractor: Send + Sync {
    async fn extract(&self, image: &PaperImage) -> Result<Vec<Question>, ExtractionError>;
}

/// Gemini `generateContent` with a JSON response schema.
#[derive(Debug, Clone)]
pub(crate) struct GeminiQuestionExtractor {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiQuestionExtractor {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.ocr().request_timeout_seconds);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ocr().api_key.clone(),
            base_url: settings.ocr().base_url.trim_end_matches('/').to_string(),
            model: settings.ocr().model.clone(),
        })
    }

    async fn generate(&self, image: &PaperImage) -> anyhow::Result<Value> {
        let endpoint = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = build_request(image);

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        let status = response.status();
        let raw_body = response.text().await.context("Failed to read Gemini response")?;
        let parsed = serde_json::from_str::<Value>(&raw_body).map_err(|err| {
            anyhow::anyhow!(
                "Gemini returned non-JSON body (status {}): {}: {}",
                status,
                err,
                raw_body
            )
        })?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Gemini request failed (status {}): {}",
                status,
                extract_error_message(&parsed)
            ));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl QuestionExtractor for GeminiQuestionExtractor {
    async fn extract(&self, image: &PaperImage) -> Result<Vec<Question>, ExtractionError> {
        let timer = Instant::now();
        tracing::info!(
            model = %self.model,
            bytes = image.bytes.len(),
            content_type = %image.content_type,
            "Sending question extraction request"
        );

        let body = self.generate(image).await.map_err(|err| {
            tracing::error!(error = %format!("{err:#}"), "Gemini question extraction failed");
            ExtractionError::Upstream(err)
        })?;

        let questions = parse_questions(&response_text(&body))?;

        tracing::info!(
            question_count = questions.len(),
            duration_seconds = timer.elapsed().as_secs_f64(),
            "Question extraction completed"
        );

        Ok(questions)
    }
}

fn build_request(image: &PaperImage) -> Value {
    json!({
        "contents": [{
            "parts": [
                {
                    "inline_data": {
                        "mime_type": image.content_type,
                        "data": STANDARD.encode(&image.bytes),
                    }
                },
                {"text": EXTRACTION_PROMPT}
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": {
                            "type": "STRING",
                            "description": "The full text of the question, including any mathematical notations."
                        },
                        "options": {
                            "type": "ARRAY",
                            "items": {"type": "STRING"},
                            "description": "The possible answers for the question."
                        }
                    },
                    "required": ["question", "options"]
                }
            }
        }
    })
}

/// Concatenated text parts of the first candidate; empty when there are none.
fn response_text(body: &Value) -> String {
    body.get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_questions(text: &str) -> Result<Vec<Question>, ExtractionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let parsed: Value = serde_json::from_str(text).map_err(|_| ExtractionError::InvalidFormat)?;
    let items = parsed.as_array().ok_or(ExtractionError::MalformedQuestions)?;
    if items.is_empty() {
        return Err(ExtractionError::MalformedQuestions);
    }

    items.iter().map(parse_question).collect()
}

fn parse_question(item: &Value) -> Result<Question, ExtractionError> {
    let text = item
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(ExtractionError::MalformedQuestions)?;

    let options = item
        .get("options")
        .and_then(Value::as_array)
        .ok_or(ExtractionError::MalformedQuestions)?
        .iter()
        .map(|option| match option {
            Value::String(value) => Ok(value.trim().to_string()),
            Value::Number(value) => Ok(value.to_string()),
            _ => Err(ExtractionError::MalformedQuestions),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Question { text: text.to_string(), options })
}

fn extract_error_message(payload: &Value) -> String {
    payload
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("message").and_then(Value::as_str))
        .unwrap_or("unknown_error")
        .to_string()
}
