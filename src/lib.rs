pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod quiz;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::question_extraction::GeminiQuestionExtractor;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    if settings.ocr().api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; question paper uploads will fail");
    }

    let extractor = GeminiQuestionExtractor::from_settings(&settings)?;
    let state = AppState::new(settings, Arc::new(extractor));

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        model = %state.settings().ocr().model,
        "SnapQuiz API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}
