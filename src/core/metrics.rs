use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_extraction(question_count: usize) {
    metrics::counter!("quiz_questions_extracted_total").increment(question_count as u64);
}

pub(crate) fn record_extraction_failure(reason: &'static str) {
    metrics::counter!("quiz_ocr_failures_total", "reason" => reason).increment(1);
}

pub(crate) fn record_submission(score: usize, total: usize) {
    metrics::counter!("quiz_submissions_total").increment(1);
    if total > 0 {
        metrics::histogram!("quiz_submission_score_ratio").record(score as f64 / total as f64);
    }
}
