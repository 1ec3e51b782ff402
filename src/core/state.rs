use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::config::Settings;
use crate::quiz::Session;
use crate::services::question_extraction::QuestionExtractor;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    session: RwLock<Session>,
    extractor: Arc<dyn QuestionExtractor>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, extractor: Arc<dyn QuestionExtractor>) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                session: RwLock::new(Session::default()),
                extractor,
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// The single quiz session. Hold the guard for one operation only; never
    /// across the OCR call.
    pub(crate) fn session(&self) -> &RwLock<Session> {
        &self.inner.session
    }

    pub(crate) fn extractor(&self) -> &dyn QuestionExtractor {
        self.inner.extractor.as_ref()
    }
}
