//! Live quiz domain: the single in-memory test session, its answer key and
//! scoring.

pub(crate) mod errors;
pub(crate) mod model;
pub(crate) mod scoring;
pub(crate) mod session;
pub(crate) mod test_code;

pub(crate) use errors::SessionError;
pub(crate) use model::{AnswerKey, Answers, Question, Submission, TestStatus};
pub(crate) use session::Session;
