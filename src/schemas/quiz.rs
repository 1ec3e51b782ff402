use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::api::validation::MAX_STUDENT_NAME_LEN;
use crate::quiz::scoring::SubmissionReview;
use crate::quiz::{AnswerKey, Answers, Question, Session, Submission, TestStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct MarkAnswerRequest {
    #[serde(alias = "optionIndex")]
    pub(crate) option_index: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct JoinRequest {
    #[serde(default, alias = "studentName")]
    #[validate(length(max = MAX_STUDENT_NAME_LEN, message = "student_name is too long"))]
    pub(crate) student_name: String,
    #[serde(default, alias = "testCode")]
    #[validate(length(max = 32, message = "test_code is too long"))]
    pub(crate) test_code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitRequest {
    #[serde(default, alias = "studentName")]
    #[validate(length(max = MAX_STUDENT_NAME_LEN, message = "student_name is too long"))]
    pub(crate) student_name: String,
    #[serde(default, alias = "testCode")]
    #[validate(length(max = 32, message = "test_code is too long"))]
    pub(crate) test_code: String,
    #[serde(default)]
    pub(crate) answers: Answers,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
}

impl QuestionResponse {
    pub(crate) fn list(questions: &[Question]) -> Vec<Self> {
        questions
            .iter()
            .enumerate()
            .map(|(index, question)| Self {
                index,
                text: question.text.clone(),
                options: question.options.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) status: TestStatus,
    pub(crate) test_code: Option<String>,
    pub(crate) question_count: usize,
    pub(crate) marked_count: usize,
    pub(crate) ready_to_start: bool,
}

impl StatusResponse {
    pub(crate) fn from_session(session: &Session) -> Self {
        Self {
            status: session.status(),
            test_code: session.test_code().map(str::to_string),
            question_count: session.questions().len(),
            marked_count: session.answer_key().len(),
            ready_to_start: session.is_ready_to_start(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionPaperResponse {
    pub(crate) status: TestStatus,
    pub(crate) test_code: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionSummary {
    pub(crate) student_name: String,
    pub(crate) score: usize,
    pub(crate) total: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) submitted_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    #[serde(flatten)]
    pub(crate) status: StatusResponse,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) answer_key: AnswerKey,
    pub(crate) submissions: Vec<SubmissionSummary>,
}

impl DashboardResponse {
    pub(crate) fn from_session(session: &Session) -> Self {
        let total = session.questions().len();
        Self {
            status: StatusResponse::from_session(session),
            questions: QuestionResponse::list(session.questions()),
            answer_key: session.answer_key().clone(),
            submissions: session
                .submissions()
                .iter()
                .map(|submission| SubmissionSummary {
                    student_name: submission.student_name.clone(),
                    score: submission.score,
                    total,
                    submitted_at: submission.submitted_at,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JoinResponse {
    pub(crate) student_name: String,
    pub(crate) test_code: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    #[serde(flatten)]
    pub(crate) review: SubmissionReview,
    pub(crate) answers: Answers,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) submitted_at: OffsetDateTime,
}

impl ResultResponse {
    pub(crate) fn new(submission: &Submission, review: SubmissionReview) -> Self {
        Self { review, answers: submission.answers.clone(), submitted_at: submission.submitted_at }
    }
}
