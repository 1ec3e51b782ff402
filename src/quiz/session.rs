use time::OffsetDateTime;

use super::errors::SessionError;
use super::model::{AnswerKey, Answers, Question, Submission, TestStatus};
use super::scoring::{self, SubmissionReview};
use super::test_code::{generate_test_code, normalize_test_code};

/// The one live test this process hosts.
///
/// Status only moves forward (`setup -> live -> finished`); `reset` is the
/// only way back and drops everything else with it.
#[derive(Debug)]
pub(crate) struct Session {
    status: TestStatus,
    questions: Vec<Question>,
    answer_key: AnswerKey,
    submissions: Vec<Submission>,
    test_code: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            status: TestStatus::Setup,
            questions: Vec::new(),
            answer_key: AnswerKey::default(),
            submissions: Vec::new(),
            test_code: None,
        }
    }
}

impl Session {
    pub(crate) fn status(&self) -> TestStatus {
        self.status
    }

    pub(crate) fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub(crate) fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }

    pub(crate) fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub(crate) fn test_code(&self) -> Option<&str> {
        self.test_code.as_deref()
    }

    pub(crate) fn is_ready_to_start(&self) -> bool {
        self.answer_key.is_complete(self.questions.len())
    }

    /// Replaces the question paper. The old answer key is dropped and a new
    /// join code is issued.
    pub(crate) fn load_questions(&mut self, questions: Vec<Question>) -> Result<&str, SessionError> {
        if self.status != TestStatus::Setup {
            return Err(SessionError::NotInSetup(self.status));
        }
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        if let Some(index) = questions.iter().position(|question| question.options.is_empty()) {
            return Err(SessionError::QuestionWithoutOptions { index });
        }

        self.questions = questions;
        self.answer_key.clear();
        self.submissions.clear();
        let code = self.test_code.insert(generate_test_code());

        tracing::info!(
            question_count = self.questions.len(),
            test_code = %code,
            "Question paper loaded"
        );

        Ok(code.as_str())
    }

    pub(crate) fn mark_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        if self.status != TestStatus::Setup {
            return Err(SessionError::NotInSetup(self.status));
        }
        self.check_indices(question_index, option_index)?;

        self.answer_key.set(question_index, option_index);
        Ok(())
    }

    pub(crate) fn start(&mut self) -> Result<(), SessionError> {
        if self.status != TestStatus::Setup {
            return Err(SessionError::InvalidTransition { action: "start", status: self.status });
        }
        if !self.is_ready_to_start() {
            return Err(SessionError::IncompleteAnswerKey);
        }

        self.status = TestStatus::Live;
        tracing::info!(question_count = self.questions.len(), "Test started");
        Ok(())
    }

    pub(crate) fn end(&mut self) -> Result<(), SessionError> {
        if self.status != TestStatus::Live {
            return Err(SessionError::InvalidTransition { action: "end", status: self.status });
        }

        self.status = TestStatus::Finished;
        tracing::info!(submissions = self.submissions.len(), "Test ended");
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
        tracing::info!("Test session reset");
    }

    /// Validates a student's entry and hands back the questions to answer.
    pub(crate) fn join(&self, student_name: &str, code: &str) -> Result<&[Question], SessionError> {
        self.check_entry(student_name, code)?;
        if self.status != TestStatus::Live {
            return Err(SessionError::NotLive);
        }
        Ok(&self.questions)
    }

    pub(crate) fn submit(
        &mut self,
        student_name: &str,
        code: &str,
        answers: Answers,
    ) -> Result<&Submission, SessionError> {
        let student_name = self.check_entry(student_name, code)?;
        if self.status != TestStatus::Live {
            return Err(SessionError::NotLive);
        }
        if self.find_submission(&student_name).is_some() {
            return Err(SessionError::DuplicateSubmission(student_name));
        }
        for (&question_index, &option_index) in &answers {
            self.check_indices(question_index, option_index)?;
        }

        let score = scoring::score(&answers, &self.answer_key, self.questions.len());
        tracing::info!(
            student = %student_name,
            score,
            total = self.questions.len(),
            "Submission recorded"
        );

        self.submissions.push(Submission {
            student_name,
            answers,
            score,
            submitted_at: OffsetDateTime::now_utc(),
        });

        Ok(&self.submissions[self.submissions.len() - 1])
    }

    pub(crate) fn submission_for(
        &self,
        student_name: &str,
        code: &str,
    ) -> Result<&Submission, SessionError> {
        let student_name = self.check_entry(student_name, code)?;
        self.find_submission(&student_name)
            .ok_or(SessionError::SubmissionNotFound(student_name))
    }

    pub(crate) fn review(&self, submission: &Submission) -> SubmissionReview {
        scoring::review(submission, &self.questions, &self.answer_key)
    }

    fn find_submission(&self, student_name: &str) -> Option<&Submission> {
        self.submissions
            .iter()
            .find(|submission| same_student(&submission.student_name, student_name))
    }

    fn check_entry(&self, student_name: &str, code: &str) -> Result<String, SessionError> {
        let student_name = student_name.trim();
        if student_name.is_empty() {
            return Err(SessionError::MissingName);
        }
        if code.trim().is_empty() {
            return Err(SessionError::MissingCode);
        }
        match self.test_code.as_deref() {
            Some(expected) if expected == normalize_test_code(code) => {}
            _ => return Err(SessionError::InvalidCode),
        }
        Ok(student_name.to_string())
    }

    fn check_indices(&self, question_index: usize, option_index: usize) -> Result<(), SessionError> {
        let question = self.questions.get(question_index).ok_or(
            SessionError::QuestionOutOfRange {
                index: question_index,
                count: self.questions.len(),
            },
        )?;
        if option_index >= question.options.len() {
            return Err(SessionError::OptionOutOfRange {
                question: question_index,
                option: option_index,
                count: question.options.len(),
            });
        }
        Ok(())
    }
}

/// Names are matched case-insensitively, including non-ASCII letters.
fn same_student(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
