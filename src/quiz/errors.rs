use thiserror::Error;

use super::model::TestStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SessionError {
    #[error("No questions were found in the uploaded image.")]
    NoQuestions,
    #[error("Question {index} has no options.")]
    QuestionWithoutOptions { index: usize },
    #[error("Questions and answers can only be changed before the test starts (test is {0}).")]
    NotInSetup(TestStatus),
    #[error("Question {index} does not exist (the test has {count} questions).")]
    QuestionOutOfRange { index: usize, count: usize },
    #[error("Option {option} does not exist for question {question} ({count} options).")]
    OptionOutOfRange { question: usize, option: usize, count: usize },
    #[error("Please ensure all questions have a correct answer marked before starting the test.")]
    IncompleteAnswerKey,
    #[error("Cannot {action} a test that is {status}.")]
    InvalidTransition { action: &'static str, status: TestStatus },
    #[error("Please enter your name.")]
    MissingName,
    #[error("Please enter the test code.")]
    MissingCode,
    #[error("Invalid test code.")]
    InvalidCode,
    #[error("The test is not currently live. Please wait for the teacher to start it.")]
    NotLive,
    #[error("A submission for '{0}' has already been recorded.")]
    DuplicateSubmission(String),
    #[error("No submission found for '{0}'.")]
    SubmissionNotFound(String),
}
