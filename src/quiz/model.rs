use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Question index -> chosen option index, as submitted by a student.
pub(crate) type Answers = BTreeMap<usize, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TestStatus {
    Setup,
    Live,
    Finished,
}

impl TestStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Question {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
}

/// Correct option per question index.
///
/// The key is complete only when every question has an entry; a partial key
/// is a normal intermediate state while the teacher is marking answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct AnswerKey(BTreeMap<usize, usize>);

impl AnswerKey {
    pub(crate) fn set(&mut self, question_index: usize, option_index: usize) {
        self.0.insert(question_index, option_index);
    }

    pub(crate) fn get(&self, question_index: usize) -> Option<usize> {
        self.0.get(&question_index).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_complete(&self, question_count: usize) -> bool {
        question_count > 0 && (0..question_count).all(|index| self.0.contains_key(&index))
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<(usize, usize)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Submission {
    pub(crate) student_name: String,
    pub(crate) answers: Answers,
    pub(crate) score: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) submitted_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_key_completeness_is_all_or_nothing() {
        let mut key = AnswerKey::default();
        assert!(!key.is_complete(2));

        key.set(0, 1);
        assert!(!key.is_complete(2));

        key.set(1, 0);
        assert!(key.is_complete(2));
    }

    #[test]
    fn answer_key_ignores_entries_beyond_question_count() {
        let key: AnswerKey = [(0, 0), (5, 1)].into_iter().collect();
        assert!(!key.is_complete(2));
        assert_eq!(key.len(), 2);
    }

    #[test]
    fn empty_question_list_never_has_a_complete_key() {
        assert!(!AnswerKey::default().is_complete(0));
    }
}
