use serde::Serialize;

use super::model::{AnswerKey, Answers, Question, Submission};

/// Number of questions in `0..question_count` whose submitted option matches
/// the key. Unanswered questions score nothing.
pub(crate) fn score(answers: &Answers, key: &AnswerKey, question_count: usize) -> usize {
    (0..question_count)
        .filter(|index| match (answers.get(index), key.get(*index)) {
            (Some(selected), Some(correct)) => *selected == correct,
            _ => false,
        })
        .count()
}

pub(crate) fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReviewItem {
    pub(crate) index: usize,
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
    pub(crate) selected: Option<usize>,
    pub(crate) correct: Option<usize>,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmissionReview {
    pub(crate) student_name: String,
    pub(crate) score: usize,
    pub(crate) total: usize,
    pub(crate) percentage: u32,
    pub(crate) items: Vec<ReviewItem>,
}

pub(crate) fn review(
    submission: &Submission,
    questions: &[Question],
    key: &AnswerKey,
) -> SubmissionReview {
    let items = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = submission.answers.get(&index).copied();
            let correct = key.get(index);
            ReviewItem {
                index,
                question: question.text.clone(),
                options: question.options.clone(),
                selected,
                correct,
                is_correct: selected.is_some() && selected == correct,
            }
        })
        .collect();

    SubmissionReview {
        student_name: submission.student_name.clone(),
        score: submission.score,
        total: questions.len(),
        percentage: percentage(submission.score, questions.len()),
        items,
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn key(entries: &[(usize, usize)]) -> AnswerKey {
        entries.iter().copied().collect()
    }

    fn answers(entries: &[(usize, usize)]) -> Answers {
        entries.iter().copied().collect()
    }

    #[test]
    fn scores_matching_answers() {
        let key = key(&[(0, 1), (1, 0), (2, 2)]);
        let submitted = answers(&[(0, 1), (1, 1), (2, 2)]);
        assert_eq!(score(&submitted, &key, 3), 2);
    }

    #[test]
    fn submission_identical_to_key_scores_full_marks() {
        for count in 1..8 {
            let entries: Vec<(usize, usize)> = (0..count).map(|i| (i, (i * 7) % 4)).collect();
            let key = key(&entries);
            let submitted = answers(&entries);
            assert_eq!(score(&submitted, &key, count), count);
        }
    }

    #[test]
    fn no_overlap_scores_zero() {
        let key = key(&[(0, 0), (1, 0), (2, 0)]);
        let submitted = answers(&[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(score(&submitted, &key, 3), 0);
    }

    #[test]
    fn unanswered_questions_are_incorrect() {
        let key = key(&[(0, 0), (1, 1)]);
        assert_eq!(score(&Answers::new(), &key, 2), 0);
        assert_eq!(score(&answers(&[(1, 1)]), &key, 2), 1);
    }

    #[test]
    fn answers_beyond_question_count_are_ignored() {
        let key = key(&[(0, 0), (1, 1), (7, 2)]);
        let submitted = answers(&[(0, 0), (7, 2)]);
        assert_eq!(score(&submitted, &key, 2), 1);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn review_marks_each_question() {
        let questions = vec![
            Question { text: "1+1".into(), options: vec!["1".into(), "2".into()] },
            Question { text: "2+2".into(), options: vec!["4".into(), "5".into()] },
            Question { text: "3+3".into(), options: vec!["6".into(), "7".into()] },
        ];
        let key = key(&[(0, 1), (1, 0), (2, 0)]);
        let submitted = answers(&[(0, 1), (1, 1)]);
        let submission = Submission {
            student_name: "Ada".into(),
            score: score(&submitted, &key, questions.len()),
            answers: submitted,
            submitted_at: OffsetDateTime::now_utc(),
        };

        let review = review(&submission, &questions, &key);
        assert_eq!(review.score, 1);
        assert_eq!(review.total, 3);
        assert_eq!(review.percentage, 33);
        assert!(review.items[0].is_correct);
        assert!(!review.items[1].is_correct);
        assert_eq!(review.items[1].selected, Some(1));
        assert_eq!(review.items[1].correct, Some(0));
        assert_eq!(review.items[2].selected, None);
        assert!(!review.items[2].is_correct);
    }
}
