// src/grading.rs

//! Exam scoring.
//!
//! Grading is a pure function over the question bank and the submitted
//! answers. Short answers are scored by a [`ShortAnswerEvaluator`] so the
//! current length heuristic can be swapped without touching the rest.

use std::collections::HashMap;

use crate::models::{
    attempt::AnswerValue,
    question::{Question, QuestionKind},
};

/// Scores a free-text answer for one question.
pub trait ShortAnswerEvaluator: Send + Sync {
    /// Returns marks in `0..=question.max_marks`.
    fn evaluate(&self, question: &Question, answer: &str) -> i32;
}

/// Placeholder evaluator: one mark per started block of `chars_per_mark`
/// characters, capped at the question's maximum. Any non-empty answer earns
/// at least one mark. It does not look at what the answer says.
#[derive(Debug, Clone)]
pub struct LengthHeuristic {
    pub chars_per_mark: usize,
}

impl Default for LengthHeuristic {
    fn default() -> Self {
        Self { chars_per_mark: 25 }
    }
}

impl ShortAnswerEvaluator for LengthHeuristic {
    fn evaluate(&self, question: &Question, answer: &str) -> i32 {
        let len = answer.trim().chars().count();
        if len == 0 || question.max_marks <= 0 {
            return 0;
        }
        let per_mark = self.chars_per_mark.max(1);
        let blocks = len.div_ceil(per_mark);
        i32::try_from(blocks)
            .unwrap_or(i32::MAX)
            .min(question.max_marks)
    }
}

/// Marks awarded for one submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub question_id: i64,
    pub submitted_value: Option<AnswerValue>,
    pub correct_option: Option<i32>,
    pub marks_awarded: i32,
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub marks_obtained: i32,
    pub total_marks: i32,

    /// One record per submitted answer that belongs to the bank, in bank order.
    pub records: Vec<AnswerRecord>,

    /// Submitted question ids that are not in the bank. They score nothing.
    pub skipped_question_ids: Vec<i64>,
}

impl GradeReport {
    pub fn percentage(&self) -> f64 {
        percentage(self.marks_obtained, self.total_marks)
    }
}

/// `100 * obtained / total`, rounded to two decimals. Zero when there is nothing to score.
pub fn percentage(marks_obtained: i32, total_marks: i32) -> f64 {
    if total_marks <= 0 {
        return 0.0;
    }
    let raw = 100.0 * f64::from(marks_obtained) / f64::from(total_marks);
    (raw * 100.0).round() / 100.0
}

pub fn is_pass(percentage: f64, pass_percentage: f64) -> bool {
    percentage >= pass_percentage
}

/// Grades a submission against the bank of one certificate.
///
/// * Questions with no submitted value score 0.
/// * MCQ answers score `max_marks` only when the submitted option number equals the key.
/// * Short answers go through `evaluator`, clamped to `0..=max_marks`.
/// * `total_marks` is the sum of `max_marks` over the whole bank.
pub fn grade(
    questions: &[Question],
    answers: &HashMap<i64, Option<AnswerValue>>,
    evaluator: &dyn ShortAnswerEvaluator,
) -> GradeReport {
    let mut marks_obtained = 0;
    let mut total_marks = 0;
    let mut records = Vec::new();

    for question in questions {
        total_marks += question.max_marks.max(0);

        let Some(submitted) = answers.get(&question.id) else {
            continue;
        };

        let marks = match (question.kind, submitted) {
            (QuestionKind::Mcq, Some(AnswerValue::Choice(choice))) => {
                match question.correct_option {
                    Some(key) if i64::from(key) == *choice => question.max_marks.max(0),
                    _ => 0,
                }
            }
            (QuestionKind::Short, Some(AnswerValue::Text(text))) => evaluator
                .evaluate(question, text)
                .clamp(0, question.max_marks.max(0)),
            _ => 0,
        };

        marks_obtained += marks;
        records.push(AnswerRecord {
            question_id: question.id,
            submitted_value: submitted.clone(),
            correct_option: question.correct_option,
            marks_awarded: marks,
        });
    }

    let mut skipped_question_ids: Vec<i64> = answers
        .keys()
        .filter(|id| !questions.iter().any(|q| q.id == **id))
        .copied()
        .collect();
    skipped_question_ids.sort_unstable();

    GradeReport {
        marks_obtained,
        total_marks,
        records,
        skipped_question_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(id: i64, correct: i32) -> Question {
        Question {
            id,
            certificate_code: "LEVEL-1".to_string(),
            position: id as i32,
            text: format!("Question {}", id),
            kind: QuestionKind::Mcq,
            max_marks: 4,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_option: Some(correct),
        }
    }

    fn short(id: i64, max_marks: i32) -> Question {
        Question {
            id,
            certificate_code: "LEVEL-2".to_string(),
            position: id as i32,
            text: "Describe low-key lighting.".to_string(),
            kind: QuestionKind::Short,
            max_marks,
            options: vec![],
            correct_option: None,
        }
    }

    fn level_one_bank() -> Vec<Question> {
        vec![mcq(1, 3), mcq(2, 2), mcq(3, 2), mcq(4, 2), mcq(5, 1)]
    }

    fn choices(pairs: &[(i64, i64)]) -> HashMap<i64, Option<AnswerValue>> {
        pairs
            .iter()
            .map(|(q, a)| (*q, Some(AnswerValue::Choice(*a))))
            .collect()
    }

    #[test]
    fn test_three_of_five_correct_passes_at_fifty() {
        let answers = choices(&[(1, 3), (2, 2), (3, 2), (4, 1), (5, 4)]);
        let report = grade(&level_one_bank(), &answers, &LengthHeuristic::default());

        assert_eq!(report.marks_obtained, 12);
        assert_eq!(report.total_marks, 20);
        assert_eq!(report.percentage(), 60.0);
        assert!(is_pass(report.percentage(), 50.0));
        assert_eq!(report.records.len(), 5);
    }

    #[test]
    fn test_two_of_five_correct_fails_at_fifty() {
        let answers = choices(&[(1, 3), (2, 2)]);
        let report = grade(&level_one_bank(), &answers, &LengthHeuristic::default());

        assert_eq!(report.marks_obtained, 8);
        assert_eq!(report.percentage(), 40.0);
        assert!(!is_pass(report.percentage(), 50.0));
    }

    #[test]
    fn test_unknown_question_skipped() {
        let answers = choices(&[(1, 3), (999, 1)]);
        let report = grade(&level_one_bank(), &answers, &LengthHeuristic::default());

        assert_eq!(report.marks_obtained, 4);
        assert_eq!(report.total_marks, 20);
        assert_eq!(report.skipped_question_ids, vec![999]);
        assert!(report.records.iter().all(|r| r.question_id != 999));
    }

    #[test]
    fn test_text_answer_to_mcq_scores_nothing() {
        let mut answers = HashMap::new();
        answers.insert(1, Some(AnswerValue::Text("3".to_string())));
        let report = grade(&level_one_bank(), &answers, &LengthHeuristic::default());
        assert_eq!(report.marks_obtained, 0);
    }

    #[test]
    fn test_empty_bank_has_zero_percentage() {
        let answers = choices(&[(1, 1)]);
        let report = grade(&[], &answers, &LengthHeuristic::default());
        assert_eq!(report.total_marks, 0);
        assert_eq!(report.percentage(), 0.0);
    }

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_length_heuristic_bounds() {
        let heuristic = LengthHeuristic::default();
        let q = short(10, 5);

        assert_eq!(heuristic.evaluate(&q, ""), 0);
        assert_eq!(heuristic.evaluate(&q, "   "), 0);
        assert_eq!(heuristic.evaluate(&q, "ok"), 1);
        assert_eq!(heuristic.evaluate(&q, &"x".repeat(26)), 2);
        assert_eq!(heuristic.evaluate(&q, &"x".repeat(10_000)), 5);
    }

    #[test]
    fn test_short_answers_use_evaluator() {
        struct Fixed(i32);
        impl ShortAnswerEvaluator for Fixed {
            fn evaluate(&self, _: &Question, _: &str) -> i32 {
                self.0
            }
        }

        let bank = vec![mcq(1, 1), short(2, 5)];
        let mut answers = choices(&[(1, 1)]);
        answers.insert(2, Some(AnswerValue::Text("anything".to_string())));

        let report = grade(&bank, &answers, &Fixed(3));
        assert_eq!(report.marks_obtained, 7);
        assert_eq!(report.total_marks, 9);

        // out-of-range evaluator output is clamped
        let report = grade(&bank, &answers, &Fixed(50));
        assert_eq!(report.marks_obtained, 9);
    }

    #[test]
    fn test_marks_never_exceed_total() {
        let bank = level_one_bank();
        let answers = choices(&[(1, 3), (2, 2), (3, 2), (4, 2), (5, 1)]);
        let report = grade(&bank, &answers, &LengthHeuristic::default());
        assert_eq!(report.marks_obtained, report.total_marks);
        assert_eq!(report.percentage(), 100.0);
    }
}
