// src/models/attempt.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A submitted answer value.
/// Multiple-choice answers are 1-based option numbers, short answers are free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(i64),
    Text(String),
}

/// Represents the 'attempts' table in the database.
/// One row per submission; score fields are final once written.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub certificate_code: String,

    /// 1 for the first attempt of this user at this certificate, then 2, 3...
    pub attempt_number: i32,

    pub total_marks: i32,
    pub marks_obtained: i32,

    /// Rounded to two decimals.
    pub percentage: f64,
    pub passed: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub submitted_value: Option<AnswerValue>,

    /// Snapshot of the answer key at grading time, kept for audit.
    pub correct_option: Option<i32>,

    pub marks_awarded: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub answer: Option<AnswerValue>,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    #[validate(length(max = 120))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 32))]
    pub certificate_code: String,

    #[validate(length(min = 1, max = 500), custom(function = validate_unique_questions))]
    pub answers: Vec<SubmittedAnswer>,
}

impl SubmitExamRequest {
    /// Email normalised for use as the user dedup key.
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }

    pub fn normalized_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

fn validate_unique_questions(answers: &[SubmittedAnswer]) -> Result<(), validator::ValidationError> {
    let mut seen = HashSet::new();
    for a in answers {
        if !seen.insert(a.question_id) {
            return Err(validator::ValidationError::new("duplicate_question_id"));
        }
    }
    Ok(())
}

/// Response for `POST /exam/submit`.
#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub attempt_id: i64,
    pub attempt_number: i32,
    pub score: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub passed: bool,
    pub result: &'static str,
    pub certificate_code: Option<String>,

    /// Question ids in the submission that are not part of this certificate's bank.
    pub skipped_question_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_value_accepts_number_or_text() {
        let v: SubmittedAnswer = serde_json::from_str(r#"{"question_id": 1, "answer": 3}"#).unwrap();
        assert_eq!(v.answer, Some(AnswerValue::Choice(3)));

        let v: SubmittedAnswer =
            serde_json::from_str(r#"{"question_id": 2, "answer": "Aperture"}"#).unwrap();
        assert_eq!(v.answer, Some(AnswerValue::Text("Aperture".to_string())));

        let v: SubmittedAnswer = serde_json::from_str(r#"{"question_id": 3}"#).unwrap();
        assert_eq!(v.answer, None);
    }

    #[test]
    fn test_duplicate_question_ids_rejected() {
        let req: SubmitExamRequest = serde_json::from_value(serde_json::json!({
            "certificate_code": "LEVEL-1",
            "answers": [
                {"question_id": 1, "answer": 3},
                {"question_id": 1, "answer": 2}
            ]
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_email_normalised() {
        let req: SubmitExamRequest = serde_json::from_value(serde_json::json!({
            "email": "  Asha@Example.COM ",
            "certificate_code": "LEVEL-1",
            "answers": [{"question_id": 1, "answer": 3}]
        }))
        .unwrap();
        assert_eq!(req.normalized_email().as_deref(), Some("asha@example.com"));
    }
}
