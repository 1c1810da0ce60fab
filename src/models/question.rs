// src/models/question.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Question type: multiple choice with a fixed option set, or free-text short answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Short,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::Short => "short",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(QuestionKind::Mcq),
            "short" => Ok(QuestionKind::Short),
            other => Err(format!("unknown question kind '{}'", other)),
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning certificate type.
    pub certificate_code: String,

    /// Order within the bank.
    pub position: i32,

    /// The text content of the question.
    pub text: String,

    pub kind: QuestionKind,

    pub max_marks: i32,

    /// Ordered option texts (empty for short answers).
    /// Stored as a JSON array in the database.
    pub options: Vec<String>,

    /// 1-based index into `options`. Always set for MCQ, never for short answers.
    pub correct_option: Option<i32>,
}

/// DTO for sending question to client (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub kind: QuestionKind,
    pub text: String,
    pub options: Vec<String>,
    pub max_marks: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            kind: q.kind,
            text: q.text,
            options: q.options,
            max_marks: q.max_marks,
        }
    }
}

/// Response for `GET /exam/{code}/questions`.
#[derive(Debug, Serialize)]
pub struct ExamPaper {
    pub certificate_code: String,
    pub certificate: String,
    pub duration_minutes: i32,
    pub mcq_count: i32,
    pub short_answer_count: i32,
    pub mcq_mark: i32,
    pub pass_percentage: f64,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for adding a question to a bank.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_question_shape))]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    pub kind: QuestionKind,
    #[validate(range(min = 0, max = 100))]
    pub max_marks: i32,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_option: Option<i32>,
}

/// A batch of questions for one certificate, as read by the loader binary.
#[derive(Debug, Deserialize)]
pub struct QuestionBankFile {
    pub certificate_code: String,
    pub questions: Vec<NewQuestion>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_length"));
        }
    }
    Ok(())
}

/// MCQ needs options and a correct index inside them; short answers carry neither.
fn validate_question_shape(q: &NewQuestion) -> Result<(), validator::ValidationError> {
    match q.kind {
        QuestionKind::Mcq => {
            if q.options.is_empty() {
                return Err(validator::ValidationError::new("options_cannot_be_empty"));
            }
            match q.correct_option {
                Some(idx) if idx >= 1 && idx as usize <= q.options.len() => Ok(()),
                _ => Err(validator::ValidationError::new("correct_option_out_of_range")),
            }
        }
        QuestionKind::Short => {
            if !q.options.is_empty() || q.correct_option.is_some() {
                return Err(validator::ValidationError::new("short_answer_has_options"));
            }
            Ok(())
        }
    }
}
