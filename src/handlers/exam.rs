// src/handlers/exam.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    grading::{grade, is_pass},
    models::{
        attempt::{AnswerValue, SubmitExamRequest, SubmitExamResponse},
        certificate::PASS_GRADE,
        question::{ExamPaper, PublicQuestion},
    },
    state::AppState,
    store::{DynStore, NewSubmission},
};

/// Returns the question paper for a certificate.
///
/// Options are included for multiple-choice questions; correct answers never are.
pub async fn get_questions(
    State(store): State<DynStore>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let certificate_type = store
        .find_certificate_type(&code)
        .await?
        .ok_or(AppError::NotFound("Invalid certificate".to_string()))?;

    let questions: Vec<PublicQuestion> = store
        .questions_for(&certificate_type.code)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(ExamPaper {
        certificate: certificate_type.display_title(),
        certificate_code: certificate_type.code,
        duration_minutes: certificate_type.duration_minutes,
        mcq_count: certificate_type.mcq_count,
        short_answer_count: certificate_type.short_answer_count,
        mcq_mark: certificate_type.mcq_mark,
        pass_percentage: certificate_type.pass_percentage,
        questions,
    }))
}

/// Grades a submission and records the attempt.
///
/// * Scores every question of the certificate's bank; unanswered ones get 0.
/// * Answers for questions outside the bank are skipped and reported back.
/// * Persists the attempt with its answers, plus an unpaid certificate on a pass.
pub async fn submit_exam(
    State(state): State<AppState>,
    payload: Result<Json<SubmitExamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let certificate_type = state
        .store
        .find_certificate_type(&req.certificate_code)
        .await?
        .ok_or(AppError::NotFound("Invalid certificate".to_string()))?;

    let questions = state.store.questions_for(&certificate_type.code).await?;

    let answers: HashMap<i64, Option<AnswerValue>> = req
        .answers
        .iter()
        .map(|a| (a.question_id, a.answer.clone()))
        .collect();

    let report = grade(&questions, &answers, state.evaluator.as_ref());
    if !report.skipped_question_ids.is_empty() {
        tracing::debug!(
            "Skipping answers outside the {} bank: {:?}",
            certificate_type.code,
            report.skipped_question_ids
        );
    }

    let percentage = report.percentage();
    let passed = is_pass(percentage, certificate_type.pass_percentage);

    let outcome = state
        .store
        .record_submission(NewSubmission {
            full_name: req.normalized_name(),
            email: req.normalized_email(),
            certificate_code: certificate_type.code.clone(),
            total_marks: report.total_marks,
            marks_obtained: report.marks_obtained,
            percentage,
            passed,
            records: report.records,
            certificate_prefix: state.config.certificate_prefix.clone(),
            grade: PASS_GRADE.to_string(),
            submitted_at: Utc::now(),
        })
        .await?;

    let certificate_code = outcome.certificate.map(|c| c.certificate_code);
    tracing::info!(
        "Attempt {} for {} by user {}: {}/{} ({}%), certificate {:?}",
        outcome.attempt.id,
        certificate_type.code,
        outcome.user.id,
        outcome.attempt.marks_obtained,
        outcome.attempt.total_marks,
        outcome.attempt.percentage,
        certificate_code
    );

    Ok(Json(SubmitExamResponse {
        attempt_id: outcome.attempt.id,
        attempt_number: outcome.attempt.attempt_number,
        score: outcome.attempt.marks_obtained,
        total_marks: outcome.attempt.total_marks,
        percentage: outcome.attempt.percentage,
        passed: outcome.attempt.passed,
        result: if outcome.attempt.passed { "PASS" } else { "FAIL" },
        certificate_code,
        skipped_question_ids: report.skipped_question_ids,
    }))
}
