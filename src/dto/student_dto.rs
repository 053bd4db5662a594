use crate::models::attempt::{Answer, AnswerValue, Attempt, AttemptStatus};
use crate::models::question::{Question, QuestionType};
use crate::models::quiz::Quiz;
use crate::utils::time::to_display as display;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub attempt_number: i32,
    pub started_at: DateTime<FixedOffset>,
    pub due_at: DateTime<FixedOffset>,
    pub duration_minutes: i64,
}

impl StartAttemptResponse {
    pub fn from_attempt(attempt: &Attempt, duration_minutes: i64, offset: FixedOffset) -> Self {
        Self {
            attempt_id: attempt.attempt_id,
            status: attempt.status,
            attempt_number: attempt.attempt_number,
            started_at: display(attempt.started_at, offset),
            due_at: display(attempt.due_at, offset),
            duration_minutes,
        }
    }
}

/// Question as served to a student mid-attempt: correct answers and
/// explanations are withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    pub marks: f64,
    pub order: i32,
    #[serde(default)]
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            question_id: q.question_id.clone(),
            question_type: q.question_type,
            question_text: q.question_text.clone(),
            marks: q.marks,
            order: q.order,
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptQuestionsResponse {
    pub questions: Vec<QuestionView>,
    pub attempt_id: Uuid,
    pub due_at: DateTime<FixedOffset>,
    pub time_remaining_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
    pub answer: AnswerValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswerResponse {
    pub saved: bool,
    pub question_id: String,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub total_score: Option<f64>,
    pub max_score: Option<f64>,
    pub percentage: Option<f64>,
    pub passed: Option<bool>,
    pub is_late_submission: bool,
    pub late_penalty_applied: f64,
}

impl From<&Attempt> for SubmitAttemptResponse {
    fn from(attempt: &Attempt) -> Self {
        Self {
            attempt_id: attempt.attempt_id,
            status: attempt.status,
            total_score: attempt.total_score,
            max_score: attempt.max_score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            is_late_submission: attempt.is_late_submission,
            late_penalty_applied: attempt.late_penalty_applied,
        }
    }
}

/// Scored answer enriched with question context for the result view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub question_id: String,
    pub question_text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub max_marks: Option<f64>,
    pub answer: Option<AnswerValue>,
    pub answered_at: Option<DateTime<FixedOffset>>,
    pub marks: Option<f64>,
    pub is_correct: Option<bool>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub title: String,
    pub total_marks: f64,
    pub passing_marks: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResultResponse {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub started_at: DateTime<FixedOffset>,
    pub submitted_at: Option<DateTime<FixedOffset>>,
    pub total_score: Option<f64>,
    pub max_score: Option<f64>,
    pub percentage: Option<f64>,
    pub passed: Option<bool>,
    pub is_late_submission: bool,
    pub late_penalty_applied: f64,
    pub time_spent: Option<i64>,
    pub answers: Vec<AnswerView>,
    pub quiz: QuizSummary,
}

impl AttemptResultResponse {
    pub fn from_parts(
        attempt: &Attempt,
        quiz: &Quiz,
        questions: &[Question],
        offset: FixedOffset,
    ) -> Self {
        let by_id: HashMap<&str, &Question> = questions
            .iter()
            .map(|q| (q.question_id.as_str(), q))
            .collect();

        let answers = attempt
            .answers
            .iter()
            .map(|a| answer_view(a, by_id.get(a.question_id.as_str()).copied(), offset))
            .collect();

        Self {
            attempt_id: attempt.attempt_id,
            status: attempt.status,
            started_at: display(attempt.started_at, offset),
            submitted_at: attempt.submitted_at.map(|t| display(t, offset)),
            total_score: attempt.total_score,
            max_score: attempt.max_score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            is_late_submission: attempt.is_late_submission,
            late_penalty_applied: attempt.late_penalty_applied,
            time_spent: attempt.time_spent,
            answers,
            quiz: QuizSummary {
                title: quiz.title.clone(),
                total_marks: quiz.total_marks,
                passing_marks: quiz.passing_marks,
            },
        }
    }
}

fn answer_view(answer: &Answer, question: Option<&Question>, offset: FixedOffset) -> AnswerView {
    AnswerView {
        question_id: answer.question_id.clone(),
        question_text: question.map(|q| q.question_text.clone()),
        question_type: question.map(|q| q.question_type),
        max_marks: question.map(|q| q.marks),
        answer: answer.answer.clone(),
        answered_at: answer.answered_at.map(|t| display(t, offset)),
        marks: answer.marks,
        is_correct: answer.is_correct,
        feedback: answer.feedback.clone(),
    }
}

/// Returned instead of the full result while the quiz withholds scores
/// pending an external review step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResultResponse {
    pub status: AttemptStatus,
    pub submitted_at: Option<DateTime<FixedOffset>>,
    pub message: String,
}
