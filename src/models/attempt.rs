use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One student's timed instance of taking a quiz.
///
/// `due_at` is fixed at creation (`started_at` + quiz duration) and is the
/// sole authority for lateness; it is never recomputed from wall-clock
/// duration afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub quiz_id: String,
    pub assignment_id: String,
    pub student_email: String,
    /// 1-based, unique per (student, assignment).
    pub attempt_number: i32,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub due_at: DateTime<Utc>,
    pub status: AttemptStatus,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub total_score: Option<f64>,
    pub max_score: Option<f64>,
    pub percentage: Option<f64>,
    pub passed: Option<bool>,
    #[serde(default)]
    pub is_late_submission: bool,
    #[serde(default)]
    pub late_penalty_applied: f64,
    /// Seconds between start and submission.
    pub time_spent: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attempt {
    pub fn answer_mut(&mut self, question_id: &str) -> Option<&mut Answer> {
        self.answers.iter_mut().find(|a| a.question_id == question_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    AutoSubmitted,
    TimedOut,
    Rejected,
}

impl AttemptStatus {
    /// Terminal statuses never transition back to `in_progress`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::AutoSubmitted => "auto_submitted",
            AttemptStatus::TimedOut => "timed_out",
            AttemptStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Per-question response embedded in an attempt. Before scoring only the
/// raw value and timestamp are present; scoring fills in the verdict
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub answer: Option<AnswerValue>,
    pub answered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Answer {
    pub fn draft(question_id: String, answer: AnswerValue, answered_at: DateTime<Utc>) -> Self {
        Self {
            question_id,
            answer: Some(answer),
            answered_at: Some(answered_at),
            marks: None,
            is_correct: None,
            feedback: None,
        }
    }
}

/// Raw answer value, shaped by the owning question's type: a selected
/// option, a set of options, a number, or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Selection(Vec<String>),
    Text(String),
}
