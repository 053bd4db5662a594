use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub quiz_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub course_id: String,
    /// Attempt duration in minutes.
    pub duration: i64,
    pub total_marks: f64,
    pub passing_marks: f64,
    #[serde(default)]
    pub settings: QuizSettings,
    #[serde(default)]
    pub question_ids: Vec<String>,
    pub is_active: bool,
}

impl Quiz {
    /// Canonical pass threshold, as a percentage. Every pass/fail decision
    /// in the system derives from this single source.
    pub fn passing_percentage(&self) -> f64 {
        if self.total_marks > 0.0 {
            self.passing_marks / self.total_marks * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    #[serde(default)]
    pub late_submission_behavior: LateSubmissionBehavior,
    #[serde(default = "default_late_penalty_percent")]
    pub late_penalty_percent: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default = "default_true")]
    pub show_results_immediately: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            late_submission_behavior: LateSubmissionBehavior::default(),
            late_penalty_percent: default_late_penalty_percent(),
            max_attempts: default_max_attempts(),
            shuffle_questions: false,
            show_results_immediately: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateSubmissionBehavior {
    AcceptWithPenalty,
    Reject,
    #[default]
    MarkLate,
}

fn default_late_penalty_percent() -> f64 {
    10.0
}

fn default_max_attempts() -> i32 {
    1
}

fn default_true() -> bool {
    true
}
