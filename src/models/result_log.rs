use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit entry. Written once per lifecycle event, never
/// mutated, never read by scoring logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultLog {
    pub log_id: Uuid,
    pub attempt_id: Uuid,
    pub quiz_id: String,
    pub student_email: String,
    pub action_type: LogAction,
    pub action_data: serde_json::Value,
    pub performed_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    AttemptStarted,
    AnswerSaved,
    AttemptSubmitted,
    GradeUpdated,
}
