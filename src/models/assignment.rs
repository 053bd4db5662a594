use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binding of a quiz to a set of students, with a due date and attempt
/// limit. Created by the external admin collaborator; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAssignment {
    pub assignment_id: String,
    pub quiz_id: String,
    pub assigned_by: String,
    pub due_date: DateTime<Utc>,
    pub max_attempts: i32,
    pub is_active: bool,
}
