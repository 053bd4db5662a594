use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpdateRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
    /// Replacement marks for the answer. Negative scores are not a thing.
    #[validate(range(min = 0.0))]
    pub marks: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpdateResponse {
    pub updated: bool,
    pub attempt_id: Uuid,
    pub question_id: String,
}
