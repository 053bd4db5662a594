pub mod memory;

use crate::error::Result;
use crate::models::assignment::QuizAssignment;
use crate::models::attempt::Attempt;
use crate::models::question::Question;
use crate::models::quiz::Quiz;
use crate::models::result_log::ResultLog;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence port. The production collaborator is a document database;
/// the core only assumes atomicity at the single-document level.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>>;

    /// Questions for a quiz, in display order.
    async fn get_questions(&self, quiz_id: &str) -> Result<Vec<Question>>;

    async fn get_assignment(&self, assignment_id: &str) -> Result<Option<QuizAssignment>>;

    async fn count_attempts(&self, assignment_id: &str, student_email: &str) -> Result<i64>;

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()>;

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>>;

    /// Replaces the whole attempt document in one atomic write.
    async fn update_attempt(&self, attempt: &Attempt) -> Result<()>;

    /// Append-only; entries are never mutated after the fact.
    async fn append_result_log(&self, entry: &ResultLog) -> Result<()>;

    async fn list_result_logs(&self, attempt_id: Uuid) -> Result<Vec<ResultLog>>;
}
