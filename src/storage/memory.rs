use super::QuizStore;
use crate::error::{Error, Result};
use crate::models::assignment::QuizAssignment;
use crate::models::attempt::Attempt;
use crate::models::question::Question;
use crate::models::quiz::Quiz;
use crate::models::result_log::ResultLog;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store. Serves as the shipped default and the test double;
/// a database-backed implementation of [`QuizStore`] is the external
/// persistence collaborator.
#[derive(Default)]
pub struct InMemoryStore {
    quizzes: RwLock<HashMap<String, Quiz>>,
    questions: RwLock<HashMap<String, Vec<Question>>>,
    assignments: RwLock<HashMap<String, QuizAssignment>>,
    attempts: RwLock<HashMap<Uuid, Attempt>>,
    result_logs: RwLock<Vec<ResultLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a quiz and its question set. Quiz/question administration is
    /// owned by the external admin collaborator, so this is not part of
    /// the [`QuizStore`] port.
    pub async fn seed_quiz(&self, quiz: Quiz, mut questions: Vec<Question>) {
        questions.sort_by_key(|q| q.order);
        self.questions
            .write()
            .await
            .insert(quiz.quiz_id.clone(), questions);
        self.quizzes.write().await.insert(quiz.quiz_id.clone(), quiz);
    }

    pub async fn seed_assignment(&self, assignment: QuizAssignment) {
        self.assignments
            .write()
            .await
            .insert(assignment.assignment_id.clone(), assignment);
    }
}

#[async_trait]
impl QuizStore for InMemoryStore {
    async fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(quiz_id).cloned())
    }

    async fn get_questions(&self, quiz_id: &str) -> Result<Vec<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .get(quiz_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_assignment(&self, assignment_id: &str) -> Result<Option<QuizAssignment>> {
        Ok(self.assignments.read().await.get(assignment_id).cloned())
    }

    async fn count_attempts(&self, assignment_id: &str, student_email: &str) -> Result<i64> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.assignment_id == assignment_id && a.student_email == student_email)
            .count() as i64)
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        let mut attempts = self.attempts.write().await;
        if attempts.contains_key(&attempt.attempt_id) {
            return Err(Error::Storage(format!(
                "Attempt {} already exists",
                attempt.attempt_id
            )));
        }
        attempts.insert(attempt.attempt_id, attempt.clone());
        Ok(())
    }

    async fn get_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>> {
        Ok(self.attempts.read().await.get(&attempt_id).cloned())
    }

    async fn update_attempt(&self, attempt: &Attempt) -> Result<()> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&attempt.attempt_id) {
            Some(slot) => {
                *slot = attempt.clone();
                Ok(())
            }
            None => Err(Error::Storage(format!(
                "Attempt {} not found for update",
                attempt.attempt_id
            ))),
        }
    }

    async fn append_result_log(&self, entry: &ResultLog) -> Result<()> {
        self.result_logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_result_logs(&self, attempt_id: Uuid) -> Result<Vec<ResultLog>> {
        Ok(self
            .result_logs
            .read()
            .await
            .iter()
            .filter(|l| l.attempt_id == attempt_id)
            .cloned()
            .collect())
    }
}
