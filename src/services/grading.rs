use crate::error::{Error, Result};
use crate::models::attempt::AttemptStatus;
use crate::models::result_log::{LogAction, ResultLog};
use crate::services::scoring::round2;
use crate::storage::QuizStore;
use crate::utils::lock::AttemptLocks;
use crate::utils::time::Clock;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Human override of one question's automated score. The only component
/// allowed to touch a terminal attempt's per-answer marks, and responsible
/// for restoring the aggregate invariant (`total_score == Σ answer marks`)
/// in the same critical section.
#[derive(Clone)]
pub struct GradingService {
    store: Arc<dyn QuizStore>,
    clock: Arc<dyn Clock>,
    locks: AttemptLocks,
}

impl GradingService {
    pub fn new(store: Arc<dyn QuizStore>, clock: Arc<dyn Clock>, locks: AttemptLocks) -> Self {
        Self { store, clock, locks }
    }

    /// Overwrites one answer's marks and feedback, then re-derives the
    /// attempt aggregates from every answer's marks. Returns `Ok(false)`
    /// when the attempt or answer cannot be located so callers decide
    /// whether to abort a batch of grade edits.
    ///
    /// The correctness flag and the student's raw answer are never
    /// touched; manual grading only overrides score and feedback.
    pub async fn update_question_score(
        &self,
        attempt_id: Uuid,
        question_id: &str,
        new_marks: f64,
        feedback: &str,
        graded_by: &str,
    ) -> Result<bool> {
        let _guard = self.locks.acquire(attempt_id).await;

        let Some(mut attempt) = self.store.get_attempt(attempt_id).await? else {
            return Ok(false);
        };
        if attempt.status == AttemptStatus::InProgress {
            return Err(Error::BadRequest(
                "Cannot grade an attempt that is still in progress".to_string(),
            ));
        }
        let Some(quiz) = self.store.get_quiz(&attempt.quiz_id).await? else {
            return Ok(false);
        };

        let old_marks = match attempt.answer_mut(question_id) {
            Some(answer) => {
                let old = answer.marks;
                answer.marks = Some(new_marks);
                answer.feedback = Some(feedback.to_string());
                old
            }
            None => return Ok(false),
        };

        // Re-sum across all answers, not just the edited one.
        let total_score = round2(
            attempt
                .answers
                .iter()
                .map(|a| a.marks.unwrap_or(0.0))
                .sum(),
        );
        let max_score = attempt.max_score.unwrap_or(0.0);
        let percentage = if max_score > 0.0 {
            round2(total_score / max_score * 100.0)
        } else {
            0.0
        };

        let now = self.clock.now();
        attempt.total_score = Some(total_score);
        attempt.percentage = Some(percentage);
        attempt.passed = Some(percentage >= quiz.passing_percentage());
        attempt.updated_at = now;

        // Answer edit and aggregates land in one document write.
        self.store.update_attempt(&attempt).await?;

        // The audit entry is written even when the arithmetic yields no
        // change.
        self.store
            .append_result_log(&ResultLog {
                log_id: Uuid::new_v4(),
                attempt_id,
                quiz_id: attempt.quiz_id.clone(),
                student_email: attempt.student_email.clone(),
                action_type: LogAction::GradeUpdated,
                action_data: json!({
                    "questionId": question_id,
                    "oldMarks": old_marks,
                    "newMarks": new_marks,
                    "feedback": feedback,
                    "totalScore": total_score,
                    "percentage": percentage,
                }),
                performed_by: graded_by.to_string(),
                timestamp: now,
            })
            .await?;

        tracing::info!(
            attempt_id = %attempt_id,
            question_id,
            old_marks = ?old_marks,
            new_marks,
            graded_by,
            "Manual grade recorded"
        );

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::{Answer, AnswerValue, Attempt};
    use crate::models::quiz::{Quiz, QuizSettings};
    use crate::storage::memory::InMemoryStore;
    use crate::utils::time::ManualClock;
    use chrono::Utc;

    fn quiz() -> Quiz {
        Quiz {
            quiz_id: "quiz-1".to_string(),
            title: "Sample".to_string(),
            description: None,
            course_id: "course-1".to_string(),
            duration: 30,
            total_marks: 20.0,
            passing_marks: 8.0,
            settings: QuizSettings::default(),
            question_ids: vec!["q1".to_string(), "q2".to_string()],
            is_active: true,
        }
    }

    fn scored_answer(question_id: &str, marks: f64) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            answer: Some(AnswerValue::Text("something".to_string())),
            answered_at: Some(Utc::now()),
            marks: Some(marks),
            is_correct: Some(false),
            feedback: Some("auto".to_string()),
        }
    }

    fn submitted_attempt() -> Attempt {
        let now = Utc::now();
        Attempt {
            attempt_id: Uuid::new_v4(),
            quiz_id: "quiz-1".to_string(),
            assignment_id: "assign-1".to_string(),
            student_email: "student@example.com".to_string(),
            attempt_number: 1,
            started_at: now,
            submitted_at: Some(now),
            due_at: now,
            status: AttemptStatus::Submitted,
            answers: vec![scored_answer("q1", 2.0), scored_answer("q2", 3.0)],
            total_score: Some(5.0),
            max_score: Some(20.0),
            percentage: Some(25.0),
            passed: Some(false),
            is_late_submission: false,
            late_penalty_applied: 0.0,
            time_spent: Some(60),
            created_at: now,
            updated_at: now,
        }
    }

    async fn service_with(
        attempt: &Attempt,
    ) -> (GradingService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store.seed_quiz(quiz(), Vec::new()).await;
        store.insert_attempt(attempt).await.unwrap();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = GradingService::new(store.clone(), clock, AttemptLocks::new());
        (service, store)
    }

    #[tokio::test]
    async fn regrade_restores_aggregate_invariant() {
        let attempt = submitted_attempt();
        let (service, store) = service_with(&attempt).await;

        let updated = service
            .update_question_score(attempt.attempt_id, "q1", 8.0, "solid reasoning", "grader@example.com")
            .await
            .unwrap();
        assert!(updated);

        let stored = store.get_attempt(attempt.attempt_id).await.unwrap().unwrap();
        let summed: f64 = stored.answers.iter().map(|a| a.marks.unwrap_or(0.0)).sum();
        assert_eq!(stored.total_score, Some(round2(summed)));
        assert_eq!(stored.total_score, Some(11.0));
        assert_eq!(stored.percentage, Some(55.0));
        // Threshold derives from the quiz: 8/20 = 40%.
        assert_eq!(stored.passed, Some(true));
        // Correctness flag is untouched by manual grading.
        assert_eq!(stored.answers[0].is_correct, Some(false));
        assert_eq!(stored.answers[0].feedback.as_deref(), Some("solid reasoning"));
        // Status never leaves its terminal value.
        assert_eq!(stored.status, AttemptStatus::Submitted);
    }

    #[tokio::test]
    async fn missing_attempt_or_question_reports_false() {
        let attempt = submitted_attempt();
        let (service, _store) = service_with(&attempt).await;

        let missing_attempt = service
            .update_question_score(Uuid::new_v4(), "q1", 5.0, "", "grader@example.com")
            .await
            .unwrap();
        assert!(!missing_attempt);

        let missing_question = service
            .update_question_score(attempt.attempt_id, "nope", 5.0, "", "grader@example.com")
            .await
            .unwrap();
        assert!(!missing_question);
    }

    #[tokio::test]
    async fn in_progress_attempts_cannot_be_graded() {
        let mut attempt = submitted_attempt();
        attempt.status = AttemptStatus::InProgress;
        let (service, _store) = service_with(&attempt).await;

        let err = service
            .update_question_score(attempt.attempt_id, "q1", 5.0, "", "grader@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn audit_entry_is_written_even_without_arithmetic_change() {
        let attempt = submitted_attempt();
        let (service, store) = service_with(&attempt).await;

        // Same marks as before: aggregates do not move, the log still does.
        service
            .update_question_score(attempt.attempt_id, "q1", 2.0, "confirmed", "grader@example.com")
            .await
            .unwrap();

        let logs = store.list_result_logs(attempt.attempt_id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action_type, LogAction::GradeUpdated);
        assert_eq!(logs[0].performed_by, "grader@example.com");
        assert_eq!(logs[0].action_data["oldMarks"], 2.0);
        assert_eq!(logs[0].action_data["newMarks"], 2.0);
    }
}
