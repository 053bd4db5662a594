use crate::error::Result;
use crate::models::attempt::{Attempt, AttemptStatus};
use crate::models::question::Question;
use crate::models::quiz::{LateSubmissionBehavior, Quiz, QuizSettings};
use crate::services::scoring::{round2, ScoringEngine};
use crate::storage::QuizStore;
use crate::utils::time::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Linear late-penalty ramp: one percent per full minute late, capped at
/// the quiz's configured maximum.
const PENALTY_PERCENT_PER_MINUTE: f64 = 1.0;

/// Determines lateness against an attempt's fixed deadline and applies the
/// quiz's late-submission policy. Writes it performs are authoritative:
/// callers must use the returned attempt, not their pre-penalty copy.
#[derive(Clone)]
pub struct TimerService {
    store: Arc<dyn QuizStore>,
    clock: Arc<dyn Clock>,
}

impl TimerService {
    pub fn new(store: Arc<dyn QuizStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// `due_at` is the sole authority for lateness; when `submitted_at` is
    /// absent the current time is used.
    pub fn is_late(&self, due_at: DateTime<Utc>, submitted_at: Option<DateTime<Utc>>) -> bool {
        submitted_at.unwrap_or_else(|| self.clock.now()) > due_at
    }

    pub fn late_penalty_percent(settings: &QuizSettings, minutes_late: i64) -> f64 {
        match settings.late_submission_behavior {
            LateSubmissionBehavior::Reject => 100.0,
            LateSubmissionBehavior::AcceptWithPenalty => (minutes_late.max(0) as f64
                * PENALTY_PERCENT_PER_MINUTE)
                .min(settings.late_penalty_percent),
            LateSubmissionBehavior::MarkLate => 0.0,
        }
    }

    /// Applies the late-submission policy to an already-scored attempt and
    /// persists the outcome. Returns the attempt unchanged when it is not
    /// late. `pass_threshold` is the quiz-derived passing percentage.
    pub async fn enforce_deadline(
        &self,
        attempt: &Attempt,
        settings: &QuizSettings,
        pass_threshold: f64,
    ) -> Result<Attempt> {
        let submitted_at = attempt.submitted_at.unwrap_or_else(|| self.clock.now());
        if submitted_at <= attempt.due_at {
            return Ok(attempt.clone());
        }

        // Truncated toward zero: 90 seconds late is 1 minute late.
        let minutes_late = (submitted_at - attempt.due_at).num_seconds() / 60;
        let penalty = Self::late_penalty_percent(settings, minutes_late);

        let mut updated = attempt.clone();
        updated.is_late_submission = true;
        updated.late_penalty_applied = penalty;

        match settings.late_submission_behavior {
            LateSubmissionBehavior::Reject => {
                updated.status = AttemptStatus::Rejected;
                updated.total_score = Some(0.0);
                updated.percentage = Some(0.0);
                updated.passed = Some(false);
            }
            LateSubmissionBehavior::AcceptWithPenalty | LateSubmissionBehavior::MarkLate => {
                let current_score = attempt.total_score.unwrap_or(0.0);
                let penalized_score = round2(current_score * (1.0 - penalty / 100.0));
                let max_score = attempt.max_score.unwrap_or(0.0);
                let percentage = if max_score > 0.0 {
                    round2(penalized_score / max_score * 100.0)
                } else {
                    0.0
                };
                updated.total_score = Some(penalized_score);
                updated.percentage = Some(percentage);
                updated.passed = Some(percentage >= pass_threshold);
            }
        }

        updated.updated_at = self.clock.now();
        self.store.update_attempt(&updated).await?;

        tracing::info!(
            attempt_id = %updated.attempt_id,
            minutes_late,
            penalty,
            status = %updated.status,
            "Late submission handled"
        );

        Ok(updated)
    }

    /// Finalizes an attempt discovered past its deadline during a read:
    /// scores whatever answers were saved, transitions to `timed_out`, and
    /// runs the late policy over the result.
    pub async fn finalize_expired(
        &self,
        attempt: &Attempt,
        quiz: &Quiz,
        questions: &[Question],
    ) -> Result<Attempt> {
        let now = self.clock.now();
        let score = ScoringEngine::score_attempt(questions, &attempt.answers);

        let mut updated = attempt.clone();
        updated.status = AttemptStatus::TimedOut;
        updated.submitted_at = Some(now);
        updated.answers = score.scored_answers;
        updated.total_score = Some(score.total_score);
        updated.max_score = Some(score.max_score);
        updated.percentage = Some(score.percentage);
        updated.passed = Some(score.percentage >= quiz.passing_percentage());
        updated.time_spent = Some((now - updated.started_at).num_seconds());
        updated.updated_at = now;
        self.store.update_attempt(&updated).await?;

        tracing::info!(
            attempt_id = %updated.attempt_id,
            "Attempt timed out; finalized with saved answers"
        );

        self.enforce_deadline(&updated, &quiz.settings, quiz.passing_percentage())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuizSettings;
    use crate::storage::memory::InMemoryStore;
    use crate::utils::time::ManualClock;
    use chrono::Duration;
    use uuid::Uuid;

    fn settings(behavior: LateSubmissionBehavior, penalty_percent: f64) -> QuizSettings {
        QuizSettings {
            late_submission_behavior: behavior,
            late_penalty_percent: penalty_percent,
            ..QuizSettings::default()
        }
    }

    #[test]
    fn reject_behavior_is_full_penalty() {
        let s = settings(LateSubmissionBehavior::Reject, 10.0);
        assert_eq!(TimerService::late_penalty_percent(&s, 1), 100.0);
    }

    #[test]
    fn penalty_ramp_is_linear_and_capped() {
        let s = settings(LateSubmissionBehavior::AcceptWithPenalty, 10.0);
        assert_eq!(TimerService::late_penalty_percent(&s, 3), 3.0);
        assert_eq!(TimerService::late_penalty_percent(&s, 10), 10.0);
        assert_eq!(TimerService::late_penalty_percent(&s, 15), 10.0);
    }

    #[test]
    fn mark_late_carries_no_penalty() {
        let s = settings(LateSubmissionBehavior::MarkLate, 10.0);
        assert_eq!(TimerService::late_penalty_percent(&s, 120), 0.0);
    }

    fn scored_attempt(started_at: DateTime<Utc>, due_at: DateTime<Utc>) -> Attempt {
        Attempt {
            attempt_id: Uuid::new_v4(),
            quiz_id: "quiz-1".to_string(),
            assignment_id: "assign-1".to_string(),
            student_email: "student@example.com".to_string(),
            attempt_number: 1,
            started_at,
            submitted_at: None,
            due_at,
            status: AttemptStatus::Submitted,
            answers: Vec::new(),
            total_score: Some(80.0),
            max_score: Some(100.0),
            percentage: Some(80.0),
            passed: Some(true),
            is_late_submission: false,
            late_penalty_applied: 0.0,
            time_spent: None,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    #[tokio::test]
    async fn on_time_submission_is_untouched() {
        let store = Arc::new(InMemoryStore::new());
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let timer = TimerService::new(store.clone(), clock.clone());

        let mut attempt = scored_attempt(start, start + Duration::minutes(30));
        attempt.submitted_at = Some(start + Duration::minutes(10));
        store.insert_attempt(&attempt).await.unwrap();

        let s = settings(LateSubmissionBehavior::AcceptWithPenalty, 10.0);
        let result = timer.enforce_deadline(&attempt, &s, 40.0).await.unwrap();
        assert!(!result.is_late_submission);
        assert_eq!(result.total_score, Some(80.0));
    }

    #[tokio::test]
    async fn penalty_is_applied_and_persisted() {
        let store = Arc::new(InMemoryStore::new());
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let timer = TimerService::new(store.clone(), clock.clone());

        // 15 minutes late with a 10% cap: penalty 10, 80 -> 72.
        let mut attempt = scored_attempt(start, start + Duration::minutes(30));
        attempt.submitted_at = Some(start + Duration::minutes(45));
        store.insert_attempt(&attempt).await.unwrap();

        let s = settings(LateSubmissionBehavior::AcceptWithPenalty, 10.0);
        let result = timer.enforce_deadline(&attempt, &s, 40.0).await.unwrap();
        assert!(result.is_late_submission);
        assert_eq!(result.late_penalty_applied, 10.0);
        assert_eq!(result.total_score, Some(72.0));
        assert_eq!(result.percentage, Some(72.0));
        assert_eq!(result.passed, Some(true));

        let stored = store.get_attempt(attempt.attempt_id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, Some(72.0));
        assert_eq!(stored.status, AttemptStatus::Submitted);
    }

    #[tokio::test]
    async fn reject_behavior_zeroes_the_attempt() {
        let store = Arc::new(InMemoryStore::new());
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let timer = TimerService::new(store.clone(), clock.clone());

        let mut attempt = scored_attempt(start, start + Duration::minutes(30));
        attempt.submitted_at = Some(start + Duration::minutes(31));
        store.insert_attempt(&attempt).await.unwrap();

        let s = settings(LateSubmissionBehavior::Reject, 10.0);
        let result = timer.enforce_deadline(&attempt, &s, 40.0).await.unwrap();
        assert_eq!(result.status, AttemptStatus::Rejected);
        assert_eq!(result.total_score, Some(0.0));
        assert_eq!(result.percentage, Some(0.0));
        assert_eq!(result.passed, Some(false));
        assert_eq!(result.late_penalty_applied, 100.0);
    }

    #[tokio::test]
    async fn partial_minutes_truncate_toward_zero() {
        let store = Arc::new(InMemoryStore::new());
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let timer = TimerService::new(store.clone(), clock.clone());

        // 90 seconds late counts as 1 minute.
        let mut attempt = scored_attempt(start, start + Duration::minutes(30));
        attempt.submitted_at = Some(start + Duration::minutes(31) + Duration::seconds(30));
        store.insert_attempt(&attempt).await.unwrap();

        let s = settings(LateSubmissionBehavior::AcceptWithPenalty, 10.0);
        let result = timer.enforce_deadline(&attempt, &s, 40.0).await.unwrap();
        assert_eq!(result.late_penalty_applied, 1.0);
        assert_eq!(result.total_score, Some(79.2));
    }
}
