use crate::error::{Error, Result};
use crate::models::attempt::{Answer, AnswerValue, Attempt, AttemptStatus};
use crate::models::question::Question;
use crate::models::quiz::Quiz;
use crate::models::result_log::{LogAction, ResultLog};
use crate::services::scoring::ScoringEngine;
use crate::services::timer::TimerService;
use crate::storage::QuizStore;
use crate::utils::lock::AttemptLocks;
use crate::utils::time::Clock;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// State machine driving the attempt lifecycle: start, answer saves,
/// questions access, submit, result retrieval. Composes the scoring
/// engine and timer enforcement.
#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn QuizStore>,
    clock: Arc<dyn Clock>,
    timer: TimerService,
    locks: AttemptLocks,
}

/// Outcome of a result read; scores stay withheld until the external
/// review step releases them when the quiz says so.
pub enum AttemptResult {
    Withheld {
        status: AttemptStatus,
        submitted_at: Option<DateTime<Utc>>,
    },
    Released {
        attempt: Attempt,
        quiz: Quiz,
        questions: Vec<Question>,
    },
}

impl AttemptService {
    pub fn new(
        store: Arc<dyn QuizStore>,
        clock: Arc<dyn Clock>,
        timer: TimerService,
        locks: AttemptLocks,
    ) -> Self {
        Self {
            store,
            clock,
            timer,
            locks,
        }
    }

    /// Creates a fresh attempt. `due_at` is computed here, once, and never
    /// recomputed afterward.
    pub async fn start_attempt(&self, student_email: &str, assignment_id: &str) -> Result<Attempt> {
        let assignment = self
            .store
            .get_assignment(assignment_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| Error::NotFound("Assignment not found".to_string()))?;

        let prior_attempts = self
            .store
            .count_attempts(assignment_id, student_email)
            .await?;
        if prior_attempts >= assignment.max_attempts as i64 {
            return Err(Error::BadRequest("Maximum attempts exceeded".to_string()));
        }

        let now = self.clock.now();
        if now > assignment.due_date {
            return Err(Error::BadRequest(
                "Assignment deadline has passed".to_string(),
            ));
        }

        let quiz = self
            .store
            .get_quiz(&assignment.quiz_id)
            .await?
            .filter(|q| q.is_active)
            .ok_or_else(|| Error::BadRequest("Quiz not available".to_string()))?;

        let attempt = Attempt {
            attempt_id: Uuid::new_v4(),
            quiz_id: quiz.quiz_id.clone(),
            assignment_id: assignment_id.to_string(),
            student_email: student_email.to_string(),
            attempt_number: prior_attempts as i32 + 1,
            started_at: now,
            submitted_at: None,
            due_at: now + Duration::minutes(quiz.duration),
            status: AttemptStatus::InProgress,
            answers: Vec::new(),
            total_score: None,
            max_score: Some(quiz.total_marks),
            percentage: None,
            passed: None,
            is_late_submission: false,
            late_penalty_applied: 0.0,
            time_spent: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_attempt(&attempt).await?;

        self.log(
            &attempt,
            LogAction::AttemptStarted,
            json!({ "attemptNumber": attempt.attempt_number }),
            student_email,
        )
        .await?;

        tracing::info!(
            attempt_id = %attempt.attempt_id,
            student = student_email,
            assignment_id,
            attempt_number = attempt.attempt_number,
            "Attempt started"
        );

        Ok(attempt)
    }

    /// Upserts one answer's raw value. Late saves are rejected outright;
    /// there is no silent acceptance past the deadline.
    pub async fn save_answer(
        &self,
        student_email: &str,
        attempt_id: Uuid,
        question_id: &str,
        answer: AnswerValue,
    ) -> Result<DateTime<Utc>> {
        let _guard = self.locks.acquire(attempt_id).await;

        let mut attempt = self.fetch_active(student_email, attempt_id).await?;
        let now = self.clock.now();
        if now > attempt.due_at {
            return Err(Error::BadRequest("Attempt has expired".to_string()));
        }

        match attempt.answer_mut(question_id) {
            Some(existing) => {
                existing.answer = Some(answer.clone());
                existing.answered_at = Some(now);
            }
            None => attempt
                .answers
                .push(Answer::draft(question_id.to_string(), answer.clone(), now)),
        }
        attempt.updated_at = now;
        self.store.update_attempt(&attempt).await?;

        self.log(
            &attempt,
            LogAction::AnswerSaved,
            json!({ "questionId": question_id, "answer": answer }),
            student_email,
        )
        .await?;

        Ok(now)
    }

    /// Questions for an active attempt. Accessing an attempt past its
    /// deadline is a boundary crossing: the attempt is finalized as timed
    /// out and the read is denied rather than serving stale questions.
    pub async fn attempt_questions(
        &self,
        student_email: &str,
        attempt_id: Uuid,
    ) -> Result<(Vec<Question>, Attempt)> {
        let _guard = self.locks.acquire(attempt_id).await;

        let attempt = self.fetch_active(student_email, attempt_id).await?;
        let quiz = self.quiz_for(&attempt).await?;
        let questions = self.store.get_questions(&attempt.quiz_id).await?;

        if self.clock.now() > attempt.due_at {
            self.timer
                .finalize_expired(&attempt, &quiz, &questions)
                .await?;
            return Err(Error::BadRequest("Attempt has expired".to_string()));
        }

        Ok((questions, attempt))
    }

    /// Scores and finalizes an attempt. Valid only from `in_progress`;
    /// concurrent submits of the same attempt serialize on the per-attempt
    /// lock and the loser sees a conflict.
    pub async fn submit_attempt(&self, student_email: &str, attempt_id: Uuid) -> Result<Attempt> {
        let _guard = self.locks.acquire(attempt_id).await;

        let attempt = self.fetch_owned(student_email, attempt_id).await?;
        if attempt.status.is_terminal() {
            return Err(Error::Conflict(
                "Attempt has already been submitted".to_string(),
            ));
        }

        let quiz = self.quiz_for(&attempt).await?;
        let questions = self.store.get_questions(&attempt.quiz_id).await?;
        let score = ScoringEngine::score_attempt(&questions, &attempt.answers);

        let now = self.clock.now();
        let is_late = now > attempt.due_at;
        let pass_threshold = quiz.passing_percentage();

        let mut updated = attempt;
        updated.status = AttemptStatus::Submitted;
        updated.submitted_at = Some(now);
        updated.answers = score.scored_answers;
        updated.total_score = Some(score.total_score);
        updated.max_score = Some(score.max_score);
        updated.percentage = Some(score.percentage);
        updated.passed = Some(score.percentage >= pass_threshold);
        updated.is_late_submission = is_late;
        updated.time_spent = Some((now - updated.started_at).num_seconds());
        updated.updated_at = now;
        self.store.update_attempt(&updated).await?;

        if score.requires_manual_grading {
            tracing::warn!(
                attempt_id = %attempt_id,
                "Attempt contains answers whose automated score is advisory"
            );
        }

        // The timer's writes are authoritative; keep its returned state.
        let finalized = if is_late {
            self.timer
                .enforce_deadline(&updated, &quiz.settings, pass_threshold)
                .await?
        } else {
            updated
        };

        self.log(
            &finalized,
            LogAction::AttemptSubmitted,
            json!({
                "totalScore": finalized.total_score,
                "percentage": finalized.percentage,
                "passed": finalized.passed,
                "isLateSubmission": finalized.is_late_submission,
                "latePenaltyApplied": finalized.late_penalty_applied,
            }),
            student_email,
        )
        .await?;

        tracing::info!(
            attempt_id = %attempt_id,
            status = %finalized.status,
            total_score = ?finalized.total_score,
            percentage = ?finalized.percentage,
            passed = ?finalized.passed,
            "Attempt submitted"
        );

        Ok(finalized)
    }

    /// Result view for a terminal attempt, honoring the quiz's
    /// result-visibility setting.
    pub async fn attempt_result(
        &self,
        student_email: &str,
        attempt_id: Uuid,
    ) -> Result<AttemptResult> {
        let attempt = self.fetch_owned(student_email, attempt_id).await?;
        if attempt.status == AttemptStatus::InProgress {
            return Err(Error::BadRequest("Attempt not yet completed".to_string()));
        }

        let quiz = self.quiz_for(&attempt).await?;
        if !quiz.settings.show_results_immediately {
            return Ok(AttemptResult::Withheld {
                status: attempt.status,
                submitted_at: attempt.submitted_at,
            });
        }

        let questions = self.store.get_questions(&attempt.quiz_id).await?;
        Ok(AttemptResult::Released {
            attempt,
            quiz,
            questions,
        })
    }

    async fn fetch_owned(&self, student_email: &str, attempt_id: Uuid) -> Result<Attempt> {
        self.store
            .get_attempt(attempt_id)
            .await?
            .filter(|a| a.student_email == student_email)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))
    }

    async fn fetch_active(&self, student_email: &str, attempt_id: Uuid) -> Result<Attempt> {
        let attempt = self.fetch_owned(student_email, attempt_id).await?;
        if attempt.status != AttemptStatus::InProgress {
            return Err(Error::NotFound("Active attempt not found".to_string()));
        }
        Ok(attempt)
    }

    async fn quiz_for(&self, attempt: &Attempt) -> Result<Quiz> {
        self.store
            .get_quiz(&attempt.quiz_id)
            .await?
            .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))
    }

    async fn log(
        &self,
        attempt: &Attempt,
        action_type: LogAction,
        action_data: serde_json::Value,
        performed_by: &str,
    ) -> Result<()> {
        self.store
            .append_result_log(&ResultLog {
                log_id: Uuid::new_v4(),
                attempt_id: attempt.attempt_id,
                quiz_id: attempt.quiz_id.clone(),
                student_email: attempt.student_email.clone(),
                action_type,
                action_data,
                performed_by: performed_by.to_string(),
                timestamp: self.clock.now(),
            })
            .await
    }
}
