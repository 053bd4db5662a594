use crate::dto::student_dto::{
    AttemptQuestionsResponse, AttemptResultResponse, PendingResultResponse, QuestionView,
    SaveAnswerRequest, SaveAnswerResponse, StartAttemptResponse, SubmitAttemptResponse,
};
use crate::error::Result;
use crate::middleware::auth::StudentIdentity;
use crate::services::attempt::AttemptResult;
use crate::utils::time::Clock;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quiz/:assignment_id/start", post(start_attempt))
        .route("/attempt/:attempt_id/questions", get(attempt_questions))
        .route("/attempt/:attempt_id/answer", post(save_answer))
        .route("/attempt/:attempt_id/submit", post(submit_attempt))
        .route("/attempt/:attempt_id/result", get(attempt_result))
}

#[axum::debug_handler]
async fn start_attempt(
    State(state): State<AppState>,
    StudentIdentity(student): StudentIdentity,
    Path(assignment_id): Path<String>,
) -> Result<impl IntoResponse> {
    let attempt = state.attempts.start_attempt(&student, &assignment_id).await?;
    let duration_minutes = (attempt.due_at - attempt.started_at).num_minutes();
    let body = StartAttemptResponse::from_attempt(&attempt, duration_minutes, state.display_offset);
    Ok((StatusCode::CREATED, Json(body)))
}

#[axum::debug_handler]
async fn attempt_questions(
    State(state): State<AppState>,
    StudentIdentity(student): StudentIdentity,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (questions, attempt) = state.attempts.attempt_questions(&student, attempt_id).await?;
    let now = state.clock.now();
    let body = AttemptQuestionsResponse {
        questions: questions.iter().map(QuestionView::from).collect(),
        attempt_id: attempt.attempt_id,
        due_at: attempt.due_at.with_timezone(&state.display_offset),
        time_remaining_seconds: (attempt.due_at - now).num_seconds().max(0),
    };
    Ok(Json(body))
}

#[axum::debug_handler]
async fn save_answer(
    State(state): State<AppState>,
    StudentIdentity(student): StudentIdentity,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let saved_at = state
        .attempts
        .save_answer(&student, attempt_id, &payload.question_id, payload.answer)
        .await?;
    Ok(Json(SaveAnswerResponse {
        saved: true,
        question_id: payload.question_id,
        timestamp: saved_at.with_timezone(&state.display_offset),
    }))
}

#[axum::debug_handler]
async fn submit_attempt(
    State(state): State<AppState>,
    StudentIdentity(student): StudentIdentity,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let attempt = state.attempts.submit_attempt(&student, attempt_id).await?;
    Ok(Json(SubmitAttemptResponse::from(&attempt)))
}

#[axum::debug_handler]
async fn attempt_result(
    State(state): State<AppState>,
    StudentIdentity(student): StudentIdentity,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    match state.attempts.attempt_result(&student, attempt_id).await? {
        AttemptResult::Withheld {
            status,
            submitted_at,
        } => Ok(Json(PendingResultResponse {
            status,
            submitted_at: submitted_at.map(|t| t.with_timezone(&state.display_offset)),
            message: "Results will be available after review".to_string(),
        })
        .into_response()),
        AttemptResult::Released {
            attempt,
            quiz,
            questions,
        } => Ok(Json(AttemptResultResponse::from_parts(
            &attempt,
            &quiz,
            &questions,
            state.display_offset,
        ))
        .into_response()),
    }
}
