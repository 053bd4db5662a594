use crate::dto::admin_dto::{GradeUpdateRequest, GradeUpdateResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::GraderIdentity;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new().route("/attempt/:attempt_id/grade", put(update_grade))
}

#[axum::debug_handler]
async fn update_grade(
    State(state): State<AppState>,
    GraderIdentity(grader): GraderIdentity,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<GradeUpdateRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let feedback = payload.feedback.unwrap_or_default();
    let updated = state
        .grading
        .update_question_score(
            attempt_id,
            &payload.question_id,
            payload.marks,
            &feedback,
            &grader,
        )
        .await?;
    if !updated {
        return Err(Error::NotFound("Attempt or answer not found".to_string()));
    }

    Ok(Json(GradeUpdateResponse {
        updated: true,
        attempt_id,
        question_id: payload.question_id,
    }))
}
