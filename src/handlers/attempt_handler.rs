use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{ManualGradeRequest, SubmitAttemptRequest},
        response::{AttemptSummary, StartAttemptResponse},
    },
};

#[post("/quizzes/{id}/attempts")]
pub async fn start_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.start_attempt(&auth.0.sub, &id).await?;
    let quiz = state.quiz_service.get_quiz(&id).await?;

    Ok(HttpResponse::Created().json(StartAttemptResponse {
        attempt_id: attempt.id,
        attempt_number: attempt.attempt_number,
        started_at: attempt.started_at,
        time_limit_minutes: quiz.time_limit_minutes,
    }))
}

/// Submit answers. Reached by both the manual submit button and the
/// client-side timer expiring; whichever lands second gets the already
/// persisted result back.
#[post("/quizzes/{id}/submit")]
pub async fn submit_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SubmitAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt, warnings) = state
        .attempt_service
        .submit_attempt(&auth.0.sub, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(AttemptSummary::with_warnings(attempt, warnings)))
}

/// Most recent completed attempt for the caller.
#[get("/quizzes/{id}/results")]
pub async fn latest_result(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .results_service
        .latest_result(&auth.0.sub, &id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No completed attempts for quiz '{}'", id))
        })?;
    Ok(HttpResponse::Ok().json(AttemptSummary::from(attempt)))
}

/// Highest-scoring completed attempt for the caller.
#[get("/quizzes/{id}/results/best")]
pub async fn best_result(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .results_service
        .best_result(&auth.0.sub, &id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No completed attempts for quiz '{}'", id))
        })?;
    Ok(HttpResponse::Ok().json(AttemptSummary::from(attempt)))
}

/// Full attempt history for the caller, ascending by attempt number.
#[get("/quizzes/{id}/attempts")]
pub async fn list_attempts(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempts = state.results_service.list_attempts(&auth.0.sub, &id).await?;
    let summaries: Vec<AttemptSummary> =
        attempts.into_iter().map(AttemptSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}

/// Instructor manual grading of short-answer questions.
#[post("/attempts/{id}/grade")]
pub async fn grade_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<ManualGradeRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .grade_attempt(&auth.0, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(AttemptSummary::from(attempt)))
}
