use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_instructor, require_owner_or_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{CreateQuizRequest, UpdateQuizRequest},
        response::{QuizView, QuizWithAttemptInfo},
    },
};

/// Quiz definition plus attempt eligibility for the requesting student.
/// Correctness flags are only included for the owning instructor or an admin.
#[get("/quizzes/{id}")]
pub async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(&id).await?;

    let is_privileged = can_see_answers(&auth, &quiz.created_by_user_id);
    if !quiz.is_active && !is_privileged {
        // Inactive quizzes are invisible to students.
        return Err(AppError::NotFound(format!(
            "Quiz with id '{}' not found",
            id
        )));
    }

    let attempt_info = state.attempt_service.attempt_info(&auth.0.sub, &quiz).await?;

    Ok(HttpResponse::Ok().json(QuizWithAttemptInfo {
        quiz: QuizView::from_quiz(&quiz, is_privileged),
        attempt_info,
    }))
}

#[post("/courses/{course_id}/lessons/{lesson_id}/quizzes")]
pub async fn create_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (course_id, lesson_id) = path.into_inner();
    let quiz = state
        .quiz_service
        .create_quiz(&auth.0, &course_id, &lesson_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(QuizView::from_quiz(&quiz, true)))
}

#[put("/quizzes/{id}")]
pub async fn update_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .update_quiz(&auth.0, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(QuizView::from_quiz(&quiz, true)))
}

#[delete("/quizzes/{id}")]
pub async fn delete_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.quiz_service.delete_quiz(&auth.0, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/lessons/{lesson_id}/quizzes")]
pub async fn list_lesson_quizzes(
    state: web::Data<AppState>,
    lesson_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_instructor(&auth.0)?;

    let quizzes = state.quiz_service.list_quizzes_for_lesson(&lesson_id).await?;
    let views: Vec<QuizView> = quizzes
        .iter()
        .map(|quiz| QuizView::from_quiz(quiz, can_see_answers(&auth, &quiz.created_by_user_id)))
        .collect();
    Ok(HttpResponse::Ok().json(views))
}

fn can_see_answers(auth: &AuthenticatedUser, owner: &str) -> bool {
    require_owner_or_admin(&auth.0, owner).is_ok()
}
