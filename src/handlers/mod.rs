pub mod attempt_handler;
pub mod quiz_handler;

use actix_web::{get, web, HttpResponse};

use crate::auth::AuthMiddleware;

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Registers the public health route and the authenticated API surface.
/// Shared between `main` and the HTTP-level tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check).service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .service(quiz_handler::get_quiz)
            .service(quiz_handler::create_quiz)
            .service(quiz_handler::update_quiz)
            .service(quiz_handler::delete_quiz)
            .service(quiz_handler::list_lesson_quizzes)
            .service(attempt_handler::start_attempt)
            .service(attempt_handler::submit_attempt)
            .service(attempt_handler::latest_result)
            .service(attempt_handler::best_result)
            .service(attempt_handler::list_attempts)
            .service(attempt_handler::grade_attempt),
    );
}
