use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{MongoAttemptRepository, MongoQuizRepository},
    services::{AttemptService, QuizService, ResultsService},
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub attempt_service: Arc<AttemptService>,
    pub results_service: Arc<ResultsService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        Ok(Self::from_repositories(
            quiz_repository,
            attempt_repository,
            config,
        ))
    }

    /// Wire services over any repository implementations. Used by `new` and
    /// by tests that substitute in-memory repositories.
    pub fn from_repositories(
        quiz_repository: Arc<dyn crate::repositories::QuizRepository>,
        attempt_repository: Arc<dyn crate::repositories::AttemptRepository>,
        config: Config,
    ) -> Self {
        let quiz_service = Arc::new(QuizService::new(Arc::clone(&quiz_repository)));
        let attempt_service = Arc::new(AttemptService::new(
            Arc::clone(&quiz_repository),
            Arc::clone(&attempt_repository),
        ));
        let results_service = Arc::new(ResultsService::new(attempt_repository));

        Self {
            quiz_service,
            attempt_service,
            results_service,
            config: Arc::new(config),
        }
    }
}
