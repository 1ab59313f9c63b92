pub mod attempt_repository;
pub mod quiz_repository;

pub use attempt_repository::{AttemptCompletion, AttemptRepository, MongoAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};

#[cfg(test)]
pub use attempt_repository::MockAttemptRepository;
#[cfg(test)]
pub use quiz_repository::MockQuizRepository;
