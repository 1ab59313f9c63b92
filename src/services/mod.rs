pub mod attempt_service;
pub mod quiz_service;
pub mod results_service;
pub mod scoring;

pub use attempt_service::AttemptService;
pub use quiz_service::QuizService;
pub use results_service::ResultsService;
