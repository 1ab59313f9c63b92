pub mod attempt;
pub mod question;
pub mod quiz;

pub use attempt::{AnswerRecord, QuizAttempt};
pub use question::{AnswerOption, Question, QuestionType};
pub use quiz::Quiz;
