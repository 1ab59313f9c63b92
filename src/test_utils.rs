use crate::auth::{Claims, UserRole};
use crate::models::domain::{question::QuestionType, AnswerOption, Question, Quiz};
