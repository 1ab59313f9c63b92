use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub options: Vec<AnswerOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    /// Selectable questions are answered by picking options and can be
    /// auto-scored; short answers need an instructor.
    pub fn is_selectable(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

impl Question {
    /// The set of option ids flagged correct. Submitted answers must match
    /// this set exactly to earn the question's points.
    pub fn correct_option_ids(&self) -> BTreeSet<&str> {
        self.options
            .iter()
            .filter(|opt| opt.is_correct)
            .map(|opt| opt.id.as_str())
            .collect()
    }
}
