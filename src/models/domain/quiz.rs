use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::{Question, QuestionType};

pub const DEFAULT_PASSING_SCORE: f64 = 60.0;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub lesson_id: String,
    pub created_by_user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: Option<i64>,
    pub passing_score: f64,       // percentage in [0, 100]
    pub max_attempts: Option<u32>, // None = unlimited
    pub is_active: bool,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Quiz {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        course_id: &str,
        lesson_id: &str,
        created_by_user_id: &str,
        title: &str,
        description: Option<String>,
        time_limit_minutes: Option<i64>,
        passing_score: f64,
        max_attempts: Option<u32>,
        is_active: bool,
        questions: Vec<Question>,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            lesson_id: lesson_id.to_string(),
            created_by_user_id: created_by_user_id.to_string(),
            title: title.to_string(),
            description,
            time_limit_minutes,
            passing_score,
            max_attempts,
            is_active,
            questions,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Points across every question, short answers included.
    pub fn total_points(&self) -> i32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Points that can be scored automatically (selectable questions only).
    pub fn gradable_points(&self) -> i32 {
        self.questions
            .iter()
            .filter(|q| q.question_type.is_selectable())
            .map(|q| q.points)
            .sum()
    }

    pub fn has_short_answer_questions(&self) -> bool {
        self.questions
            .iter()
            .any(|q| q.question_type == QuestionType::ShortAnswer)
    }
}
