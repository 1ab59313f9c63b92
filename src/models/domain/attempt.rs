use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One student's pass at a quiz. Created when the student starts the quiz;
/// completion fields are written exactly once, on submission. Attempts are
/// never deleted; a new attempt is a new record with the next attempt_number.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub student_id: String,
    pub quiz_id: String,
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    // Serialized even while None so the storage layer can match on null to
    // guard against double completion.
    pub completed_at: Option<DateTime<Utc>>,
    pub answers: Vec<AnswerRecord>,
    pub score: i32,
    pub total_score: i32,
    pub percentage: f64,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_taken_seconds: i64,
    pub passed: bool,
    pub flagged_overtime: bool,
    pub needs_manual_grading: bool,
}

/// Per-question outcome, produced by the scoring engine on submission.
/// Never trusted from the client.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub selected_option_ids: Vec<String>,
    pub answer_text: Option<String>,
    pub is_correct: bool,
    pub points_earned: i32,
    pub graded: bool,
}

impl QuizAttempt {
    pub fn start(student_id: &str, quiz_id: &str, attempt_number: u32) -> Self {
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            quiz_id: quiz_id.to_string(),
            attempt_number,
            started_at: Utc::now(),
            completed_at: None,
            answers: vec![],
            score: 0,
            total_score: 0,
            percentage: 0.0,
            correct_answers: 0,
            total_questions: 0,
            time_taken_seconds: 0,
            passed: false,
            flagged_overtime: false,
            needs_manual_grading: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
