use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::question::QuestionType;

fn default_passing_score() -> f64 {
    crate::models::domain::quiz::DEFAULT_PASSING_SCORE
}

// Missing field -> one allowed attempt; explicit null -> unlimited.
fn default_max_attempts() -> Option<u32> {
    Some(1)
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1440))]
    pub time_limit_minutes: Option<i64>,

    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,

    #[validate(range(min = 1))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,

    #[serde(default = "default_is_active")]
    pub is_active: bool,

    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,

    pub question_type: QuestionType,

    #[validate(range(min = 1, max = 100))]
    pub points: i32,

    #[validate(nested)]
    #[serde(default)]
    pub options: Vec<OptionInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct OptionInput {
    #[validate(length(min = 1, max = 500))]
    pub text: String,

    #[serde(default)]
    pub is_correct: bool,
}

/// Partial update. Question edits are whole-list replacements so option
/// correctness never dangles across edits.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1440))]
    pub time_limit_minutes: Option<i64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_score: Option<f64>,

    #[validate(range(min = 1))]
    pub max_attempts: Option<u32>,

    pub is_active: Option<bool>,

    #[validate(length(min = 1), nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// One submitted answer. Tagged so the scoring engine can exhaustively match
/// on the answer kind instead of sniffing optional fields.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSubmission {
    Choice {
        question_id: String,
        selected_option_ids: Vec<String>,
    },
    Text {
        question_id: String,
        answer_text: String,
    },
}

impl AnswerSubmission {
    pub fn question_id(&self) -> &str {
        match self {
            AnswerSubmission::Choice { question_id, .. } => question_id,
            AnswerSubmission::Text { question_id, .. } => question_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    /// When omitted, the caller's open attempt for the quiz is used.
    pub attempt_id: Option<String>,

    /// Advisory only; authoritative timing is derived from server-recorded
    /// start and completion times.
    pub start_time: Option<DateTime<Utc>>,

    #[validate(length(min = 1))]
    pub answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ManualGradeRequest {
    #[validate(length(min = 1), nested)]
    pub grades: Vec<ManualGrade>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ManualGrade {
    #[validate(length(min = 1))]
    pub question_id: String,

    #[validate(range(min = 0))]
    pub points: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_question_input() -> QuestionInput {
        QuestionInput {
            text: "What is 2 + 2?".to_string(),
            question_type: QuestionType::MultipleChoice,
            points: 1,
            options: vec![
                OptionInput {
                    text: "4".to_string(),
                    is_correct: true,
                },
                OptionInput {
                    text: "5".to_string(),
                    is_correct: false,
                },
            ],
        }
    }

    #[test]
    fn test_valid_create_quiz_request() {
        let request = CreateQuizRequest {
            title: "Arithmetic".to_string(),
            description: None,
            time_limit_minutes: Some(30),
            passing_score: 60.0,
            max_attempts: Some(2),
            is_active: true,
            questions: vec![valid_question_input()],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let request = CreateQuizRequest {
            title: "".to_string(),
            description: None,
            time_limit_minutes: None,
            passing_score: 60.0,
            max_attempts: Some(1),
            is_active: true,
            questions: vec![valid_question_input()],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_no_questions_rejected() {
        let request = CreateQuizRequest {
            title: "Empty".to_string(),
            description: None,
            time_limit_minutes: None,
            passing_score: 60.0,
            max_attempts: Some(1),
            is_active: true,
            questions: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_passing_score_out_of_range_rejected() {
        let request = CreateQuizRequest {
            title: "Bad score".to_string(),
            description: None,
            time_limit_minutes: None,
            passing_score: 120.0,
            max_attempts: Some(1),
            is_active: true,
            questions: vec![valid_question_input()],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let request = CreateQuizRequest {
            title: "Zero attempts".to_string(),
            description: None,
            time_limit_minutes: None,
            passing_score: 60.0,
            max_attempts: Some(0),
            is_active: true,
            questions: vec![valid_question_input()],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_quiz_defaults_from_json() {
        let request: CreateQuizRequest = serde_json::from_str(
            r#"{
                "title": "Defaults",
                "questions": [{
                    "text": "True or false?",
                    "question_type": "true_false",
                    "points": 1,
                    "options": [
                        {"text": "True", "is_correct": true},
                        {"text": "False"}
                    ]
                }]
            }"#,
        )
        .expect("request should deserialize");

        assert_eq!(request.passing_score, 60.0);
        assert_eq!(request.max_attempts, Some(1));
        assert!(request.is_active);
    }

    #[test]
    fn test_explicit_null_max_attempts_means_unlimited() {
        let request: CreateQuizRequest = serde_json::from_str(
            r#"{
                "title": "Unlimited",
                "max_attempts": null,
                "questions": [{
                    "text": "Q",
                    "question_type": "short_answer",
                    "points": 5
                }]
            }"#,
        )
        .expect("request should deserialize");

        assert_eq!(request.max_attempts, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_answer_submission_tagged_deserialization() {
        let choice: AnswerSubmission = serde_json::from_str(
            r#"{"kind": "choice", "question_id": "q-1", "selected_option_ids": ["opt-1"]}"#,
        )
        .expect("choice answer should deserialize");
        assert_eq!(
            choice,
            AnswerSubmission::Choice {
                question_id: "q-1".to_string(),
                selected_option_ids: vec!["opt-1".to_string()],
            }
        );

        let text: AnswerSubmission = serde_json::from_str(
            r#"{"kind": "text", "question_id": "q-2", "answer_text": "Photosynthesis"}"#,
        )
        .expect("text answer should deserialize");
        assert_eq!(text.question_id(), "q-2");
    }

    #[test]
    fn test_answer_submission_rejects_unknown_kind() {
        let result = serde_json::from_str::<AnswerSubmission>(
            r#"{"kind": "essay", "question_id": "q-1", "answer_text": "..."}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_submit_request_requires_answers() {
        let request = SubmitAttemptRequest {
            attempt_id: None,
            start_time: None,
            answers: vec![],
        };
        assert!(request.validate().is_err());
    }
}
