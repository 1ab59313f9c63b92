use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{question::QuestionType, AnswerRecord, Quiz, QuizAttempt};

/// Attempt eligibility for the requesting student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptInfo {
    pub can_attempt: bool,
    pub remaining_attempts: Option<u32>,
    pub max_attempts: Option<u32>,
}

/// Quiz definition as served over the API. Option correctness flags are only
/// present for the owning instructor or an admin; students never see them.
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    pub id: String,
    pub course_id: String,
    pub lesson_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub time_limit_minutes: Option<i64>,
    pub passing_score: f64,
    pub max_attempts: Option<u32>,
    pub is_active: bool,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl QuizView {
    pub fn from_quiz(quiz: &Quiz, include_answers: bool) -> Self {
        QuizView {
            id: quiz.id.clone(),
            course_id: quiz.course_id.clone(),
            lesson_id: quiz.lesson_id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            time_limit_minutes: quiz.time_limit_minutes,
            passing_score: quiz.passing_score,
            max_attempts: quiz.max_attempts,
            is_active: quiz.is_active,
            questions: quiz
                .questions
                .iter()
                .map(|q| QuestionView {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    question_type: q.question_type,
                    points: q.points,
                    options: q
                        .options
                        .iter()
                        .map(|opt| OptionView {
                            id: opt.id.clone(),
                            text: opt.text.clone(),
                            is_correct: include_answers.then_some(opt.is_correct),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizWithAttemptInfo {
    #[serde(flatten)]
    pub quiz: QuizView,
    pub attempt_info: AttemptInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: String,
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub time_limit_minutes: Option<i64>,
}

/// Persisted attempt summary returned from submission and the results views.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: String,
    pub quiz_id: String,
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: i32,
    pub total_score: i32,
    pub percentage: f64,
    pub passed: bool,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_taken_seconds: i64,
    pub flagged_overtime: bool,
    pub needs_manual_grading: bool,
    pub answers: Vec<AnswerRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AttemptSummary {
    pub fn with_warnings(attempt: QuizAttempt, warnings: Vec<String>) -> Self {
        AttemptSummary {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            attempt_number: attempt.attempt_number,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            score: attempt.score,
            total_score: attempt.total_score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            correct_answers: attempt.correct_answers,
            total_questions: attempt.total_questions,
            time_taken_seconds: attempt.time_taken_seconds,
            flagged_overtime: attempt.flagged_overtime,
            needs_manual_grading: attempt.needs_manual_grading,
            answers: attempt.answers,
            warnings,
        }
    }
}

impl From<QuizAttempt> for AttemptSummary {
    fn from(attempt: QuizAttempt) -> Self {
        AttemptSummary::with_warnings(attempt, vec![])
    }
}
