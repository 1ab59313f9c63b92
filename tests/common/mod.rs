#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use learnhub_server::{
    auth::{Claims, UserRole},
    errors::{AppError, AppResult},
    models::{
        domain::{
            question::{AnswerOption, Question, QuestionType},
            Quiz, QuizAttempt,
        },
        dto::request::AnswerSubmission,
    },
    repositories::{AttemptCompletion, AttemptRepository, QuizRepository},
};

pub struct InMemoryQuizRepository {
    quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self {
            quizzes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn insert(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        if quizzes.contains_key(&quiz.id) {
            return Err(AppError::AlreadyExists(format!(
                "Quiz with id '{}' already exists",
                quiz.id
            )));
        }
        quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes.get(id).cloned())
    }

    async fn find_by_lesson(&self, lesson_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<_> = quizzes
            .values()
            .filter(|q| q.lesson_id == lesson_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn replace(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        if !quizzes.contains_key(&quiz.id) {
            return Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                quiz.id
            )));
        }
        quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut quizzes = self.quizzes.write().await;
        Ok(quizzes.remove(id).is_some())
    }
}

pub struct InMemoryAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, QuizAttempt>>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn insert(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;
        // Emulates the unique (student_id, quiz_id, attempt_number) index.
        let number_taken = attempts.values().any(|a| {
            a.student_id == attempt.student_id
                && a.quiz_id == attempt.quiz_id
                && a.attempt_number == attempt.attempt_number
        });
        if number_taken {
            return Err(AppError::AlreadyExists(format!(
                "Attempt number {} already exists for this student and quiz",
                attempt.attempt_number
            )));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn find_by_student_and_quiz(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .cloned()
            .collect();
        items.sort_by_key(|a| a.attempt_number);
        Ok(items)
    }

    async fn count_completed(&self, student_id: &str, quiz_id: &str) -> AppResult<u64> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| {
                a.student_id == student_id && a.quiz_id == quiz_id && a.is_completed()
            })
            .count() as u64)
    }

    async fn max_attempt_number(&self, student_id: &str, quiz_id: &str) -> AppResult<u32> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .map(|a| a.attempt_number)
            .max()
            .unwrap_or(0))
    }

    async fn find_open(&self, student_id: &str, quiz_id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| {
                a.student_id == student_id && a.quiz_id == quiz_id && !a.is_completed()
            })
            .max_by_key(|a| a.attempt_number)
            .cloned())
    }

    async fn complete(
        &self,
        attempt_id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>> {
        let mut attempts = self.attempts.write().await;
        // Conditional update: only an attempt whose completed_at is still
        // null can be completed, exactly like the storage-level guard.
        match attempts.get_mut(attempt_id) {
            Some(attempt) if !attempt.is_completed() => {
                attempt.completed_at = Some(completion.completed_at);
                attempt.answers = completion.answers;
                attempt.score = completion.score;
                attempt.total_score = completion.total_score;
                attempt.percentage = completion.percentage;
                attempt.correct_answers = completion.correct_answers;
                attempt.total_questions = completion.total_questions;
                attempt.time_taken_seconds = completion.time_taken_seconds;
                attempt.passed = completion.passed;
                attempt.flagged_overtime = completion.flagged_overtime;
                attempt.needs_manual_grading = completion.needs_manual_grading;
                Ok(Some(attempt.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;
        if !attempts.contains_key(&attempt.id) {
            return Err(AppError::NotFound(format!(
                "Attempt with id '{}' not found",
                attempt.id
            )));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }
}

pub fn claims(user_id: &str, role: UserRole) -> Claims {
    Claims {
        sub: user_id.to_string(),
        role,
        iat: 0,
        exp: 9999999999,
    }
}

pub fn multiple_choice_question(id: &str, points: i32, correct: &[&str], wrong: &[&str]) -> Question {
    let mut options = Vec::new();
    for opt in correct {
        options.push(AnswerOption {
            id: opt.to_string(),
            text: format!("option {}", opt),
            is_correct: true,
        });
    }
    for opt in wrong {
        options.push(AnswerOption {
            id: opt.to_string(),
            text: format!("option {}", opt),
            is_correct: false,
        });
    }
    Question {
        id: id.to_string(),
        text: format!("Question {}", id),
        question_type: QuestionType::MultipleChoice,
        points,
        options,
    }
}

pub fn short_answer_question(id: &str, points: i32) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {}", id),
        question_type: QuestionType::ShortAnswer,
        points,
        options: vec![],
    }
}

pub fn make_quiz(quiz_id: &str, max_attempts: Option<u32>, questions: Vec<Question>) -> Quiz {
    let mut quiz = Quiz::new(
        "course-1",
        "lesson-1",
        "instructor-1",
        "Test quiz",
        None,
        Some(30),
        60.0,
        max_attempts,
        true,
        questions,
    );
    quiz.id = quiz_id.to_string();
    quiz
}

pub fn choice(question_id: &str, selected: &[&str]) -> AnswerSubmission {
    AnswerSubmission::Choice {
        question_id: question_id.to_string(),
        selected_option_ids: selected.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn text_answer(question_id: &str, answer: &str) -> AnswerSubmission {
    AnswerSubmission::Text {
        question_id: question_id.to_string(),
        answer_text: answer.to_string(),
    }
}
