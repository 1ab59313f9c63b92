use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{require_instructor, require_owner_or_admin, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{question::QuestionType, AnswerOption, Question, Quiz},
        dto::request::{CreateQuizRequest, QuestionInput, UpdateQuizRequest},
    },
    repositories::QuizRepository,
};

/// The quiz definition store. Owns Quiz/Question/Option records; never
/// touches attempt state.
pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }

    pub async fn create_quiz(
        &self,
        claims: &Claims,
        course_id: &str,
        lesson_id: &str,
        request: CreateQuizRequest,
    ) -> AppResult<Quiz> {
        require_instructor(claims)?;
        request.validate()?;

        let questions = build_questions(request.questions)?;

        let quiz = Quiz::new(
            course_id,
            lesson_id,
            &claims.sub,
            &request.title,
            request.description,
            request.time_limit_minutes,
            request.passing_score,
            request.max_attempts,
            request.is_active,
            questions,
        );

        self.quizzes.insert(quiz).await
    }

    pub async fn get_quiz(&self, id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))
    }

    pub async fn update_quiz(
        &self,
        claims: &Claims,
        id: &str,
        request: UpdateQuizRequest,
    ) -> AppResult<Quiz> {
        require_instructor(claims)?;
        request.validate()?;

        let mut quiz = self.get_quiz(id).await?;
        require_owner_or_admin(claims, &quiz.created_by_user_id)?;

        if let Some(title) = request.title {
            quiz.title = title;
        }
        if let Some(description) = request.description {
            quiz.description = Some(description);
        }
        if let Some(time_limit) = request.time_limit_minutes {
            quiz.time_limit_minutes = Some(time_limit);
        }
        if let Some(passing_score) = request.passing_score {
            quiz.passing_score = passing_score;
        }
        if let Some(max_attempts) = request.max_attempts {
            quiz.max_attempts = Some(max_attempts);
        }
        if let Some(is_active) = request.is_active {
            quiz.is_active = is_active;
        }
        if let Some(questions) = request.questions {
            // Whole-question replacement: options are regenerated with the
            // questions so correctness flags never dangle.
            quiz.questions = build_questions(questions)?;
        }
        quiz.modified_at = Some(Utc::now());

        self.quizzes.replace(quiz).await
    }

    pub async fn delete_quiz(&self, claims: &Claims, id: &str) -> AppResult<()> {
        require_instructor(claims)?;

        let quiz = self.get_quiz(id).await?;
        require_owner_or_admin(claims, &quiz.created_by_user_id)?;

        if !self.quizzes.delete(id).await? {
            return Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    pub async fn list_quizzes_for_lesson(&self, lesson_id: &str) -> AppResult<Vec<Quiz>> {
        self.quizzes.find_by_lesson(lesson_id).await
    }
}

/// Materialize question inputs into domain questions, enforcing the
/// structural invariants field-level validation cannot express.
fn build_questions(inputs: Vec<QuestionInput>) -> AppResult<Vec<Question>> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            validate_question_shape(index, &input)?;

            Ok(Question {
                id: Uuid::new_v4().to_string(),
                text: input.text,
                question_type: input.question_type,
                points: input.points,
                options: input
                    .options
                    .into_iter()
                    .map(|opt| AnswerOption {
                        id: Uuid::new_v4().to_string(),
                        text: opt.text,
                        is_correct: opt.is_correct,
                    })
                    .collect(),
            })
        })
        .collect()
}

fn validate_question_shape(index: usize, input: &QuestionInput) -> AppResult<()> {
    match input.question_type {
        QuestionType::MultipleChoice => {
            if input.options.len() < 2 {
                return Err(AppError::ValidationError(format!(
                    "question {}: multiple-choice questions need at least 2 options",
                    index + 1
                )));
            }
            if !input.options.iter().any(|opt| opt.is_correct) {
                return Err(AppError::ValidationError(format!(
                    "question {}: at least one option must be marked correct",
                    index + 1
                )));
            }
        }
        QuestionType::TrueFalse => {
            if input.options.len() != 2 {
                return Err(AppError::ValidationError(format!(
                    "question {}: true/false questions need exactly 2 options",
                    index + 1
                )));
            }
            if input.options.iter().filter(|opt| opt.is_correct).count() != 1 {
                return Err(AppError::ValidationError(format!(
                    "question {}: true/false questions need exactly one correct option",
                    index + 1
                )));
            }
        }
        QuestionType::ShortAnswer => {
            if !input.options.is_empty() {
                return Err(AppError::ValidationError(format!(
                    "question {}: short-answer questions cannot have options",
                    index + 1
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::models::dto::request::OptionInput;
    use crate::repositories::MockQuizRepository;

    fn instructor_claims() -> Claims {
        Claims {
            sub: "instructor-1".to_string(),
            role: UserRole::Instructor,
            iat: 0,
            exp: 9999999999,
        }
    }

    fn student_claims() -> Claims {
        Claims {
            sub: "student-1".to_string(),
            role: UserRole::Student,
            iat: 0,
            exp: 9999999999,
        }
    }

    fn valid_request() -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Biology basics".to_string(),
            description: None,
            time_limit_minutes: Some(30),
            passing_score: 60.0,
            max_attempts: Some(1),
            is_active: true,
            questions: vec![QuestionInput {
                text: "Is water wet?".to_string(),
                question_type: QuestionType::TrueFalse,
                points: 1,
                options: vec![
                    OptionInput {
                        text: "True".to_string(),
                        is_correct: true,
                    },
                    OptionInput {
                        text: "False".to_string(),
                        is_correct: false,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn create_quiz_persists_for_instructor() {
        let mut repo = MockQuizRepository::new();
        repo.expect_insert()
            .withf(|quiz: &Quiz| {
                quiz.created_by_user_id == "instructor-1"
                    && quiz.lesson_id == "lesson-1"
                    && quiz.questions.len() == 1
            })
            .returning(|quiz| Ok(quiz));
        let service = QuizService::new(Arc::new(repo));

        let quiz = service
            .create_quiz(&instructor_claims(), "course-1", "lesson-1", valid_request())
            .await
            .expect("create should succeed");

        assert_eq!(quiz.title, "Biology basics");
        assert!(!quiz.questions[0].id.is_empty());
        assert!(!quiz.questions[0].options[0].id.is_empty());
    }

    #[tokio::test]
    async fn create_quiz_rejects_students() {
        let service = QuizService::new(Arc::new(MockQuizRepository::new()));

        let result = service
            .create_quiz(&student_claims(), "course-1", "lesson-1", valid_request())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn create_quiz_rejects_selectable_question_without_correct_option() {
        let service = QuizService::new(Arc::new(MockQuizRepository::new()));

        let mut request = valid_request();
        request.questions = vec![QuestionInput {
            text: "Pick one".to_string(),
            question_type: QuestionType::MultipleChoice,
            points: 1,
            options: vec![
                OptionInput {
                    text: "A".to_string(),
                    is_correct: false,
                },
                OptionInput {
                    text: "B".to_string(),
                    is_correct: false,
                },
            ],
        }];

        let result = service
            .create_quiz(&instructor_claims(), "course-1", "lesson-1", request)
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn create_quiz_rejects_short_answer_with_options() {
        let service = QuizService::new(Arc::new(MockQuizRepository::new()));

        let mut request = valid_request();
        request.questions = vec![QuestionInput {
            text: "Explain".to_string(),
            question_type: QuestionType::ShortAnswer,
            points: 5,
            options: vec![OptionInput {
                text: "Should not be here".to_string(),
                is_correct: false,
            }],
        }];

        let result = service
            .create_quiz(&instructor_claims(), "course-1", "lesson-1", request)
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_quiz_rejects_non_owner() {
        let mut repo = MockQuizRepository::new();
        repo.expect_find_by_id().returning(|_| {
            Ok(Some(Quiz::new(
                "course-1",
                "lesson-1",
                "someone-else",
                "Theirs",
                None,
                None,
                60.0,
                Some(1),
                true,
                vec![],
            )))
        });
        let service = QuizService::new(Arc::new(repo));

        let request = UpdateQuizRequest {
            title: Some("Mine now".to_string()),
            description: None,
            time_limit_minutes: None,
            passing_score: None,
            max_attempts: None,
            is_active: None,
            questions: None,
        };

        let result = service
            .update_quiz(&instructor_claims(), "quiz-1", request)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn get_quiz_maps_missing_to_not_found() {
        let mut repo = MockQuizRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let service = QuizService::new(Arc::new(repo));

        let result = service.get_quiz("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
