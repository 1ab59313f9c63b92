use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};
use serde::Serialize;

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{AnswerRecord, QuizAttempt},
};

/// Completion fields written exactly once when an attempt is submitted.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptCompletion {
    pub completed_at: DateTime<Utc>,
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

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fails with AlreadyExists when another attempt already holds the same
    /// (student_id, quiz_id, attempt_number); callers recompute and retry.
    async fn insert(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;

    /// All attempts for a student on a quiz, ascending by attempt_number.
    async fn find_by_student_and_quiz(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<QuizAttempt>>;

    /// Completed attempts only; in-progress and abandoned attempts do not
    /// count against the attempt cap.
    async fn count_completed(&self, student_id: &str, quiz_id: &str) -> AppResult<u64>;

    /// Highest attempt_number issued so far (completed or not), 0 when none.
    async fn max_attempt_number(&self, student_id: &str, quiz_id: &str) -> AppResult<u32>;

    /// Most recent in-progress attempt, if any.
    async fn find_open(&self, student_id: &str, quiz_id: &str) -> AppResult<Option<QuizAttempt>>;

    /// Conditionally writes the completion fields: only the caller that finds
    /// completed_at still null wins. Returns None when the attempt is missing
    /// or was already completed by a racing submission.
    async fn complete(
        &self,
        attempt_id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>>;

    /// Full replacement after manual grading recomputes the score fields.
    async fn update(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
}

pub struct MongoAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // The uniqueness constraint that serializes racing start-attempt
        // calls for the same student and quiz.
        let attempt_number_index = IndexModel::builder()
            .keys(doc! { "student_id": 1, "quiz_id": 1, "attempt_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("student_quiz_attempt_unique".to_string())
                    .build(),
            )
            .build();

        let student_quiz_index = IndexModel::builder()
            .keys(doc! { "student_id": 1, "quiz_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_quiz".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_number_index).await?;
        self.collection.create_index(student_quiz_index).await?;

        Ok(())
    }
}

fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11000
    )
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn insert(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(err) if is_duplicate_key_error(&err) => Err(AppError::AlreadyExists(format!(
                "Attempt number {} already exists for this student and quiz",
                attempt.attempt_number
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_by_student_and_quiz(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "student_id": student_id, "quiz_id": quiz_id })
            .sort(doc! { "attempt_number": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn count_completed(&self, student_id: &str, quiz_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! {
                "student_id": student_id,
                "quiz_id": quiz_id,
                "completed_at": { "$ne": null },
            })
            .await?;
        Ok(count)
    }

    async fn max_attempt_number(&self, student_id: &str, quiz_id: &str) -> AppResult<u32> {
        let latest: Option<QuizAttempt> = self
            .collection
            .find(doc! { "student_id": student_id, "quiz_id": quiz_id })
            .sort(doc! { "attempt_number": -1 })
            .limit(1)
            .await?
            .try_next()
            .await?;
        Ok(latest.map(|a| a.attempt_number).unwrap_or(0))
    }

    async fn find_open(&self, student_id: &str, quiz_id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self
            .collection
            .find(doc! {
                "student_id": student_id,
                "quiz_id": quiz_id,
                "completed_at": null,
            })
            .sort(doc! { "attempt_number": -1 })
            .limit(1)
            .await?
            .try_next()
            .await?;
        Ok(attempt)
    }

    async fn complete(
        &self,
        attempt_id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>> {
        let update = doc! { "$set": mongodb::bson::to_document(&completion)? };

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "id": attempt_id, "completed_at": null },
                update,
            )
            .with_options(options)
            .await?;

        Ok(updated)
    }

    async fn update(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.collection
            .replace_one(doc! { "id": &attempt.id }, &attempt)
            .await?;
        Ok(attempt)
    }
}
