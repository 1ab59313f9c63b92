use std::sync::Arc;

use crate::{
    errors::AppResult,
    models::domain::QuizAttempt,
    repositories::AttemptRepository,
};

/// Read-only views over the attempt tracker's records: latest, best, and
/// full history. Holds no state of its own.
pub struct ResultsService {
    attempts: Arc<dyn AttemptRepository>,
}

impl ResultsService {
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// The most recent completed attempt, if any.
    pub async fn latest_result(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> AppResult<Option<QuizAttempt>> {
        let attempts = self
            .attempts
            .find_by_student_and_quiz(student_id, quiz_id)
            .await?;
        Ok(attempts
            .into_iter()
            .filter(QuizAttempt::is_completed)
            .max_by_key(|a| a.attempt_number))
    }

    /// The completed attempt with the highest percentage; ties go to the
    /// earliest attempt_number.
    pub async fn best_result(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> AppResult<Option<QuizAttempt>> {
        let attempts = self
            .attempts
            .find_by_student_and_quiz(student_id, quiz_id)
            .await?;

        let mut best: Option<QuizAttempt> = None;
        // Attempts arrive ascending by attempt_number, so replacing only on a
        // strictly better percentage keeps the earliest of any tie.
        for attempt in attempts.into_iter().filter(QuizAttempt::is_completed) {
            let beats_current = best
                .as_ref()
                .map(|current| attempt.percentage > current.percentage)
                .unwrap_or(true);
            if beats_current {
                best = Some(attempt);
            }
        }
        Ok(best)
    }

    /// Every attempt for the student on the quiz, in-progress included,
    /// ascending by attempt_number.
    pub async fn list_attempts(
        &self,
        student_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        self.attempts
            .find_by_student_and_quiz(student_id, quiz_id)
            .await
    }
}
