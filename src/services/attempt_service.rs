use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::{require_instructor, require_owner_or_admin, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{question::QuestionType, Quiz, QuizAttempt},
        dto::{
            request::{AnswerSubmission, ManualGradeRequest, SubmitAttemptRequest},
            response::AttemptInfo,
        },
    },
    repositories::{AttemptCompletion, AttemptRepository, QuizRepository},
    services::scoring,
};

/// One initial try plus one retry after losing the attempt-number race.
const START_ATTEMPT_TRIES: u32 = 2;

/// Grace period before an over-time attempt is flagged for review. The timer
/// is client-side; the server only records that the limit was blown.
const OVERTIME_GRACE_SECONDS: i64 = 60;

/// The attempt tracker: creates attempts against a quiz definition, enforces
/// the attempt cap, and persists submission results exactly once. This is the
/// enforcement boundary for attempt-limit and double-submission rules;
/// storage conflicts are converted to domain errors here.
pub struct AttemptService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    pub fn new(quizzes: Arc<dyn QuizRepository>, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { quizzes, attempts }
    }

    /// Reported eligibility: remaining = cap minus COMPLETED attempts, so an
    /// abandoned attempt does not show as consumed. The hard gate at start
    /// time is the attempt number itself (see `start_attempt`), which also
    /// counts in-progress attempts and is race-safe.
    pub async fn attempt_info(&self, student_id: &str, quiz: &Quiz) -> AppResult<AttemptInfo> {
        let Some(max_attempts) = quiz.max_attempts else {
            return Ok(AttemptInfo {
                can_attempt: true,
                remaining_attempts: None,
                max_attempts: None,
            });
        };

        let completed = self.attempts.count_completed(student_id, &quiz.id).await?;
        let remaining = max_attempts.saturating_sub(completed.min(u32::MAX as u64) as u32);

        Ok(AttemptInfo {
            can_attempt: remaining > 0,
            remaining_attempts: Some(remaining),
            max_attempts: Some(max_attempts),
        })
    }

    pub async fn start_attempt(&self, student_id: &str, quiz_id: &str) -> AppResult<QuizAttempt> {
        let quiz = self.load_quiz(quiz_id).await?;
        if !quiz.is_active {
            return Err(AppError::BadRequest(format!(
                "Quiz '{}' is not open for attempts",
                quiz.id
            )));
        }

        // Count-then-insert under the unique (student, quiz, attempt_number)
        // constraint. Attempt numbers are dense per student and quiz, so the
        // next number doubles as the count of attempts ever started; gating
        // on it means the (N+1)-th start loses no matter how requests
        // interleave. A concurrent start that claims the same number makes
        // the insert fail and the number is recomputed once.
        for _ in 0..START_ATTEMPT_TRIES {
            let next_number = self.attempts.max_attempt_number(student_id, quiz_id).await? + 1;
            if let Some(max_attempts) = quiz.max_attempts {
                if next_number > max_attempts {
                    break;
                }
            }

            let attempt = QuizAttempt::start(student_id, quiz_id, next_number);
            match self.attempts.insert(attempt).await {
                Ok(created) => return Ok(created),
                Err(AppError::AlreadyExists(_)) => {
                    log::warn!(
                        "attempt number {} for student {} on quiz {} taken by a concurrent start; retrying",
                        next_number,
                        student_id,
                        quiz_id
                    );
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        let info = self.attempt_info(student_id, &quiz).await?;
        let max_attempts = quiz
            .max_attempts
            .map_or_else(|| "unlimited".to_string(), |m| m.to_string());
        Err(AppError::AttemptLimitExceeded(format!(
            "Attempt limit reached for quiz '{}': {} of {} attempts remaining",
            quiz_id,
            info.remaining_attempts.unwrap_or(0),
            max_attempts
        )))
    }

    /// Submit answers for an attempt. Idempotent: once an attempt is
    /// completed, every further submission returns the persisted result
    /// unchanged, so client retries and the timer/manual double-submit race
    /// are harmless. Exactly one submission wins the conditional update.
    pub async fn submit_attempt(
        &self,
        student_id: &str,
        quiz_id: &str,
        request: SubmitAttemptRequest,
    ) -> AppResult<(QuizAttempt, Vec<String>)> {
        request.validate()?;

        let attempt = self.resolve_attempt(student_id, quiz_id, &request).await?;
        if attempt.is_completed() {
            return Ok((attempt, vec![]));
        }

        let quiz = self.load_quiz(quiz_id).await?;
        validate_submission(&quiz, &request.answers)?;

        let result = scoring::score(&quiz, &request.answers);
        for warning in &result.warnings {
            log::warn!("scoring attempt {}: {}", attempt.id, warning);
        }

        // Authoritative timing comes from server-recorded timestamps; the
        // client-reported start_time is advisory display data only.
        let completed_at = Utc::now();
        let time_taken_seconds = (completed_at - attempt.started_at).num_seconds().max(0);
        let flagged_overtime = quiz
            .time_limit_minutes
            .map(|limit| time_taken_seconds > limit * 60 + OVERTIME_GRACE_SECONDS)
            .unwrap_or(false);
        if flagged_overtime {
            log::warn!(
                "attempt {} exceeded the {}-minute limit ({}s taken); flagged for review",
                attempt.id,
                quiz.time_limit_minutes.unwrap_or_default(),
                time_taken_seconds
            );
        }

        let completion = AttemptCompletion {
            completed_at,
            answers: result.records,
            score: result.points_earned,
            total_score: result.points_possible,
            percentage: result.percentage,
            correct_answers: result.correct_answers,
            total_questions: result.total_questions,
            time_taken_seconds,
            passed: result.passed,
            flagged_overtime,
            needs_manual_grading: result.needs_manual_grading,
        };

        match self.attempts.complete(&attempt.id, completion).await? {
            Some(completed) => Ok((completed, result.warnings)),
            // Lost the race: a concurrent submission already completed this
            // attempt. Return what it persisted.
            None => {
                let persisted = self
                    .attempts
                    .find_by_id(&attempt.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError(format!(
                            "Attempt '{}' disappeared during submission",
                            attempt.id
                        ))
                    })?;
                if persisted.is_completed() {
                    Ok((persisted, vec![]))
                } else {
                    Err(AppError::InternalError(format!(
                        "Attempt '{}' could not be completed",
                        attempt.id
                    )))
                }
            }
        }
    }

    /// Instructor grading of short-answer questions on a completed attempt.
    /// Totals, percentage and pass/fail are recomputed with the graded
    /// questions folded into the denominator.
    pub async fn grade_attempt(
        &self,
        claims: &Claims,
        attempt_id: &str,
        request: ManualGradeRequest,
    ) -> AppResult<QuizAttempt> {
        require_instructor(claims)?;
        request.validate()?;

        let mut attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })?;
        if !attempt.is_completed() {
            return Err(AppError::BadRequest(
                "Cannot grade an attempt that is still in progress".to_string(),
            ));
        }

        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        require_owner_or_admin(claims, &quiz.created_by_user_id)?;

        let mut grades = HashMap::new();
        for grade in &request.grades {
            match quiz.question(&grade.question_id) {
                Some(question) if question.question_type == QuestionType::ShortAnswer => {
                    grades.insert(grade.question_id.clone(), grade.points);
                }
                Some(_) => {
                    return Err(AppError::ValidationError(format!(
                        "question '{}' is not a short-answer question",
                        grade.question_id
                    )))
                }
                None => {
                    return Err(AppError::ValidationError(format!(
                        "question '{}' is not part of quiz '{}'",
                        grade.question_id, quiz.id
                    )))
                }
            }
        }

        let result = scoring::rescore_with_manual_grades(&quiz, &attempt.answers, &grades);

        attempt.answers = result.records;
        attempt.score = result.points_earned;
        attempt.total_score = result.points_possible;
        attempt.percentage = result.percentage;
        attempt.correct_answers = result.correct_answers;
        attempt.passed = result.passed;
        attempt.needs_manual_grading = result.needs_manual_grading;

        self.attempts.update(attempt).await
    }

    async fn load_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    /// Find the attempt a submission targets: the explicit attempt_id when
    /// given, otherwise the caller's open attempt, otherwise a fresh one
    /// (still subject to the attempt cap).
    async fn resolve_attempt(
        &self,
        student_id: &str,
        quiz_id: &str,
        request: &SubmitAttemptRequest,
    ) -> AppResult<QuizAttempt> {
        if let Some(attempt_id) = &request.attempt_id {
            let attempt = self
                .attempts
                .find_by_id(attempt_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
                })?;
            if attempt.student_id != student_id {
                return Err(AppError::Forbidden(
                    "You can only submit your own attempts".to_string(),
                ));
            }
            if attempt.quiz_id != quiz_id {
                return Err(AppError::BadRequest(format!(
                    "Attempt '{}' does not belong to quiz '{}'",
                    attempt_id, quiz_id
                )));
            }
            return Ok(attempt);
        }

        if let Some(open) = self.attempts.find_open(student_id, quiz_id).await? {
            return Ok(open);
        }

        self.start_attempt(student_id, quiz_id).await
    }
}

/// Submission-shape enforcement ahead of scoring: every answer must reference
/// a question in the quiz and no question may be answered twice. Answering
/// every question is not required; unanswered questions score zero.
fn validate_submission(quiz: &Quiz, answers: &[AnswerSubmission]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for answer in answers {
        let question_id = answer.question_id();
        if quiz.question(question_id).is_none() {
            return Err(AppError::ValidationError(format!(
                "answer references question '{}' which is not part of quiz '{}'",
                question_id, quiz.id
            )));
        }
        if !seen.insert(question_id) {
            return Err(AppError::ValidationError(format!(
                "question '{}' answered more than once",
                question_id
            )));
        }
    }
    Ok(())
}
