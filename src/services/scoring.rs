//! Pure scoring of a submitted answer set against a quiz definition.
//!
//! No persistence and no side effects: the same quiz and answers always
//! produce the same result. Malformed-but-structurally-valid input never
//! raises; questionable input degrades to zero score and is annotated in
//! `warnings` for the caller to log and surface.

use std::collections::{hash_map::Entry, BTreeSet, HashMap};

use crate::models::domain::{question::QuestionType, AnswerRecord, Question, Quiz};
use crate::models::dto::request::AnswerSubmission;

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreResult {
    pub records: Vec<AnswerRecord>,
    pub points_earned: i32,
    pub points_possible: i32,
    /// The percentage denominator: selectable question points plus the
    /// points of short-answer questions an instructor has already graded.
    pub gradable_points: i32,
    pub percentage: f64,
    pub passed: bool,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub needs_manual_grading: bool,
    pub warnings: Vec<String>,
}

/// Score a submission. Every question in the quiz gets an `AnswerRecord`,
/// answered or not; unanswered questions score zero. Short-answer questions
/// are recorded ungraded and stay out of the automated percentage until an
/// instructor grades them.
pub fn score(quiz: &Quiz, answers: &[AnswerSubmission]) -> ScoreResult {
    let mut warnings = Vec::new();

    let mut by_question: HashMap<&str, &AnswerSubmission> = HashMap::new();
    for answer in answers {
        let question_id = answer.question_id();
        if quiz.question(question_id).is_none() {
            warnings.push(format!(
                "answer references unknown question '{}'; ignored",
                question_id
            ));
            continue;
        }
        match by_question.entry(question_id) {
            Entry::Vacant(entry) => {
                entry.insert(answer);
            }
            Entry::Occupied(_) => warnings.push(format!(
                "duplicate answer for question '{}'; first submission kept",
                question_id
            )),
        }
    }

    let records: Vec<AnswerRecord> = quiz
        .questions
        .iter()
        .map(|question| score_question(question, by_question.get(question.id.as_str()).copied(), &mut warnings))
        .collect();

    finalize(quiz, records, warnings)
}

/// Recompute an attempt's totals after an instructor grades short answers.
/// Awarded points are clamped to the question's point value; a fully-credited
/// short answer counts as correct. Graded short-answer points join the
/// percentage denominator.
pub fn rescore_with_manual_grades(
    quiz: &Quiz,
    records: &[AnswerRecord],
    grades: &HashMap<String, i32>,
) -> ScoreResult {
    let records = records
        .iter()
        .map(|record| {
            let question = quiz.question(&record.question_id);
            match (question, grades.get(&record.question_id)) {
                (Some(question), Some(&awarded))
                    if question.question_type == QuestionType::ShortAnswer =>
                {
                    let points_earned = awarded.clamp(0, question.points);
                    AnswerRecord {
                        points_earned,
                        is_correct: points_earned >= question.points,
                        graded: true,
                        ..record.clone()
                    }
                }
                _ => record.clone(),
            }
        })
        .collect();

    finalize(quiz, records, Vec::new())
}

fn score_question(
    question: &Question,
    submission: Option<&AnswerSubmission>,
    warnings: &mut Vec<String>,
) -> AnswerRecord {
    let mut record = AnswerRecord {
        question_id: question.id.clone(),
        selected_option_ids: vec![],
        answer_text: None,
        is_correct: false,
        points_earned: 0,
        graded: question.question_type.is_selectable(),
    };

    match (question.question_type, submission) {
        (QuestionType::MultipleChoice | QuestionType::TrueFalse, Some(submission)) => {
            match submission {
                AnswerSubmission::Choice {
                    selected_option_ids,
                    ..
                } => {
                    let correct = question.correct_option_ids();
                    if correct.is_empty() {
                        warnings.push(format!(
                            "question '{}' has no correct options; scored as incorrect",
                            question.id
                        ));
                    }
                    let selected: BTreeSet<&str> =
                        selected_option_ids.iter().map(String::as_str).collect();

                    // Exact set equality: no partial credit for a partially
                    // correct multi-select.
                    if !correct.is_empty() && selected == correct {
                        record.is_correct = true;
                        record.points_earned = question.points;
                    }
                    record.selected_option_ids = selected_option_ids.clone();
                }
                AnswerSubmission::Text { .. } => {
                    warnings.push(format!(
                        "free-text answer submitted for selectable question '{}'; scored as incorrect",
                        question.id
                    ));
                }
            }
        }
        (QuestionType::ShortAnswer, Some(submission)) => {
            record.graded = false;
            match submission {
                AnswerSubmission::Text { answer_text, .. } => {
                    record.answer_text = Some(answer_text.clone());
                }
                AnswerSubmission::Choice { .. } => {
                    warnings.push(format!(
                        "option selection submitted for short-answer question '{}'; nothing to grade",
                        question.id
                    ));
                }
            }
        }
        // Unanswered: zero points. A selectable question is simply wrong; an
        // unanswered short answer has nothing for an instructor to grade.
        (_, None) => {
            record.graded = question.question_type.is_selectable();
        }
    }

    record
}

fn finalize(quiz: &Quiz, records: Vec<AnswerRecord>, mut warnings: Vec<String>) -> ScoreResult {
    let points_earned: i32 = records.iter().map(|r| r.points_earned).sum();
    let points_possible = quiz.total_points();
    let correct_answers = records.iter().filter(|r| r.is_correct).count() as i32;
    let total_questions = quiz.questions.len() as i32;

    let gradable_points: i32 = quiz
        .questions
        .iter()
        .zip(&records)
        .map(|(question, record)| {
            if question.question_type.is_selectable() || record.graded {
                question.points
            } else {
                0
            }
        })
        .sum();

    let needs_manual_grading = records
        .iter()
        .any(|r| r.answer_text.is_some() && !r.graded);

    let (percentage, passed) = if gradable_points > 0 {
        let percentage = round_percentage(points_earned as f64 / gradable_points as f64 * 100.0);
        (percentage, percentage >= quiz.passing_score)
    } else {
        warnings.push(format!(
            "quiz '{}' has no automatically gradable points; scored 0",
            quiz.id
        ));
        (0.0, false)
    };

    ScoreResult {
        records,
        points_earned,
        points_possible,
        gradable_points,
        percentage,
        passed,
        correct_answers,
        total_questions,
        needs_manual_grading,
        warnings,
    }
}

fn round_percentage(raw: f64) -> f64 {
    (raw * 10.0).round() / 10.0
}
