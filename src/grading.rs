// src/grading.rs
//
// Auto-scoring for quiz submissions. Pure and deterministic: same
// questions + same answers always produce the same outcome, nothing is
// mutated, and all persistence stays with the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PASSING_PERCENTAGE;
use crate::models::question::{Question, QuestionType};

/// A submitted answer value after intake coercion.
///
/// The variant is decided at the submission boundary
/// (`SubmitAnswerPayload::into_submitted`), so the grader never inspects
/// raw JSON. Serializes back to the wire shape the original clients sent:
/// `null`, a number, or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Unanswered,
    Index(i64),
    Text(String),
}

impl AnswerValue {
    fn as_index(&self) -> Option<i64> {
        match self {
            AnswerValue::Index(i) => Some(*i),
            _ => None,
        }
    }
}

/// One learner answer keyed by question. A question with no entry is
/// treated as unanswered.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub value: AnswerValue,
}

/// Per-question scoring detail, persisted inside the result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub question_id: i64,

    /// Echo of what the learner submitted.
    pub user_answer: AnswerValue,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub is_correct: bool,

    /// Marks the question was worth.
    pub marks: i32,

    /// Either `marks` or 0; there is no partial credit.
    pub earned_marks: i32,
}

/// Aggregate outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub answers: Vec<ScoredAnswer>,
    pub score: i32,
    pub total_marks: i32,
    pub total_questions: i32,
    /// 0-100, rounded to 2 decimals.
    pub percentage: f64,
    pub passed: bool,
}

/// States under which no meaningful result exists.
///
/// Malformed individual answers are NOT errors; they grade as incorrect
/// so one bad answer never aborts the rest of the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingError {
    /// The exam has no questions at all.
    EmptyQuestionSet,
    /// Every question carries zero marks, so a percentage is undefined.
    ZeroTotalMarks,
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::EmptyQuestionSet => write!(f, "exam has no questions"),
            GradingError::ZeroTotalMarks => write!(f, "exam questions carry no marks"),
        }
    }
}

impl std::error::Error for GradingError {}

/// Grades a submission against the authoritative question set.
///
/// Every question contributes its marks to the total whether or not it
/// was answered. Choice questions are correct iff the submitted value is
/// an index equal to the stored answer key; out-of-range and non-numeric
/// answers are simply wrong. Descriptive questions are never auto-scored
/// and wait for manual review.
pub fn grade(
    questions: &[Question],
    submitted: &[SubmittedAnswer],
) -> Result<GradeOutcome, GradingError> {
    if questions.is_empty() {
        return Err(GradingError::EmptyQuestionSet);
    }

    // First entry wins if the same question id appears twice.
    let mut by_question: HashMap<i64, &SubmittedAnswer> = HashMap::with_capacity(submitted.len());
    for answer in submitted {
        by_question.entry(answer.question_id).or_insert(answer);
    }

    let mut score = 0;
    let mut total_marks = 0;
    let mut answers = Vec::with_capacity(questions.len());

    for question in questions {
        let answer = by_question.get(&question.id);
        total_marks += question.marks;

        let is_correct = match question.question_type {
            // True/false keys are already an option index (1 = True) by
            // the time a question is stored, so both kinds reduce to an
            // index comparison.
            QuestionType::MultipleChoice | QuestionType::TrueFalse => answer
                .map(|a| a.value.as_index() == Some(i64::from(question.correct_answer)))
                .unwrap_or(false),
            QuestionType::Descriptive => false,
        };

        let earned = if is_correct { question.marks } else { 0 };
        score += earned;

        answers.push(ScoredAnswer {
            question_id: question.id,
            user_answer: answer
                .map(|a| a.value.clone())
                .unwrap_or(AnswerValue::Unanswered),
            question_type: question.question_type,
            is_correct,
            marks: question.marks,
            earned_marks: earned,
        });
    }

    if total_marks <= 0 {
        return Err(GradingError::ZeroTotalMarks);
    }

    let percentage = round2(f64::from(score) / f64::from(total_marks) * 100.0);
    let passed = percentage >= PASSING_PERCENTAGE;

    Ok(GradeOutcome {
        answers,
        score,
        total_marks,
        total_questions: questions.len() as i32,
        percentage,
        passed,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
