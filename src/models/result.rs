// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::grading::{AnswerValue, ScoredAnswer, SubmittedAnswer};

/// Represents the 'results' table in the database.
/// One row per submission; written once, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,

    /// Per-question scoring detail, in question order.
    /// Stored as a JSON array in the database.
    pub answers: Json<Vec<ScoredAnswer>>,

    pub score: i32,
    pub total_marks: i32,
    pub total_questions: i32,

    /// 0-100, rounded to 2 decimals.
    pub percentage: f64,
    pub passed: bool,

    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting a completed quiz.
#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub exam_id: i64,
    pub answers: Vec<SubmitAnswerPayload>,
}

/// One raw answer as sent by the quiz client.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerPayload {
    pub question_id: i64,

    /// `null` (unanswered), an option index, or free text.
    #[serde(default)]
    pub user_answer: serde_json::Value,

    /// The client's idea of the question type. Informational only; the
    /// grader trusts the stored question, not this field.
    #[serde(rename = "type", alias = "question_type", default)]
    pub question_type: Option<String>,
}

impl SubmitAnswerPayload {
    /// Converts the raw wire value into the grader's tagged variant.
    ///
    /// All answer-type coercion happens here, at the intake boundary:
    /// integers and integer-parsable strings become `Index`, everything
    /// else degrades to `Text` (and will grade as incorrect rather than
    /// erroring), `null` means unanswered.
    pub fn into_submitted(self) -> SubmittedAnswer {
        let value = match self.user_answer {
            serde_json::Value::Null => AnswerValue::Unanswered,
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AnswerValue::Index(i),
                None => AnswerValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => match s.trim().parse::<i64>() {
                Ok(i) => AnswerValue::Index(i),
                Err(_) => AnswerValue::Text(s),
            },
            other => AnswerValue::Text(other.to_string()),
        };

        SubmittedAnswer {
            question_id: self.question_id,
            value,
        }
    }
}

/// A student-facing result row, joined with the exam title.
#[derive(Debug, Serialize, FromRow)]
pub struct StudentResultRow {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    pub score: i32,
    pub total_marks: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub passed: bool,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A teacher-facing result row across the teacher's exams,
/// joined with exam title and student username.
#[derive(Debug, Serialize, FromRow)]
pub struct TeacherResultRow {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    pub student_id: i64,
    pub student_username: String,
    pub score: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub passed: bool,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(value: serde_json::Value) -> AnswerValue {
        SubmitAnswerPayload {
            question_id: 1,
            user_answer: value,
            question_type: None,
        }
        .into_submitted()
        .value
    }

    #[test]
    fn null_becomes_unanswered() {
        assert_eq!(convert(json!(null)), AnswerValue::Unanswered);
    }

    #[test]
    fn integers_become_indices() {
        assert_eq!(convert(json!(2)), AnswerValue::Index(2));
        assert_eq!(convert(json!("1")), AnswerValue::Index(1));
        assert_eq!(convert(json!(" 3 ")), AnswerValue::Index(3));
    }

    #[test]
    fn non_numeric_strings_stay_text() {
        assert_eq!(convert(json!("abc")), AnswerValue::Text("abc".to_string()));
        // Strict parsing: a numeric prefix is not an index.
        assert_eq!(
            convert(json!("1abc")),
            AnswerValue::Text("1abc".to_string())
        );
    }

    #[test]
    fn booleans_degrade_to_text() {
        assert_eq!(convert(json!(true)), AnswerValue::Text("true".to_string()));
    }

    #[test]
    fn missing_answer_field_defaults_to_unanswered() {
        let payload: SubmitAnswerPayload =
            serde_json::from_value(json!({ "question_id": 7 })).unwrap();
        assert_eq!(payload.into_submitted().value, AnswerValue::Unanswered);
    }
}
