// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Question kind, stored as a Postgres enum.
///
/// True/false questions keep their answer key as an option index into
/// `["True", "False"]`... except that index 1 means True: the key is
/// normalized from the client's boolean at creation time with the same
/// truthy-to-1 convention the grader expects. Descriptive questions are
/// never auto-scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    Descriptive,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning exam.
    pub exam_id: i64,

    /// The text content of the question.
    pub text: String,

    /// Mapped from the database column 'type' since `type` is a reserved
    /// keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Ordered list of option strings (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database. Descriptive questions carry
    /// a single placeholder option.
    pub options: Json<Vec<String>>,

    /// Index of the correct option. Unused for descriptive questions.
    pub correct_answer: i32,

    /// Point value of the question.
    pub marks: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to quiz-taking clients
/// (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub exam_id: i64,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Json<Vec<String>>,
    pub marks: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            exam_id: q.exam_id,
            text: q.text,
            question_type: q.question_type,
            options: q.options,
            marks: q.marks,
        }
    }
}

/// DTO for creating a new question.
///
/// `correct_answer` is accepted as raw JSON because clients send an option
/// index for multiple choice but a boolean (or the string "true") for
/// true/false; the handler normalizes it to an index before storage.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub exam_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<serde_json::Value>,
    #[validate(range(min = 1, max = 100))]
    pub marks: Option<i32>,
}

/// DTO for updating a question. Fields are optional; option and answer
/// fields are re-normalized against the (possibly updated) type.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<serde_json::Value>,
    #[validate(range(min = 1, max = 100))]
    pub marks: Option<i32>,
}
