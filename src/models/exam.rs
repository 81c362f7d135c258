// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Lifecycle of an exam. Students may only take 'active' exams; the
/// listing endpoint still returns every status so teachers can manage
/// drafts through the same surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exam_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Draft,
    Active,
    Inactive,
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    /// Owning teacher's user id.
    pub teacher_id: i64,

    pub title: String,

    pub description: String,

    /// Time allowed for one attempt, in minutes.
    pub duration_minutes: i32,

    pub status: ExamStatus,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: i32,
    pub status: Option<ExamStatus>,
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
    pub status: Option<ExamStatus>,
}

/// Query parameters for listing exams.
#[derive(Debug, Deserialize)]
pub struct ExamListParams {
    pub status: Option<ExamStatus>,
    /// Case-insensitive title search.
    pub q: Option<String>,
}
