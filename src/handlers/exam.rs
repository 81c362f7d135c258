// src/handlers/exam.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, Exam, ExamListParams, UpdateExamRequest},
        question::{PublicQuestion, Question},
    },
    utils::{
        html::clean_html,
        jwt::{Claims, require_teacher},
    },
};

/// Lists exams, optionally filtered by status and a title keyword.
pub async fn list_exams(
    State(pool): State<PgPool>,
    Query(params): Query<ExamListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, teacher_id, title, description, duration_minutes, status, created_at \
         FROM exams WHERE 1 = 1",
    );

    if let Some(status) = params.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    if let Some(keyword) = params.q {
        builder.push(" AND title ILIKE ");
        builder.push_bind(format!("%{}%", keyword));
    }

    builder.push(" ORDER BY created_at DESC");

    let exams: Vec<Exam> = builder.build_query_as().fetch_all(&pool).await?;

    Ok(Json(exams))
}

/// Retrieves a single exam by ID.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam: Option<Exam> = sqlx::query_as(
        "SELECT id, teacher_id, title, description, duration_minutes, status, created_at \
         FROM exams WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let exam = exam.ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam))
}

/// Lists an exam's questions for quiz-taking.
///
/// Maps to `PublicQuestion` so the answer key never reaches the client.
pub async fn list_exam_questions(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM exams WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let questions: Vec<Question> = sqlx::query_as(
        r#"
        SELECT id, exam_id, text, type, options, correct_answer, marks, created_at
        FROM questions
        WHERE exam_id = $1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions for exam {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    let public_questions: Vec<PublicQuestion> =
        questions.into_iter().map(PublicQuestion::from).collect();

    Ok(Json(public_questions))
}

/// Creates a new exam owned by the calling teacher.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_teacher(&claims)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let description = clean_html(payload.description.as_deref().unwrap_or(""));

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO exams (teacher_id, title, description, duration_minutes, status)
        VALUES ($1, $2, $3, $4, COALESCE($5, 'draft'::exam_status))
        RETURNING id
        "#,
    )
    .bind(claims.user_id())
    .bind(clean_html(&payload.title))
    .bind(description)
    .bind(payload.duration_minutes)
    .bind(payload.status)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates an exam by ID. Owner only.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_teacher(&claims)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    check_exam_owner(&pool, id, claims.user_id()).await?;

    if payload.title.is_none()
        && payload.description.is_none()
        && payload.duration_minutes.is_none()
        && payload.status.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_html(&title));
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(duration_minutes) = payload.duration_minutes {
        separated.push("duration_minutes = ");
        separated.push_bind_unseparated(duration_minutes);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes an exam by ID. Owner only.
/// Questions and results cascade at the database level.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_teacher(&claims)?;

    check_exam_owner(&pool, id, claims.user_id()).await?;

    sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// 404 when the exam does not exist, 403 when it belongs to someone else.
pub async fn check_exam_owner(pool: &PgPool, exam_id: i64, user_id: i64) -> Result<(), AppError> {
    let owner: Option<(i64,)> = sqlx::query_as("SELECT teacher_id FROM exams WHERE id = $1")
        .bind(exam_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(AppError::NotFound("Exam not found".to_string())),
        Some((teacher_id,)) if teacher_id != user_id => Err(AppError::Forbidden(
            "You do not own this exam".to_string(),
        )),
        Some(_) => Ok(()),
    }
}
