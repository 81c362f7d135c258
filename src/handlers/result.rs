// src/handlers/result.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    error::AppError,
    grading::{self, SubmittedAnswer},
    models::{
        question::Question,
        result::{ExamResult, StudentResultRow, SubmitResultRequest, TeacherResultRow},
    },
    utils::jwt::{Claims, require_teacher},
};

/// Submits a completed quiz and stores the auto-scored result.
///
/// The whole submission is one unit of work: validate the exam, load its
/// authoritative question set, convert the raw answers at the intake
/// boundary, grade, persist. Exactly one result row is written per
/// submission; results are never updated afterwards.
pub async fn submit_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let exam: Option<(i64,)> = sqlx::query_as("SELECT id FROM exams WHERE id = $1")
        .bind(req.exam_id)
        .fetch_optional(&pool)
        .await?;

    if exam.is_none() {
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
    .bind(req.exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions for grading: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::debug!(
        exam_id = req.exam_id,
        student_id,
        answers = req.answers.len(),
        questions = questions.len(),
        "grading submission"
    );

    // Intake boundary: raw wire values become tagged answer variants here.
    // The client's declared question type is advisory only.
    let submitted: Vec<SubmittedAnswer> = req
        .answers
        .into_iter()
        .map(|payload| {
            if let Some(declared) = payload.question_type.as_deref() {
                if let Some(q) = questions.iter().find(|q| q.id == payload.question_id) {
                    let stored = serde_json::to_value(q.question_type).ok();
                    if stored.as_ref().and_then(|v| v.as_str()) != Some(declared) {
                        tracing::debug!(
                            question_id = payload.question_id,
                            declared,
                            "client-declared question type disagrees with stored type; ignoring"
                        );
                    }
                }
            }
            payload.into_submitted()
        })
        .collect();

    let outcome = grading::grade(&questions, &submitted)?;

    let result_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO results
            (exam_id, student_id, answers, score, total_marks, total_questions, percentage, passed)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(req.exam_id)
    .bind(student_id)
    .bind(SqlJson(&outcome.answers))
    .bind(outcome.score)
    .bind(outcome.total_marks)
    .bind(outcome.total_questions)
    .bind(outcome.percentage)
    .bind(outcome.passed)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        result_id,
        exam_id = req.exam_id,
        student_id,
        score = outcome.score,
        total_marks = outcome.total_marks,
        percentage = outcome.percentage,
        passed = outcome.passed,
        "result saved"
    );

    Ok(Json(serde_json::json!({
        "result_id": result_id,
        "score": outcome.score,
        "total_marks": outcome.total_marks,
        "total_questions": outcome.total_questions,
        "percentage": outcome.percentage,
        "passed": outcome.passed,
        "message": "Exam submitted successfully"
    })))
}

/// Retrieves one result with its per-question detail.
///
/// Students may read their own results; teachers may read results of
/// exams they own.
pub async fn get_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result: Option<ExamResult> = sqlx::query_as(
        r#"
        SELECT id, exam_id, student_id, answers, score, total_marks,
               total_questions, percentage, passed, submitted_at
        FROM results
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let result = result.ok_or(AppError::NotFound("Result not found".to_string()))?;

    let user_id = claims.user_id();
    if result.student_id != user_id {
        let owner: Option<(i64,)> = sqlx::query_as("SELECT teacher_id FROM exams WHERE id = $1")
            .bind(result.exam_id)
            .fetch_optional(&pool)
            .await?;
        if owner.map(|(t,)| t) != Some(user_id) {
            return Err(AppError::Forbidden(
                "You may only view your own results".to_string(),
            ));
        }
    }

    Ok(Json(result))
}

/// Lists a student's results across all exams, newest first.
/// Students may only query themselves; teachers may query any student.
pub async fn list_student_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != "teacher" && claims.user_id() != student_id {
        return Err(AppError::Forbidden(
            "You may only view your own results".to_string(),
        ));
    }

    let results: Vec<StudentResultRow> = sqlx::query_as(
        r#"
        SELECT r.id, r.exam_id, e.title AS exam_title, r.score, r.total_marks,
               r.total_questions, r.percentage, r.passed, r.submitted_at
        FROM results r
        JOIN exams e ON e.id = r.exam_id
        WHERE r.student_id = $1
        ORDER BY r.submitted_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch student results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Lists every result across the calling teacher's exams, newest first.
pub async fn list_teacher_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    require_teacher(&claims)?;

    let results: Vec<TeacherResultRow> = sqlx::query_as(
        r#"
        SELECT r.id, r.exam_id, e.title AS exam_title, r.student_id,
               u.username AS student_username, r.score, r.total_marks,
               r.percentage, r.passed, r.submitted_at
        FROM results r
        JOIN exams e ON e.id = r.exam_id
        JOIN users u ON u.id = r.student_id
        WHERE e.teacher_id = $1
        ORDER BY r.submitted_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch teacher results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}
