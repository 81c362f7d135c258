// src/handlers/question.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::exam::check_exam_owner,
    models::question::{CreateQuestionRequest, Question, QuestionType, UpdateQuestionRequest},
    utils::{html::clean_html, jwt::Claims},
};

/// Placeholder option stored for descriptive questions; they are answered
/// in free text and reviewed manually, never auto-scored.
const DESCRIPTIVE_PLACEHOLDER: &str = "Descriptive Answer";

/// Applies the type-conditional rules to client-supplied options and
/// answer key, returning what actually gets stored.
///
/// * multiple-choice: at least 2 options, answer key must be an in-range
///   option index (defaults to 0 when omitted).
/// * true-false: options are forced to `["True", "False"]` and the key is
///   normalized to an index with the grader's convention - truthy or the
///   string "true" means index 1.
/// * descriptive: a single placeholder option, key unused.
fn normalize_question_fields(
    question_type: QuestionType,
    options: Option<Vec<String>>,
    correct_answer: Option<&Value>,
) -> Result<(Vec<String>, i32), AppError> {
    match question_type {
        QuestionType::MultipleChoice => {
            let options = options.unwrap_or_default();
            if options.len() < 2 {
                return Err(AppError::BadRequest(
                    "Multiple choice questions require at least 2 options".to_string(),
                ));
            }
            for option in &options {
                if option.is_empty() || option.len() > 500 {
                    return Err(AppError::BadRequest(
                        "Options must be between 1 and 500 characters".to_string(),
                    ));
                }
            }
            let options: Vec<String> = options.iter().map(|o| clean_html(o)).collect();

            let correct = match correct_answer {
                None | Some(Value::Null) => 0,
                Some(value) => coerce_index(value).ok_or(AppError::BadRequest(
                    "correct_answer must be an option index".to_string(),
                ))?,
            };
            if correct < 0 || correct as usize >= options.len() {
                return Err(AppError::BadRequest(
                    "correct_answer index is out of range".to_string(),
                ));
            }

            Ok((options, correct as i32))
        }
        QuestionType::TrueFalse => {
            let correct = match correct_answer {
                Some(Value::Bool(true)) => 1,
                Some(Value::String(s)) if s == "true" => 1,
                Some(Value::Number(n)) if n.as_i64().is_some_and(|v| v != 0) => 1,
                _ => 0,
            };
            Ok((vec!["True".to_string(), "False".to_string()], correct))
        }
        QuestionType::Descriptive => Ok((vec![DESCRIPTIVE_PLACEHOLDER.to_string()], 0)),
    }
}

fn coerce_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Creates a new question on one of the caller's exams.
pub async fn create_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    check_exam_owner(&pool, payload.exam_id, claims.user_id()).await?;

    let (options, correct_answer) = normalize_question_fields(
        payload.question_type,
        payload.options,
        payload.correct_answer.as_ref(),
    )?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (exam_id, text, type, options, correct_answer, marks)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(payload.exam_id)
    .bind(clean_html(&payload.text))
    .bind(payload.question_type)
    .bind(SqlJson(options))
    .bind(correct_answer)
    .bind(payload.marks.unwrap_or(1))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Retrieves a single question, including the answer key.
/// Owning teacher only.
pub async fn get_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = fetch_owned_question(&pool, id, claims.user_id()).await?;
    Ok(Json(question))
}

/// Updates a question by ID. Owning teacher only.
///
/// When the type, options or answer key change, the stored options and
/// key are re-normalized against the effective type so the invariants
/// hold after every update.
pub async fn update_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let existing = fetch_owned_question(&pool, id, claims.user_id()).await?;

    let retype = payload.question_type.is_some()
        || payload.options.is_some()
        || payload.correct_answer.is_some();

    if payload.text.is_none() && payload.marks.is_none() && !retype {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(text) = payload.text {
        separated.push("text = ");
        separated.push_bind_unseparated(clean_html(&text));
    }

    if let Some(marks) = payload.marks {
        separated.push("marks = ");
        separated.push_bind_unseparated(marks);
    }

    if retype {
        let question_type = payload.question_type.unwrap_or(existing.question_type);
        let options = payload.options.or(Some(existing.options.0));
        let (options, correct_answer) =
            normalize_question_fields(question_type, options, payload.correct_answer.as_ref())?;

        separated.push("type = ");
        separated.push_bind_unseparated(question_type);
        separated.push("options = ");
        separated.push_bind_unseparated(SqlJson(options));
        separated.push("correct_answer = ");
        separated.push_bind_unseparated(correct_answer);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes a question by ID. Owning teacher only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_question(&pool, id, claims.user_id()).await?;

    sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Loads a question and checks the caller owns its exam.
/// 404 when absent, 403 when owned by another teacher.
async fn fetch_owned_question(
    pool: &PgPool,
    question_id: i64,
    user_id: i64,
) -> Result<Question, AppError> {
    let question: Option<Question> = sqlx::query_as(
        r#"
        SELECT id, exam_id, text, type, options, correct_answer, marks, created_at
        FROM questions
        WHERE id = $1
        "#,
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    let Some(question) = question else {
        return Err(AppError::NotFound("Question not found".to_string()));
    };

    check_exam_owner(pool, question.exam_id, user_id).await?;

    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multiple_choice_requires_two_options() {
        let err = normalize_question_fields(
            QuestionType::MultipleChoice,
            Some(vec!["only one".to_string()]),
            None,
        );
        assert!(err.is_err());

        let err = normalize_question_fields(QuestionType::MultipleChoice, None, None);
        assert!(err.is_err());
    }

    #[test]
    fn multiple_choice_accepts_index_or_numeric_string() {
        let options = Some(vec!["A".to_string(), "B".to_string(), "C".to_string()]);

        let (_, correct) =
            normalize_question_fields(QuestionType::MultipleChoice, options.clone(), Some(&json!(2)))
                .unwrap();
        assert_eq!(correct, 2);

        let (_, correct) =
            normalize_question_fields(QuestionType::MultipleChoice, options, Some(&json!("1")))
                .unwrap();
        assert_eq!(correct, 1);
    }

    #[test]
    fn multiple_choice_rejects_out_of_range_key() {
        let options = Some(vec!["A".to_string(), "B".to_string()]);
        let err =
            normalize_question_fields(QuestionType::MultipleChoice, options, Some(&json!(5)));
        assert!(err.is_err());
    }

    #[test]
    fn multiple_choice_key_defaults_to_zero() {
        let options = Some(vec!["A".to_string(), "B".to_string()]);
        let (_, correct) =
            normalize_question_fields(QuestionType::MultipleChoice, options, None).unwrap();
        assert_eq!(correct, 0);
    }

    #[test]
    fn true_false_key_normalizes_truthy_to_one() {
        for truthy in [json!(true), json!("true"), json!(1)] {
            let (options, correct) =
                normalize_question_fields(QuestionType::TrueFalse, None, Some(&truthy)).unwrap();
            assert_eq!(options, vec!["True".to_string(), "False".to_string()]);
            assert_eq!(correct, 1);
        }

        for falsy in [json!(false), json!("false"), json!(0), json!(null)] {
            let (_, correct) =
                normalize_question_fields(QuestionType::TrueFalse, None, Some(&falsy)).unwrap();
            assert_eq!(correct, 0);
        }
    }

    #[test]
    fn true_false_ignores_client_options() {
        let (options, _) = normalize_question_fields(
            QuestionType::TrueFalse,
            Some(vec!["Yes".to_string(), "No".to_string(), "Maybe".to_string()]),
            None,
        )
        .unwrap();
        assert_eq!(options, vec!["True".to_string(), "False".to_string()]);
    }

    #[test]
    fn descriptive_stores_placeholder_option() {
        let (options, correct) = normalize_question_fields(
            QuestionType::Descriptive,
            None,
            Some(&json!("whatever the client sent")),
        )
        .unwrap();
        assert_eq!(options, vec![DESCRIPTIVE_PLACEHOLDER.to_string()]);
        assert_eq!(correct, 0);
    }
}
