use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    gateway::CourseGateway,
    models::{Course, Difficulty},
    repository::SharedStore,
    schema,
};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub gateway: CourseGateway,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/generate", post(generate_course))
        .route("/api/courses/search/:query", get(search_courses))
        .route("/api/courses/difficulty/:difficulty", get(courses_by_difficulty))
        .route("/api/courses/:id", get(get_course))
        .route("/api/lessons/content", post(lesson_content))
        .with_state(state)
}

type ApiResult<T> = Result<T, ApiError>;

fn body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

async fn generate_course(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    let req = schema::validate_generation_request(&body(payload)?)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Nothing is stored unless the gateway hands back a validated course.
    let new_course = state.gateway.generate(&req.topic, req.difficulty).await?;
    let course = state.store.create_course(new_course).await?;
    tracing::info!(id = course.id, title = %course.title, "course created");

    Ok((StatusCode::CREATED, Json(course)))
}

async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.store.get_all_courses().await?))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Course>> {
    let id = parse_course_id(&id)?;
    state
        .store
        .get_course(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Course"))
}

/// Non-integers are a bad request. Integers outside the `i32` key space
/// can never have been assigned, so they are simply not found.
fn parse_course_id(raw: &str) -> ApiResult<i32> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest("Invalid course ID".into()));
    }
    raw.parse::<i32>().map_err(|_| ApiError::NotFound("Course"))
}

async fn search_courses(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.store.search_courses(&query).await?))
}

async fn courses_by_difficulty(
    State(state): State<AppState>,
    Path(difficulty): Path<String>,
) -> ApiResult<Json<Vec<Course>>> {
    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid difficulty level".into()))?;
    Ok(Json(state.store.get_courses_by_difficulty(difficulty).await?))
}

async fn lesson_content(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let req = schema::validate_lesson_content_request(&body(payload)?)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let content = state
        .gateway
        .lesson_content(&req.lesson_title, &req.module_title, req.difficulty)
        .await?;
    Ok(Json(json!({ "content": content })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_ids_split_into_bad_request_and_not_found() {
        assert_eq!(parse_course_id("42").unwrap(), 42);
        assert_eq!(parse_course_id("-3").unwrap(), -3);
        for bad in ["", "-", "abc", "1.5", "+1", " 1", "generate"] {
            assert!(matches!(parse_course_id(bad), Err(ApiError::BadRequest(_))), "{bad:?}");
        }
        for huge in ["99999999999", "-99999999999", "99999999999999999999999"] {
            assert!(matches!(parse_course_id(huge), Err(ApiError::NotFound("Course"))), "{huge}");
        }
    }
}
