use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A field of untrusted course JSON that failed the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    /// Dotted path to the offending value, e.g. `modules[2].lessons[0].content`.
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("AI service is temporarily at capacity. Please try again in a few minutes, or explore our sample courses while you wait.")]
    QuotaExhausted,
    #[error("AI service is temporarily busy. Please try again in a few moments.")]
    RateLimited,
    #[error("Course generation failed: {0}")]
    Malformed(String),
    #[error("Course generation failed: invalid course data at {0}")]
    Invalid(#[from] ValidationError),
    #[error("Course generation failed: {0}")]
    Upstream(String),
    #[error("Course generation failed: AI service is not configured")]
    Unconfigured,
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuotaExhausted => "quota_exhausted",
            Self::RateLimited => "rate_limited",
            Self::Malformed(_) => "malformed_response",
            Self::Invalid(_) => "invalid_course",
            Self::Upstream(_) => "upstream_failure",
            Self::Unconfigured => "unconfigured",
        }
    }

    /// Whether retrying later has a reasonable chance of succeeding.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::QuotaExhausted | Self::RateLimited)
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("stored record {id} is unreadable: {reason}")]
    Corrupt { id: i32, reason: String },
}

/// Everything a handler can fail with, rendered as
/// `{"error": ..., "kind": ..., "message": ..., "retryable": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request", "bad_request"),
            Self::NotFound("Course") => (StatusCode::NOT_FOUND, "Course not found", "not_found"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Not found", "not_found"),
            Self::Generation(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate course",
                e.kind(),
            ),
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage failure", "storage"),
        }
    }

    /// Client-facing message. Storage details stay in the server log.
    fn message(&self) -> String {
        match self {
            Self::Storage(_) => "Failed to access course storage".to_string(),
            other => other.to_string(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Generation(e) if e.is_temporary())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, kind) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, kind, "request failed");
        }
        let body = json!({
            "error": error,
            "kind": kind,
            "message": self.message(),
            "retryable": self.retryable(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_and_rate_limit_are_temporary_and_distinct() {
        assert!(GenerationError::QuotaExhausted.is_temporary());
        assert!(GenerationError::RateLimited.is_temporary());
        assert!(!GenerationError::Malformed("x".into()).is_temporary());
        assert_ne!(
            GenerationError::QuotaExhausted.to_string(),
            GenerationError::Upstream("boom".into()).to_string()
        );
    }

    #[test]
    fn status_codes_follow_error_class() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(ApiError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ApiError::NotFound("Course")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(GenerationError::RateLimited.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(StorageError::Conflict("username".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    async fn body_of(e: ApiError) -> serde_json::Value {
        use http_body_util::BodyExt;

        let bytes = e.into_response().into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn storage_failures_do_not_leak_driver_text() {
        let err = ApiError::from(StorageError::Database(sqlx::Error::Protocol(
            "connection to postgres://app:secret@db:5432 refused".into(),
        )));
        let body = body_of(err).await;
        assert_eq!(body["kind"], "storage");
        assert_eq!(body["message"], "Failed to access course storage");
        assert!(!body.to_string().contains("secret"));
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn only_capacity_errors_are_retryable() {
        assert_eq!(body_of(GenerationError::QuotaExhausted.into()).await["retryable"], true);
        assert_eq!(body_of(GenerationError::RateLimited.into()).await["retryable"], true);
        for e in [
            GenerationError::Malformed("x".into()),
            GenerationError::Upstream("500".into()),
            GenerationError::Unconfigured,
        ] {
            assert_eq!(body_of(e.into()).await["retryable"], false);
        }
        assert_eq!(body_of(ApiError::BadRequest("x".into())).await["retryable"], false);
    }
}
