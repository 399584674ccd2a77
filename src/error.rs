use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Caller is not a professor of course {0}")]
    NotAuthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Quiz {0} has ended")]
    QuizEnded(String),

    #[error("Concurrent write on {0}")]
    Conflict(String),

    #[error("Answer sequences differ in length: {student} answers for {key} keys")]
    LengthMismatch { student: usize, key: usize },

    #[error("The completion did not contain any usable exercise")]
    NoExerciseGenerated,

    #[error("The completion did not contain any usable card")]
    NoCardGenerated,

    #[error("Completion service unavailable")]
    PromptAi,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable label handed to clients; the UI layer maps it to a message.
    pub fn label(&self) -> &'static str {
        match self {
            Error::NoExerciseGenerated => "no-exercise-generated",
            Error::NoCardGenerated => "no-card-generated",
            Error::PromptAi => "error-prompt-ai",
            Error::NotAuthorized(_) => "not_authorized",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::InvalidTransition(_) => "invalid_transition",
            Error::QuizEnded(_) => "quiz_ended",
            Error::Conflict(_) => "conflict",
            Error::LengthMismatch { .. } => "length_mismatch",
            Error::BadRequest(_) | Error::Validation(_) | Error::Json(_) => "bad_request",
            Error::Reqwest(_) => "upstream",
            _ => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_)
            | Error::Validation(_)
            | Error::Json(_)
            | Error::LengthMismatch { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotAuthorized(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidTransition(_) | Error::QuizEnded(_) | Error::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Error::NoExerciseGenerated | Error::NoCardGenerated => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::PromptAi | Error::Reqwest(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": self.label(), "message": message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
