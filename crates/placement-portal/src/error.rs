use crate::config::ConfigError;
use crate::portal::PortalError;
use crate::session::LoginError;
use crate::telemetry::TelemetryError;
use crate::workflows::placement::PostingError;
use crate::workflows::student::SubmitError;
use crate::workflows::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Portal(PortalError),
    Validation(ValidationError),
    Submit(SubmitError),
    Posting(PostingError),
    UnknownSession(String),
    SessionLimit { open: usize },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Submit(SubmitError::Validation(_))
            | AppError::Posting(PostingError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Portal(PortalError::Login(LoginError::Authentication(_))) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Portal(_)
            | AppError::Submit(SubmitError::Busy)
            | AppError::Posting(PostingError::Busy) => StatusCode::CONFLICT,
            AppError::Submit(SubmitError::Upload(_))
            | AppError::Posting(PostingError::Publish(_)) => StatusCode::BAD_GATEWAY,
            AppError::UnknownSession(_) => StatusCode::NOT_FOUND,
            AppError::SessionLimit { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Portal(err) => write!(f, "{}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::Submit(err) => write!(f, "{}", err),
            AppError::Posting(err) => write!(f, "{}", err),
            AppError::UnknownSession(id) => write!(f, "no portal session with id {}", id),
            AppError::SessionLimit { open } => {
                write!(f, "{} portal sessions already open; try again later", open)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Portal(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Submit(err) => Some(err),
            AppError::Posting(err) => Some(err),
            AppError::UnknownSession(_) | AppError::SessionLimit { .. } => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PortalError> for AppError {
    fn from(value: PortalError) -> Self {
        Self::Portal(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SubmitError> for AppError {
    fn from(value: SubmitError) -> Self {
        Self::Submit(value)
    }
}

impl From<PostingError> for AppError {
    fn from(value: PostingError) -> Self {
        Self::Posting(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::View;

    #[test]
    fn maps_workflow_errors_to_status_codes() {
        let missing = ValidationError::MissingInformation("fill the form");
        assert_eq!(
            AppError::from(SubmitError::Validation(missing.clone())).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(missing).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(PostingError::Busy).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(PortalError::WrongView {
                expected: View::Login,
                actual: View::Loading,
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::UnknownSession("abc".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::SessionLimit { open: 4 }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
