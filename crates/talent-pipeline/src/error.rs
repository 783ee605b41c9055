use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::pipeline::{PersistenceError, PipelineError};
use crate::workflows::roster::RosterError;
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
    Pipeline(PipelineError),
    Persistence(PersistenceError),
    Roster(RosterError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Pipeline(err) => write!(f, "pipeline error: {}", err),
            AppError::Persistence(err) => write!(f, "persistence error: {}", err),
            AppError::Roster(err) => write!(f, "roster error: {}", err),
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
            AppError::Pipeline(err) => Some(err),
            AppError::Persistence(err) => Some(err),
            AppError::Roster(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Pipeline(PipelineError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Pipeline(PipelineError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Pipeline(PipelineError::InvalidState(_)) => StatusCode::CONFLICT,
            AppError::Roster(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

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

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<PersistenceError> for AppError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<RosterError> for AppError {
    fn from(value: RosterError) -> Self {
        Self::Roster(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pipeline::{CandidateId, InvalidStateError};

    #[test]
    fn pipeline_errors_map_to_client_statuses() {
        let not_found = AppError::from(PipelineError::NotFound(CandidateId::from("cand-404")));
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let conflict = AppError::from(PipelineError::from(InvalidStateError::NoOffer(
            CandidateId::from("cand-000001"),
        )));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn persistence_errors_are_server_errors() {
        let err = AppError::from(PersistenceError::Unavailable("disk full".to_string()));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
