//! Error types and handling for the climate forecast service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the climate forecast service
#[derive(Error, Debug)]
pub enum ClimateError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The climate data provider failed or returned something unusable
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Provider data that does not line up with its own metadata
    #[error("Data integrity error: {message}")]
    DataIntegrity { message: String },

    /// The forecasting model could not be fitted to the series
    #[error("Model fitting error: {message}")]
    ModelFit { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ClimateError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream provider error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new data integrity error
    pub fn data_integrity<S: Into<String>>(message: S) -> Self {
        Self::DataIntegrity {
            message: message.into(),
        }
    }

    /// Create a new model fitting error
    pub fn model_fit<S: Into<String>>(message: S) -> Self {
        Self::ModelFit {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status reported to clients for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClimateError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ClimateError::ModelFit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ClimateError::Validation { .. } => StatusCode::BAD_REQUEST,
            ClimateError::Config { .. }
            | ClimateError::DataIntegrity { .. }
            | ClimateError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClimateError::Config { .. } => {
                "Configuration error. Please check the service configuration.".to_string()
            }
            ClimateError::Upstream { .. } => {
                "Climate data provider is unavailable. Please try again later.".to_string()
            }
            ClimateError::DataIntegrity { message } => {
                format!("Received inconsistent climate data: {message}")
            }
            ClimateError::ModelFit { message } => {
                format!("Unable to compute forecast: {message}")
            }
            ClimateError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            ClimateError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ClimateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}
