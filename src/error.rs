// src/error.rs
//! Error taxonomy for the analysis path and its mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned for every downstream failure. Details stay in the logs.
pub const GENERIC_FAILURE: &str = "Failed to analyze content. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Please enter content to analyze.")]
    EmptyInput,

    #[error("Only Reddit post links are supported.")]
    UnsupportedLink,

    #[error("Content is too long ({actual} characters, maximum is {max}).")]
    InputTooLong { max: usize, actual: usize },

    #[error("classifier returned HTTP {status}")]
    ExternalService { status: u16 },

    #[error("analysis unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl AnalysisError {
    /// Validation errors are reported before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyInput
                | AnalysisError::UnsupportedLink
                | AnalysisError::InputTooLong { .. }
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Text that may be shown to the end user.
    pub fn public_message(&self) -> String {
        if self.is_validation() {
            self.to_string()
        } else {
            GENERIC_FAILURE.to_string()
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        if !self.is_validation() {
            tracing::error!(error = ?self, "analysis failed");
        }
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
