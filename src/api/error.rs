//! API error types for the itinerary backend

use std::time::Duration;
use thiserror::Error;

/// The backend calls the workflow makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Submit,
    Generate,
    Revise,
    Finalize,
}

impl Operation {
    /// Endpoint path for this operation
    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::Submit => "/submit",
            Operation::Generate | Operation::Revise => "/generate_itinerary",
            Operation::Finalize => "/finalize_itinerary",
        }
    }

    /// Prefix put in front of a server-provided message
    fn server_prefix(self) -> &'static str {
        match self {
            Operation::Submit => "Error",
            Operation::Generate | Operation::Revise => "Error generating itinerary",
            Operation::Finalize => "Error finalizing itinerary",
        }
    }

    /// Fixed message for transport and decode failures
    fn fallback_message(self) -> &'static str {
        match self {
            Operation::Submit => "Something went wrong. Please try again.",
            Operation::Generate | Operation::Revise => "Failed to generate itinerary.",
            Operation::Finalize => "Failed to finalize itinerary.",
        }
    }
}

/// Errors that can occur when talking to the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Non-2xx response carrying a message
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },
    /// Could not reach the server
    #[error("network error: {0}")]
    Network(String),
    /// No response within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body was not the expected JSON
    #[error("invalid response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ApiError::Server {
            status,
            message: message.into(),
        }
    }

    /// Whether the server itself reported the failure
    pub fn is_server_reported(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }

    /// Text for the blocking alert shown to the user.
    ///
    /// Server messages are surfaced verbatim; everything else gets the
    /// operation's fixed message.
    pub fn alert_text(&self, operation: Operation) -> String {
        match self {
            ApiError::Server { message, .. } => {
                format!("{}: {}", operation.server_prefix(), message)
            }
            _ => operation.fallback_message().to_string(),
        }
    }
}
