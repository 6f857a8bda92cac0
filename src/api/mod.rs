//! Itinerary backend API
//!
//! This module provides:
//! - Request/response shapes for `/submit`, `/generate_itinerary` and
//!   `/finalize_itinerary`
//! - The `ItineraryApi` trait the workflow depends on
//! - A reqwest implementation of it

pub mod client;
pub mod error;

pub use client::HttpItineraryApi;
pub use error::{ApiError, Operation};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::form::FormState;

/// Body of `POST /generate_itinerary`.
///
/// A first generation sends only the form; a revision adds the user's
/// feedback and the plain text of the itinerary currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub form: FormState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_itinerary: Option<String>,
}

impl GenerateRequest {
    pub fn initial(form: FormState) -> Self {
        Self {
            form,
            feedback: None,
            current_itinerary: None,
        }
    }

    pub fn revision(
        form: FormState,
        feedback: impl Into<String>,
        current_itinerary: impl Into<String>,
    ) -> Self {
        Self {
            form,
            feedback: Some(feedback.into()),
            current_itinerary: Some(current_itinerary.into()),
        }
    }

    pub fn is_revision(&self) -> bool {
        self.feedback.is_some()
    }
}

/// Body of `POST /finalize_itinerary`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeRequest {
    #[serde(flatten)]
    pub form: FormState,
    pub itinerary_text: String,
    pub image_url: String,
}

/// Response from `/submit`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
}

/// Response from `/generate_itinerary`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateResponse {
    /// Markdown source of the itinerary
    pub itinerary_text: String,
}

/// Response from `/finalize_itinerary`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinalizeResponse {
    pub pdf_url: String,
}

/// Body of any non-2xx response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend the itinerary workflow talks to
#[async_trait]
pub trait ItineraryApi: Send + Sync {
    async fn submit(&self, form: &FormState) -> Result<SubmitResponse, ApiError>;

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError>;

    async fn finalize(&self, request: &FinalizeRequest) -> Result<FinalizeResponse, ApiError>;

    /// Turn a server-relative artifact URL into one the user can open
    fn resolve_url(&self, url: &str) -> String {
        url.to_string()
    }
}
