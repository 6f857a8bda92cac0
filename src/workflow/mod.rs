//! Itinerary workflow after the trip form is submitted
//!
//! - `phase`: phases, the transition function and the controls projection
//! - `controller`: the single owner of workflow state
//! - `document`: the rendered itinerary
//! - `collage`: destination image URL

pub mod collage;
pub mod controller;
pub mod document;
pub mod phase;

pub use collage::CollageTemplate;
pub use controller::{Completion, Notice, PendingRequest, WorkflowController, WorkflowError};
pub use document::{DownloadArtifact, ItineraryDocument};
pub use phase::{project, ControlView, TransitionError, WorkflowEvent, WorkflowPhase, WorkflowView};
