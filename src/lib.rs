//! travel-buddy - terminal trip planner backed by an itinerary service
//!
//! The form wizard collects trip preferences, the workflow controller drives
//! submit, generate, revise and finalize against the backend.

pub mod api;
pub mod app;
pub mod config;
pub mod form;
pub mod headless;
pub mod logging;
pub mod ui;
pub mod workflow;
