//! Filegate API Library
//!
//! HTTP surface of the intake pipeline: authorization check, intake orchestrator,
//! re-scan, retrieval gate, and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, Collaborators};
