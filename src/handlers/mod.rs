// Diarization API HTTP handlers
//
// This module contains the HTTP handlers for the diarization API.
// It provides the interface between HTTP requests and the pipeline.

pub mod authentication;
pub mod form;
pub mod routes;

// Re-export handlers for easier access
pub use self::routes::{diarize, health, service_info};
// Re-export authentication middleware
pub use self::authentication::Authentication;
