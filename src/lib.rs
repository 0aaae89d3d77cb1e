// Diarization API Library
//
// This crate provides an HTTP API for speaker diarization using pyannote
// ONNX models. Uploaded audio is normalized to 16 kHz mono PCM through
// ffmpeg before inference.

pub mod config;
pub mod config_loader;
pub mod converter;
pub mod error;
pub mod file_utils;
pub mod handlers;
pub mod metrics;
pub mod model_fetch;
pub mod models;
pub mod pipeline;

// Re-export common types for easier access
pub use config::{HandlerConfig, MetricsConfig, PipelineConfig};
pub use converter::ConverterConfig;
pub use error::HandlerError;
pub use handlers::{diarize, health, service_info, Authentication};
pub use metrics::Metrics;
pub use models::{DiarizationResponse, ErrorResponse, HealthResponse, ServiceInfo, SpeakerTurn};
pub use pipeline::{DeviceInfo, DiarizationPipeline};
