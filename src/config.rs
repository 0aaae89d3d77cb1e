// Diarization API configuration
//
// This module contains configuration structures and constants for the diarization API.
// It centralizes all configuration parameters and provides defaults from environment variables.

use std::env;
use std::path::PathBuf;

/// Default values for configuration
pub mod defaults {
    // Temporary directory for per-request audio files
    pub const TEMP_DIR: &str = "/tmp/diarize_api";

    // Maximum accepted upload size (512MB)
    pub const MAX_FILE_SIZE: usize = 536_870_912;

    // Hugging Face repository holding the ONNX diarization models
    pub const MODEL_REPO: &str = "thewh1teagle/pyannote-rs";

    // Segmentation model file within the repository
    pub const SEGMENTATION_FILE: &str = "segmentation-3.0.onnx";

    // Speaker embedding model file within the repository
    pub const EMBEDDING_FILE: &str = "wespeaker_en_voxceleb_CAM++.onnx";

    // Per-request speaker clustering capacity
    pub const MAX_SPEAKERS: usize = 16;

    // Cosine similarity threshold for assigning a segment to a known speaker
    pub const SIMILARITY_THRESHOLD: f32 = 0.5;
}

/// Configuration for the HTTP request handlers
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// Directory to store per-request temporary files
    pub temp_dir: String,
    /// Maximum accepted upload size in bytes
    pub max_file_size: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            temp_dir: env::var("DIARIZE_TMP_FILES")
                .unwrap_or_else(|_| String::from(defaults::TEMP_DIR)),
            max_file_size: env::var("DIARIZE_MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::MAX_FILE_SIZE),
        }
    }
}

impl HandlerConfig {
    /// Ensures the temporary directory exists
    pub fn ensure_temp_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.temp_dir)
    }
}

/// Configuration for the diarization pipeline and its model source
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Hugging Face repository to fetch model files from
    pub model_repo: String,
    /// Segmentation model file name within the repository
    pub segmentation_file: String,
    /// Speaker embedding model file name within the repository
    pub embedding_file: String,
    /// Maximum number of distinct speakers tracked per request
    pub max_speakers: usize,
    /// Similarity threshold for speaker clustering (0.0 to 1.0)
    pub similarity_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_repo: env::var("DIARIZE_MODEL_REPO")
                .unwrap_or_else(|_| String::from(defaults::MODEL_REPO)),
            segmentation_file: env::var("DIARIZE_SEGMENTATION_FILE")
                .unwrap_or_else(|_| String::from(defaults::SEGMENTATION_FILE)),
            embedding_file: env::var("DIARIZE_EMBEDDING_FILE")
                .unwrap_or_else(|_| String::from(defaults::EMBEDDING_FILE)),
            max_speakers: env::var("DIARIZE_MAX_SPEAKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::MAX_SPEAKERS),
            similarity_threshold: env::var("DIARIZE_SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::SIMILARITY_THRESHOLD),
        }
    }
}

/// Configuration for metrics collection and export
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Type of metrics exporter ("prometheus", "none")
    pub exporter_type: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            exporter_type: env::var("DIARIZE_METRICS_BACKEND")
                .unwrap_or_else(|_| "prometheus".to_string()),
        }
    }
}

/// Represents the paths to one request's temporary files
#[derive(Debug, Clone)]
pub struct JobPaths {
    /// Unique folder for this request
    pub folder: PathBuf,
    /// Raw upload as received from the client
    pub raw_file: PathBuf,
    /// Converted 16 kHz mono PCM file
    pub wav_file: PathBuf,
    /// Request ID (UUID)
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_config_uses_pyannote_models() {
        let config = PipelineConfig::default();
        assert!(config.segmentation_file.ends_with(".onnx"));
        assert!(config.embedding_file.ends_with(".onnx"));
        assert!(config.max_speakers > 0);
        assert!(config.similarity_threshold > 0.0 && config.similarity_threshold <= 1.0);
    }

    #[test]
    fn default_handler_config_has_a_size_cap() {
        let config = HandlerConfig::default();
        assert!(config.max_file_size > 0);
        assert!(!config.temp_dir.is_empty());
    }
}
