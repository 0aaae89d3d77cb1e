// Diarization pipeline wrapper
//
// Wraps the pyannote-rs segmentation and speaker-embedding models behind a
// single call that maps a converted PCM file to time-stamped speaker turns.
// The embedding model is loaded once at startup; speaker clustering state is
// per request, so labels are only stable within one response.

use log::{info, warn};
use pyannote_rs::{get_segments, EmbeddingExtractor, EmbeddingManager};
use std::path::{Path, PathBuf};
use thiserror::Error;

use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};

use crate::config::PipelineConfig;
use crate::model_fetch::ModelFiles;
use crate::models::SpeakerTurn;

/// Label used when the per-request speaker capacity is exhausted or an
/// embedding cannot be computed for a segment.
const UNKNOWN_SPEAKER: &str = "unknown";

/// Device the pipeline runs inference on, probed once at startup and shared
/// read-only with the health endpoint.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Whether an accelerator was detected
    pub gpu_available: bool,
    /// Device string ("cuda" or "cpu")
    pub device: String,
}

/// Probe for an accelerator and register it with the ONNX runtime when
/// available, falling back to general-purpose compute otherwise.
pub fn probe_device() -> DeviceInfo {
    let cuda = CUDAExecutionProvider::default();
    let gpu_available = cuda.is_available().unwrap_or(false);

    if gpu_available {
        match ort::init()
            .with_execution_providers([cuda.build()])
            .commit()
        {
            Ok(_) => {
                info!("Using CUDA for diarization inference");
                return DeviceInfo {
                    gpu_available: true,
                    device: "cuda".to_string(),
                };
            }
            Err(e) => {
                warn!("CUDA detected but registration failed, using CPU: {}", e);
            }
        }
    } else {
        info!("Using CPU for diarization inference");
    }

    DeviceInfo {
        gpu_available: false,
        device: "cpu".to_string(),
    }
}

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A model file is missing or could not be loaded
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// The converted audio file could not be read
    #[error("Failed to read audio: {0}")]
    Audio(#[from] hound::Error),
    /// The segmentation model failed on this input
    #[error("Segmentation error: {0}")]
    Segmentation(String),
}

/// Speaker diarization pipeline backed by pyannote ONNX models
pub struct DiarizationPipeline {
    config: PipelineConfig,
    segmentation_model: PathBuf,
    extractor: EmbeddingExtractor,
}

impl DiarizationPipeline {
    /// Construct the pipeline from fetched model files.
    ///
    /// Loads the embedding model eagerly; a missing or unreadable model is a
    /// startup error, surfaced before the service accepts traffic.
    pub fn new(config: PipelineConfig, models: ModelFiles) -> Result<Self, PipelineError> {
        if !models.segmentation.is_file() {
            return Err(PipelineError::ModelLoad(format!(
                "segmentation model not found: {}",
                models.segmentation.display()
            )));
        }

        let extractor = EmbeddingExtractor::new(&models.embedding)
            .map_err(|e| PipelineError::ModelLoad(e.to_string()))?;

        info!(
            "Diarization pipeline initialized (max {} speakers, threshold {:.2})",
            config.max_speakers, config.similarity_threshold
        );

        Ok(Self {
            config,
            segmentation_model: models.segmentation,
            extractor,
        })
    }

    /// Run diarization over a 16 kHz mono PCM WAV file.
    ///
    /// Returns speaker turns ordered by start time. Labels are assigned per
    /// request by clustering segment embeddings; segments whose embedding
    /// cannot be computed keep their time span under the fallback label
    /// rather than being dropped.
    pub fn diarize(&mut self, wav: &Path) -> Result<Vec<SpeakerTurn>, PipelineError> {
        let (samples, sample_rate) = read_wav_samples(wav)?;
        info!(
            "Diarizing {} samples at {} Hz",
            samples.len(),
            sample_rate
        );

        // Pass an owned path: the returned iterator must not borrow self,
        // since labeling below needs the extractor mutably.
        let segmentation_model = self.segmentation_model.clone();
        let segments = get_segments(&samples, sample_rate, segmentation_model)
            .map_err(|e| PipelineError::Segmentation(e.to_string()))?;

        let mut manager = EmbeddingManager::new(self.config.max_speakers);
        let mut turns = Vec::new();

        for segment in segments {
            let segment = match segment {
                Ok(segment) => segment,
                Err(e) => {
                    warn!("Skipping unreadable segment: {}", e);
                    continue;
                }
            };

            let speaker = self.label_segment(&mut manager, &segment.samples);
            turns.push(SpeakerTurn {
                start: round_ms(segment.start),
                end: round_ms(segment.end),
                speaker,
            });
        }

        turns.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(turns)
    }

    /// Cluster one segment's embedding into a per-request speaker label.
    fn label_segment(&mut self, manager: &mut EmbeddingManager, samples: &[i16]) -> String {
        let embedding: Vec<f32> = match self.extractor.compute(samples) {
            Ok(values) => values.collect(),
            Err(e) => {
                warn!("Failed to compute speaker embedding: {}", e);
                return UNKNOWN_SPEAKER.to_string();
            }
        };

        match manager.search_speaker(embedding, self.config.similarity_threshold) {
            Some(index) => speaker_label(index),
            None => {
                warn!(
                    "Speaker capacity ({}) reached, segment labeled '{}'",
                    self.config.max_speakers, UNKNOWN_SPEAKER
                );
                UNKNOWN_SPEAKER.to_string()
            }
        }
    }
}

/// Format a clustered speaker index the way pyannote labels speakers.
fn speaker_label(index: usize) -> String {
    format!("SPEAKER_{:02}", index)
}

/// Round a timestamp to millisecond precision.
fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Read a WAV file into i16 samples, converting float samples when needed.
fn read_wav_samples(path: &Path) -> Result<(Vec<i16>, u32), PipelineError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(|v| (v * 32767.0).clamp(-32768.0, 32767.0) as i16))
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok((samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn speaker_labels_follow_the_pyannote_convention() {
        assert_eq!(speaker_label(0), "SPEAKER_00");
        assert_eq!(speaker_label(7), "SPEAKER_07");
        assert_eq!(speaker_label(12), "SPEAKER_12");
    }

    #[test]
    fn timestamps_round_to_milliseconds() {
        assert_eq!(round_ms(1.23456), 1.235);
        assert_eq!(round_ms(0.0004), 0.0);
        assert_eq!(round_ms(3.2), 3.2);
    }

    #[test]
    fn wav_reading_preserves_int_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let written: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN];
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for sample in &written {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = read_wav_samples(&path).unwrap();
        assert_eq!(sample_rate, 16_000);
        assert_eq!(samples, written);
    }

    #[test]
    fn unreadable_wav_is_an_audio_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"definitely not a wav file").unwrap();

        let err = read_wav_samples(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Audio(_)));
    }
}
