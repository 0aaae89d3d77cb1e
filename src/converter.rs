// Audio conversion for the diarization API
//
// This module wraps the external ffmpeg process that normalizes arbitrary
// uploaded audio (WebM/Opus and anything else ffmpeg accepts) into the
// 16 kHz mono 16-bit PCM WAV the diarization pipeline expects.

use log::{debug, info};
use std::env;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

const DEFAULT_FFMPEG_CMD: &str = "ffmpeg";

/// Target sample rate for the converted PCM file
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Configuration for the conversion command
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    /// Path to the ffmpeg binary (resolved from PATH by default)
    pub command_path: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command_path: env::var("DIARIZE_FFMPEG_CMD")
                .unwrap_or_else(|_| String::from(DEFAULT_FFMPEG_CMD)),
        }
    }
}

/// Conversion error types
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The conversion tool could not be executed at all
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The conversion tool ran and reported failure
    #[error("Audio conversion failed ({status}): {stderr}")]
    Tool { status: String, stderr: String },
}

/// Convert the source file into 16 kHz mono s16le PCM WAV at `dest`,
/// overwriting any existing destination.
///
/// No retry: a single failed conversion fails the whole request. On failure
/// the tool's stderr is captured for the error response.
pub fn convert_to_pcm_wav(
    config: &ConverterConfig,
    src: &Path,
    dest: &Path,
) -> Result<(), ConvertError> {
    debug!(
        "Converting {} -> {} with {}",
        src.display(),
        dest.display(),
        config.command_path
    );

    let output = Command::new(&config.command_path)
        .arg("-i")
        .arg(src)
        .arg("-ar")
        .arg(TARGET_SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg("1")
        .arg("-c:a")
        .arg("pcm_s16le")
        .arg("-y")
        .arg(dest)
        .output()
        .map_err(|e| ConvertError::Spawn {
            command: config.command_path.clone(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ConvertError::Tool {
            status: output.status.to_string(),
            stderr,
        });
    }

    info!("Conversion completed: {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn paths() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let src = dir.path().join("in.audio");
        let dest = dir.path().join("out.wav");
        std::fs::write(&src, b"bogus").unwrap();
        (dir, src, dest)
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let (_dir, src, dest) = paths();
        let config = ConverterConfig {
            command_path: "/nonexistent/bin/ffmpeg".to_string(),
        };

        let err = convert_to_pcm_wav(&config, &src, &dest).unwrap_err();
        assert!(matches!(err, ConvertError::Spawn { .. }));
    }

    #[test]
    fn failing_tool_reports_a_non_empty_diagnostic() {
        let (_dir, src, dest) = paths();
        // `false` accepts any arguments and exits non-zero without output
        let config = ConverterConfig {
            command_path: "false".to_string(),
        };

        let err = convert_to_pcm_wav(&config, &src, &dest).unwrap_err();
        assert!(matches!(err, ConvertError::Tool { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    #[ignore] // Requires ffmpeg on PATH
    fn converts_generated_audio_to_16khz_mono() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("tone.wav");
        let dest = dir.path().join("out.wav");

        // Write a 44.1 kHz stereo tone for ffmpeg to downmix and resample
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&src, spec).unwrap();
        for n in 0..44_100u32 {
            let sample = ((n as f32 * 0.05).sin() * 10_000.0) as i16;
            writer.write_sample(sample).unwrap();
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        convert_to_pcm_wav(&ConverterConfig::default(), &src, &dest).unwrap();

        let reader = hound::WavReader::open(&dest).unwrap();
        let out_spec = reader.spec();
        assert_eq!(out_spec.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(out_spec.channels, 1);
        assert_eq!(out_spec.bits_per_sample, 16);
    }
}
