// Diarization API data models
//
// This module contains the data models used for the diarization API.
// It includes the response types serialized onto the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single speaker turn attributed by the diarization pipeline.
///
/// `speaker` is an opaque per-request label; it is not a stable identity
/// across requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakerTurn {
    /// Turn start in seconds
    pub start: f64,
    /// Turn end in seconds, always >= start
    pub end: f64,
    /// Speaker label assigned by the pipeline (e.g. "SPEAKER_00")
    pub speaker: String,
}

/// Response for a diarization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationResponse {
    /// Speaker turns ordered by start time
    pub segments: Vec<SpeakerTurn>,
    /// Number of distinct speaker labels across `segments`
    pub num_speakers: usize,
}

impl DiarizationResponse {
    /// Build a response from raw pipeline turns: orders them by start time
    /// and counts the distinct speaker labels.
    pub fn from_turns(mut turns: Vec<SpeakerTurn>) -> Self {
        turns.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let num_speakers = turns
            .iter()
            .map(|turn| turn.speaker.as_str())
            .collect::<HashSet<_>>()
            .len();
        Self {
            segments: turns,
            num_speakers,
        }
    }
}

/// Response for the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the service is up
    pub status: String,
    /// Whether an accelerator was detected at startup
    pub gpu_available: bool,
    /// Device the pipeline runs on ("cuda" or "cpu")
    pub device: String,
}

/// Static service metadata returned from the root endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Model repository the pipeline was loaded from
    pub model: String,
}

/// Error response for API failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure description
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(start: f64, end: f64, speaker: &str) -> SpeakerTurn {
        SpeakerTurn {
            start,
            end,
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn from_turns_orders_segments_by_start() {
        let response = DiarizationResponse::from_turns(vec![
            turn(3.5, 7.8, "SPEAKER_01"),
            turn(0.5, 3.2, "SPEAKER_00"),
            turn(8.0, 9.1, "SPEAKER_00"),
        ]);

        let starts: Vec<f64> = response.segments.iter().map(|t| t.start).collect();
        assert_eq!(starts, vec![0.5, 3.5, 8.0]);
        for segment in &response.segments {
            assert!(segment.start <= segment.end);
        }
    }

    #[test]
    fn num_speakers_counts_distinct_labels() {
        let response = DiarizationResponse::from_turns(vec![
            turn(0.0, 1.0, "SPEAKER_00"),
            turn(1.0, 2.0, "SPEAKER_01"),
            turn(2.0, 3.0, "SPEAKER_00"),
        ]);
        assert_eq!(response.num_speakers, 2);

        let empty = DiarizationResponse::from_turns(Vec::new());
        assert_eq!(empty.num_speakers, 0);
        assert!(empty.segments.is_empty());
    }

    #[test]
    fn wire_format_matches_the_contract() {
        let response = DiarizationResponse::from_turns(vec![turn(0.5, 3.2, "SPEAKER_00")]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["num_speakers"], 1);
        assert_eq!(json["segments"][0]["start"], 0.5);
        assert_eq!(json["segments"][0]["end"], 3.2);
        assert_eq!(json["segments"][0]["speaker"], "SPEAKER_00");
    }

    #[test]
    fn health_and_info_serialize_expected_fields() {
        let health = HealthResponse {
            status: "ok".to_string(),
            gpu_available: false,
            device: "cpu".to_string(),
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["gpu_available"], false);
        assert_eq!(json["device"], "cpu");

        let info = ServiceInfo {
            service: "Diarization API".to_string(),
            version: "0.1.0".to_string(),
            model: "thewh1teagle/pyannote-rs".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["service"], "Diarization API");
        assert!(json["model"].as_str().unwrap().contains("pyannote"));
    }
}
