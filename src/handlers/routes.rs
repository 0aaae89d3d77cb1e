// API route handlers for the diarization API
//
// This module contains the route handlers implementing the HTTP endpoints:
// the diarization request itself plus the health and metadata reads.

use crate::config::{HandlerConfig, JobPaths, PipelineConfig};
use crate::converter::{self, ConverterConfig};
use crate::error::HandlerError;
use crate::file_utils::cleanup_folder;
use crate::handlers::form::extract_upload;
use crate::metrics::Metrics;
use crate::models::{DiarizationResponse, HealthResponse, ServiceInfo, SpeakerTurn};
use crate::pipeline::{DeviceInfo, DiarizationPipeline};
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use log::{error, info};
use std::time::Instant;
use tokio::sync::Mutex;

/// Handler for diarization requests
///
/// Receives the uploaded clip, converts it to canonical PCM with ffmpeg, runs
/// the diarization pipeline over the converted file and returns the speaker
/// turns. The request's temp directory is removed on every exit path.
#[post("/diarize")]
pub async fn diarize(
    form: Multipart,
    pipeline: web::Data<Mutex<DiarizationPipeline>>,
    converter_config: web::Data<ConverterConfig>,
    config: web::Data<HandlerConfig>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, HandlerError> {
    let start_time = Instant::now();

    let paths = extract_upload(form, &config).await?;
    if let Ok(metadata) = std::fs::metadata(&paths.raw_file) {
        metrics.record_file_size(metadata.len() as f64).await;
    }

    // Convert and diarize, then clean up no matter which way it went
    let outcome = run_diarization(&paths, &pipeline, &converter_config, &metrics).await;
    cleanup_folder(&paths.folder);
    let turns = outcome?;

    let response = DiarizationResponse::from_turns(turns);
    info!(
        "Request {}: {} segments from {} speakers",
        paths.id,
        response.segments.len(),
        response.num_speakers
    );

    let duration = start_time.elapsed().as_secs_f64();
    metrics
        .record_http_request("POST", "/diarize", "200", duration)
        .await;

    Ok(HttpResponse::Ok().json(response))
}

/// Convert the raw upload and run the pipeline over the result.
///
/// Separated from the route handler so that cleanup can run unconditionally
/// around it.
async fn run_diarization(
    paths: &JobPaths,
    pipeline: &web::Data<Mutex<DiarizationPipeline>>,
    converter_config: &ConverterConfig,
    metrics: &Metrics,
) -> Result<Vec<SpeakerTurn>, HandlerError> {
    let convert_started = Instant::now();
    match converter::convert_to_pcm_wav(converter_config, &paths.raw_file, &paths.wav_file) {
        Ok(()) => {
            metrics
                .record_conversion(convert_started.elapsed().as_secs_f64(), "success")
                .await;
        }
        Err(e) => {
            error!("Request {}: conversion failed: {}", paths.id, e);
            metrics
                .record_conversion(convert_started.elapsed().as_secs_f64(), "failed")
                .await;
            return Err(e.into());
        }
    }

    let inference_started = Instant::now();
    let mut pipeline = pipeline.lock().await;
    match pipeline.diarize(&paths.wav_file) {
        Ok(turns) => {
            metrics
                .record_diarization(inference_started.elapsed().as_secs_f64(), "success")
                .await;
            Ok(turns)
        }
        Err(e) => {
            error!("Request {}: diarization failed: {}", paths.id, e);
            metrics
                .record_diarization(inference_started.elapsed().as_secs_f64(), "failed")
                .await;
            Err(e.into())
        }
    }
}

/// Health check endpoint
///
/// Pure read of process-wide state probed at startup.
#[get("/health")]
pub async fn health(device: web::Data<DeviceInfo>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        gpu_available: device.gpu_available,
        device: device.device.clone(),
    })
}

/// Root endpoint returning static service metadata
#[get("/")]
pub async fn service_info(pipeline_config: web::Data<PipelineConfig>) -> HttpResponse {
    HttpResponse::Ok().json(ServiceInfo {
        service: "Diarization API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: pipeline_config.model_repo.clone(),
    })
}
