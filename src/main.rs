use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use tokio::sync::Mutex;

use diarize_api::config::{HandlerConfig, MetricsConfig, PipelineConfig};
use diarize_api::converter::ConverterConfig;
use diarize_api::handlers::{diarize, health, service_info, Authentication};
use diarize_api::metrics::{create_metrics_exporter, Metrics};
use diarize_api::pipeline::{self, DiarizationPipeline};
use diarize_api::{config_loader, model_fetch};

const DEFAULT_DIARIZE_API_HOST: &str = "0.0.0.0";
const DEFAULT_DIARIZE_API_PORT: &str = "8000";
const DEFAULT_DIARIZE_API_TIMEOUT: u64 = 120;
const DEFAULT_DIARIZE_API_KEEPALIVE: u64 = 120;

/// Metrics endpoint handler
async fn metrics_handler(metrics: web::Data<Metrics>) -> Result<HttpResponse, actix_web::Error> {
    match metrics.export().await {
        Ok(data) => Ok(HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4; charset=utf-8")
            .body(data)),
        Err(e) => Ok(HttpResponse::InternalServerError()
            .json(format!("Failed to export metrics: {}", e))),
    }
}

/// Map a startup failure into the io::Error main reports, after logging it.
fn startup_error<E: std::fmt::Display>(e: E) -> std::io::Error {
    error!("Startup failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load configurations (optional config file, then env-driven defaults)
    config_loader::load_config();
    let handler_config = HandlerConfig::default();
    let pipeline_config = PipelineConfig::default();
    let converter_config = ConverterConfig::default();
    let metrics_config = MetricsConfig::default();

    // Initialize metrics
    let metrics = Metrics::new(create_metrics_exporter(&metrics_config.exporter_type));

    // Create tmp directory if it doesn't exist
    if let Err(e) = handler_config.ensure_temp_dir() {
        warn!(
            "Failed to create temp directory {}: {}",
            handler_config.temp_dir, e
        );
    }

    // Probe for an accelerator before any session is created
    let device = pipeline::probe_device();

    // Fetch models and build the pipeline before accepting traffic.
    // A missing HF_TOKEN or failed model load prevents startup entirely.
    let models = model_fetch::fetch_models(&pipeline_config).map_err(startup_error)?;
    let diarization_pipeline =
        DiarizationPipeline::new(pipeline_config.clone(), models).map_err(startup_error)?;
    let diarization_pipeline = web::Data::new(Mutex::new(diarization_pipeline));

    // Server settings
    let host = std::env::var("DIARIZE_API_HOST")
        .unwrap_or_else(|_| DEFAULT_DIARIZE_API_HOST.to_string());
    let port = std::env::var("DIARIZE_API_PORT")
        .unwrap_or_else(|_| DEFAULT_DIARIZE_API_PORT.to_string());
    let timeout = std::time::Duration::from_secs(
        std::env::var("DIARIZE_API_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DIARIZE_API_TIMEOUT),
    );
    let keep_alive = std::time::Duration::from_secs(
        std::env::var("DIARIZE_API_KEEPALIVE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DIARIZE_API_KEEPALIVE),
    );

    info!("Starting diarization API server on http://{}:{}", host, port);
    info!("Using temp directory: {}", handler_config.temp_dir);
    info!("Conversion command: {}", converter_config.command_path);
    info!("Model repository: {}", pipeline_config.model_repo);
    info!("Inference device: {}", device.device);
    info!("Metrics exporter: {}", metrics_config.exporter_type);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Authentication)
            .app_data(diarization_pipeline.clone())
            .app_data(web::Data::new(handler_config.clone()))
            .app_data(web::Data::new(pipeline_config.clone()))
            .app_data(web::Data::new(converter_config.clone()))
            .app_data(web::Data::new(device.clone()))
            .app_data(web::Data::new(metrics.clone()))
            .service(web::resource("/metrics").route(web::get().to(metrics_handler)))
            .service(diarize)
            .service(health)
            .service(service_info)
    })
    .bind(format!("{}:{}", host, port))?
    .client_disconnect_timeout(timeout)
    .keep_alive(keep_alive)
    .run()
    .await
}
