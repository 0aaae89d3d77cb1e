//! Metrics module for the diarization API
//!
//! This module provides a pluggable metrics system with a Prometheus backend
//! for scraping via /metrics and a null backend for disabled setups.

use async_trait::async_trait;
use log::{debug, warn};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Metrics exporter trait for pluggable monitoring systems
#[async_trait]
pub trait MetricsExporter: Send + Sync {
    /// Increment a counter metric
    async fn increment(&self, name: &str, labels: &[(&str, &str)]);

    /// Observe a value in a histogram metric
    async fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]);

    /// Export metrics in the format expected by the monitoring system
    async fn export(&self) -> Result<Vec<u8>, String>;
}

/// Prometheus implementation of MetricsExporter
pub struct PrometheusExporter {
    registry: Registry,
    counters: Mutex<HashMap<String, CounterVec>>,
    histograms: Mutex<HashMap<String, HistogramVec>>,
}

impl PrometheusExporter {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            counters: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
        }
    }

    async fn get_or_create_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> CounterVec {
        let mut counters = self.counters.lock().await;
        if let Some(counter) = counters.get(name) {
            return counter.clone();
        }

        let opts = Opts::new(name, help);
        let counter = CounterVec::new(opts, label_names).unwrap();

        if let Err(e) = self.registry.register(Box::new(counter.clone())) {
            warn!("Failed to register counter metric {}: {}", name, e);
        }

        counters.insert(name.to_string(), counter.clone());
        counter
    }

    async fn get_or_create_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> HistogramVec {
        let mut histograms = self.histograms.lock().await;
        if let Some(histogram) = histograms.get(name) {
            return histogram.clone();
        }

        let opts = HistogramOpts::new(name, help);
        let histogram = HistogramVec::new(opts, label_names).unwrap();

        if let Err(e) = self.registry.register(Box::new(histogram.clone())) {
            warn!("Failed to register histogram metric {}: {}", name, e);
        }

        histograms.insert(name.to_string(), histogram.clone());
        histogram
    }

    fn extract_label_names_and_values<'a>(
        labels: &'a [(&'a str, &'a str)],
    ) -> (Vec<&'a str>, Vec<&'a str>) {
        let label_names: Vec<&str> = labels.iter().map(|(k, _)| *k).collect();
        let label_values: Vec<&str> = labels.iter().map(|(_, v)| *v).collect();
        (label_names, label_values)
    }
}

impl Default for PrometheusExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsExporter for PrometheusExporter {
    async fn increment(&self, name: &str, labels: &[(&str, &str)]) {
        let (label_names, label_values) = Self::extract_label_names_and_values(labels);
        let counter = self
            .get_or_create_counter(name, "Counter metric", &label_names)
            .await;

        counter.with_label_values(&label_values).inc();
        debug!("Incremented counter {} with labels {:?}", name, labels);
    }

    async fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let (label_names, label_values) = Self::extract_label_names_and_values(labels);
        let histogram = self
            .get_or_create_histogram(name, "Histogram metric", &label_names)
            .await;

        histogram.with_label_values(&label_values).observe(value);
        debug!(
            "Observed histogram {} with value {} and labels {:?}",
            name, value, labels
        );
    }

    async fn export(&self) -> Result<Vec<u8>, String> {
        let mut buffer = vec![];
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("Failed to encode metrics: {}", e))?;
        Ok(buffer)
    }
}

/// Null exporter for testing or when metrics are disabled
pub struct NullExporter;

#[async_trait]
impl MetricsExporter for NullExporter {
    async fn increment(&self, _name: &str, _labels: &[(&str, &str)]) {}

    async fn observe_histogram(&self, _name: &str, _value: f64, _labels: &[(&str, &str)]) {}

    async fn export(&self) -> Result<Vec<u8>, String> {
        Ok(vec![])
    }
}

/// Metrics facade for the application
#[derive(Clone)]
pub struct Metrics {
    exporter: Arc<dyn MetricsExporter>,
}

impl Metrics {
    pub fn new(exporter: Arc<dyn MetricsExporter>) -> Self {
        Self { exporter }
    }

    /// Increment a counter metric
    pub async fn increment(&self, name: &str, labels: &[(&str, &str)]) {
        self.exporter.increment(name, labels).await
    }

    /// Observe a value in a histogram metric
    pub async fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.exporter.observe_histogram(name, value, labels).await
    }

    /// Export metrics in the format expected by the monitoring system
    pub async fn export(&self) -> Result<Vec<u8>, String> {
        self.exporter.export().await
    }

    // Convenience methods for common metrics

    /// Record HTTP request count and duration
    pub async fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status: &str,
        duration: f64,
    ) {
        self.observe_histogram(
            "http_request_duration_seconds",
            duration,
            &[
                ("endpoint", endpoint),
                ("method", method),
                ("status", status),
            ],
        )
        .await;

        self.increment(
            "http_requests_total",
            &[
                ("endpoint", endpoint),
                ("method", method),
                ("status", status),
            ],
        )
        .await;
    }

    /// Record one audio conversion run
    pub async fn record_conversion(&self, duration: f64, status: &str) {
        self.observe_histogram(
            "audio_conversion_duration_seconds",
            duration,
            &[("status", status)],
        )
        .await;
        self.increment("audio_conversions_total", &[("status", status)])
            .await;
    }

    /// Record one diarization run
    pub async fn record_diarization(&self, duration: f64, status: &str) {
        self.observe_histogram(
            "diarization_duration_seconds",
            duration,
            &[("status", status)],
        )
        .await;
        self.increment("diarizations_total", &[("status", status)])
            .await;
    }

    /// Record uploaded file size
    pub async fn record_file_size(&self, size_bytes: f64) {
        self.observe_histogram("upload_size_bytes", size_bytes, &[])
            .await;
    }
}

/// Factory function to create a metrics exporter based on configuration
pub fn create_metrics_exporter(exporter_type: &str) -> Arc<dyn MetricsExporter> {
    match exporter_type.to_lowercase().as_str() {
        "prometheus" => {
            debug!("Initializing Prometheus metrics exporter");
            Arc::new(PrometheusExporter::new())
        }
        "none" | "disabled" => {
            debug!("Metrics disabled, using null exporter");
            Arc::new(NullExporter)
        }
        _ => {
            warn!(
                "Unknown metrics exporter type '{}', using null exporter",
                exporter_type
            );
            Arc::new(NullExporter)
        }
    }
}
