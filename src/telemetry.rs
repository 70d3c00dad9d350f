use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use url::Url;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter")]
    OtlpExporter(#[from] ExporterBuildError),

    #[error("Failed to build HTTP client")]
    HttpClient(String),

    #[error("Failed to spawn HTTP client thread")]
    ThreadSpawn,

    #[error("Failed to set global subscriber")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Flushes buffered spans when dropped at the end of `main`.
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        let _ = self.tracer_provider.force_flush();
    }
}

/// Instrumentation library name reported on every span.
const TRACER_NAME: &str = "iso-submit-tracer";

pub fn default_filter(log_level: tracing::Level) -> String {
    format!("iso_submit={log_level},iso_gateway={log_level}")
}

fn resource(service_name: String, environment: String) -> Resource {
    Resource::builder()
        .with_service_name(service_name)
        .with_attributes(vec![KeyValue::new("deployment.environment", environment)])
        .build()
}

pub fn setup_telemetry(
    endpoint: &Url,
    service_name: String,
    environment: String,
    log_level: tracing::Level,
) -> Result<TelemetryGuard, TelemetryError> {
    // The batch processor drives its own runtime, so the blocking client must
    // be built off the tokio worker.
    let http_client = std::thread::spawn(|| {
        reqwest::blocking::Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))
    })
    .join()
    .map_err(|_| TelemetryError::ThreadSpawn)?
    .map_err(TelemetryError::HttpClient)?;

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_http_client(http_client)
        .with_endpoint(endpoint.as_str())
        .build()?;

    let batch_exporter = BatchSpanProcessor::builder(otlp_exporter)
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_max_export_batch_size(512)
                .with_max_queue_size(2048)
                .with_scheduled_delay(Duration::from_secs(3))
                .build(),
        )
        .build();

    let tracer_provider = SdkTracerProvider::builder()
        .with_span_processor(batch_exporter)
        .with_resource(resource(service_name, environment))
        .build();

    let tracer = tracer_provider.tracer(TRACER_NAME);

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let default_filter = default_filter(log_level);

    let fmt_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.clone().into());

    let telemetry_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_filter(fmt_filter);
    let telemetry_layer = telemetry_layer.with_filter(telemetry_filter);

    let subscriber = Registry::default().with(fmt_layer).with(telemetry_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(TelemetryGuard { tracer_provider })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_both_crates() {
        assert_eq!(
            default_filter(tracing::Level::WARN),
            "iso_submit=WARN,iso_gateway=WARN"
        );
    }

    #[test]
    fn test_resource_reports_environment() {
        let resource = resource("iso-submit".to_string(), "staging".to_string());

        assert_eq!(
            resource.get(&opentelemetry::Key::new("deployment.environment")),
            Some(opentelemetry::Value::from("staging"))
        );
        assert_eq!(
            resource.get(&opentelemetry::Key::new("service.name")),
            Some(opentelemetry::Value::from("iso-submit"))
        );
    }
}
