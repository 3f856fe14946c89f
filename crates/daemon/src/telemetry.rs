//! OpenTelemetry trace export
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: Service name (default: pushbridge)
//!
//! ```text
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//! OTEL_SERVICE_NAME=pushbridge-dev \
//!     cargo run -p pushbridge-daemon --features telemetry
//! ```

use anyhow::Result;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::Layer;

#[cfg(feature = "telemetry")]
const DEFAULT_SERVICE_NAME: &str = "pushbridge";

pub type TelemetryLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the OTLP layer, or `None` when no endpoint is configured.
///
/// Runs before the subscriber is installed, so it reports through the
/// returned notices instead of `tracing`.
pub fn telemetry_layer() -> Result<(Option<TelemetryLayer>, Option<String>)> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok((None, None));
    };

    #[cfg(feature = "telemetry")]
    {
        let service_name = std::env::var("OTEL_SERVICE_NAME")
            .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());
        let layer = build_layer(&endpoint, &service_name)?;
        Ok((
            Some(layer),
            Some(format!(
                "OpenTelemetry export to {} as {}",
                endpoint, service_name
            )),
        ))
    }

    #[cfg(not(feature = "telemetry"))]
    {
        Ok((
            None,
            Some(format!(
                "OTEL_EXPORTER_OTLP_ENDPOINT={} ignored: rebuild with --features telemetry",
                endpoint
            )),
        ))
    }
}

#[cfg(feature = "telemetry")]
fn build_layer(endpoint: &str, service_name: &str) -> Result<TelemetryLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::Resource;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build();

    let tracer = provider.tracer(DEFAULT_SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Box::new(tracing_opentelemetry::layer().with_tracer(tracer)))
}

/// Flush pending spans
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
