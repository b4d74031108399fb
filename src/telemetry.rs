//! Telemetry logic.
//! Support tracing, metrics and logging.
//!
//! Every routed request records `http_requests_total` and
//! `http_requests_duration_seconds`, labelled by method, matched path and
//! status.
use axum::extract::{MatchedPath, Request};
use axum::http::Version;
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics::{Unit, gauge};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use opentelemetry::trace::{Span, TraceError, Tracer};
use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{LogError, SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tokio::time::sleep;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use std::time::{Duration, Instant};

const DEFAULT_FILTER: &str = "info,sqlx=warn,tower_http=info";
const PROCESS_REFRESH: Duration = Duration::from_secs(10);

fn resource() -> Resource {
    Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .build()
}

/// Install the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG`, `info` otherwise. With an OTLP endpoint,
/// events are also exported as OpenTelemetry logs and a batch tracer is
/// registered for [`track`] spans.
pub fn init(otlp_endpoint: Option<&str>) -> Result<Option<SdkTracerProvider>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    let Some(endpoint) = otlp_endpoint else {
        registry.try_init()?;
        return Ok(None);
    };

    registry.with(setup_logging(endpoint)?).try_init()?;

    let provider = setup_tracer(endpoint)?;
    global::set_tracer_provider(provider.clone());
    tracing::info!(%endpoint, "exporting telemetry over OTLP");

    Ok(Some(provider))
}

/// Create tracer for OTLP.
pub fn setup_tracer(endpoint: &str) -> Result<SdkTracerProvider, TraceError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource())
        .build())
}

/// Create OTLP exporter for logs.
pub fn setup_logging(
    endpoint: &str,
) -> Result<OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>, LogError> {
    let exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    let provider = SdkLoggerProvider::builder()
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build();

    Ok(OpenTelemetryTracingBridge::new(&provider))
}

/// Create recorder for Prometheus metrics.
///
/// Also spawns the task refreshing process CPU and memory gauges, so it
/// must run inside a Tokio runtime.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    metrics::describe_counter!("http_requests_total", "Requests answered by a route.");
    metrics::describe_histogram!(
        "http_requests_duration_seconds",
        Unit::Seconds,
        "Time spent answering a request."
    );
    metrics::describe_gauge!(
        "process_cpu_usage",
        Unit::Percent,
        "CPU usage of the process in percentage."
    );
    metrics::describe_gauge!(
        "process_memory_used_bytes",
        Unit::Bytes,
        "Total process memory in bytes."
    );

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_requests_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .install_recorder()?;

    tokio::spawn(watch_process());

    Ok(handle)
}

async fn watch_process() {
    let mut system = System::new_with_specifics(RefreshKind::nothing());
    let pid = Pid::from_u32(std::process::id());

    loop {
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );

        if let Some(process) = system.process(pid) {
            gauge!("process_memory_used_bytes").set(process.memory() as f64);
            gauge!("process_cpu_usage").set(process.cpu_usage() as f64);
        }

        sleep(PROCESS_REFRESH).await;
    }
}

fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "UNKNOWN",
    }
}

/// Record request metrics and an OpenTelemetry span around each route.
pub async fn track(req: Request, next: Next) -> impl IntoResponse {
    let tracer = global::tracer("users-http");
    let mut otel_span = tracer.start("http-request");

    let start = Instant::now();
    // Matched path keeps identifiers out of label values.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().to_string();
    let version = http_version(req.version());

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    otel_span.set_attributes([
        KeyValue::new("version", version),
        KeyValue::new("path", path.clone()),
        KeyValue::new("method", method.clone()),
        KeyValue::new("status", status.clone()),
    ]);

    let labels = [("method", method), ("path", path), ("status", status)];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    otel_span.end();

    response
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::util::ServiceExt;

    use super::*;

    #[test]
    fn test_http_version() {
        assert_eq!(http_version(Version::HTTP_11), "HTTP/1.1");
        assert_eq!(http_version(Version::HTTP_2), "HTTP/2");
    }

    #[tokio::test]
    async fn test_track_passes_response_through() {
        let app = Router::new()
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .route_layer(axum::middleware::from_fn(track));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/teapot")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
