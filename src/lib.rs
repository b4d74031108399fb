//! Minimal users API: read, create and upsert users over an injected
//! repository, answering in JSON or XML.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
mod database;
pub mod error;
pub mod model;
mod router;
pub mod telemetry;
pub mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use user::{EntityMapper, InMemoryUserRepository, PgUserRepository, UserMapper, UserRepository};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State backed by an empty in-memory repository.
#[cfg(test)]
pub fn test_state() -> AppState {
    AppState {
        config: Arc::new(config::Configuration::default()),
        users: Arc::new(InMemoryUserRepository::new()),
        mapper: Arc::new(UserMapper),
        metrics: None,
    }
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub users: Arc<dyn UserRepository>,
    pub mapper: Arc<dyn EntityMapper>,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Tag every request with an `x-request-id`.
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.timeout),
        ))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers(Any)
                .expose_headers([header::LOCATION, REQUEST_ID]),
        );

    let mut router = Router::new().nest(router::users::USERS_PATH, router::users::router());

    if let Some(handle) = state.metrics.clone() {
        // `GET /metrics` renders Prometheus exposition format.
        router = router.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    router
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let users: Arc<dyn UserRepository> = match config.postgres {
        Some(ref pg) => {
            let db = database::Database::new(
                &pg.address,
                pg.username.as_deref().unwrap_or(database::DEFAULT_CREDENTIALS),
                pg.password.as_deref().unwrap_or(database::DEFAULT_CREDENTIALS),
                pg.database.as_deref().unwrap_or(database::DEFAULT_DATABASE_NAME),
                pg.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?;

            // execute migrations scripts on start.
            sqlx::migrate!().run(&db.postgres).await?;

            Arc::new(PgUserRepository::new(db.postgres))
        },
        None => {
            tracing::warn!("no `postgres` entry on `config.yaml` file, users are kept in memory");
            Arc::new(InMemoryUserRepository::new())
        },
    };

    let metrics = if config.metrics {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };

    Ok(AppState {
        config,
        users,
        mapper: Arc::new(UserMapper),
        metrics,
    })
}
