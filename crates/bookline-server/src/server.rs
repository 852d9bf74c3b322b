//! Router assembly and the server run loop.

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Request};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use bookline_config::AppConfig;

use crate::handlers;
use crate::middleware::request_id;
use crate::state::AppState;

/// Build the full application router over the given state.
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/healthz", get(handlers::health::healthz))
        .route(
            "/identities",
            get(handlers::identities::list).post(handlers::identities::create),
        )
        .route("/identities/switch", post(handlers::identities::switch))
        .route("/identities/history", get(handlers::identities::history))
        .route("/identities/{id}", delete(handlers::identities::delete))
        .route(
            "/availability",
            get(handlers::availability::list).post(handlers::availability::create),
        )
        .route(
            "/availability/bulk",
            post(handlers::availability::bulk),
        )
        .route(
            "/availability/status",
            post(handlers::availability::presence),
        )
        .route(
            "/availability/{rule}",
            put(handlers::availability::update).delete(handlers::availability::delete),
        )
        .route(
            "/bookings",
            get(handlers::bookings::index).post(handlers::bookings::create),
        )
        .route("/bookings/{id}", get(handlers::bookings::show))
        .route(
            "/bookings/{id}/status",
            post(handlers::bookings::update_status),
        )
        .route("/messages/send", post(handlers::messages::send))
        .route("/messages/threads", get(handlers::messages::threads))
        .route(
            "/messages/thread/{id}",
            get(handlers::messages::thread_messages),
        )
        .route(
            "/messages/thread/{id}/read",
            post(handlers::messages::mark_read),
        )
        .route("/messages/{id}", delete(handlers::messages::delete))
        .route("/channels/{name}", get(handlers::channels::subscribe))
        .layer(
            // Outer-to-inner: the request id must exist before the
            // trace span is created.
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http().make_span_with(
                    |request: &Request<Body>| {
                        let request_id = request
                            .extensions()
                            .get::<HeaderValue>()
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id,
                        )
                    },
                ))
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(config.request_timeout()))
                .layer(DefaultBodyLimit::max(config.server.body_limit_bytes)),
        )
        .with_state(state)
}

pub struct BooklineServer {
    config: AppConfig,
}

impl BooklineServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Bind, spawn the fan-out worker, and serve until a shutdown
    /// signal arrives. In-flight requests drain before exit.
    pub async fn run(self) -> anyhow::Result<()> {
        let (state, dispatcher) = AppState::new(&self.config);
        tokio::spawn(dispatcher.run());

        let app = build_app(state, &self.config);
        let listener = tokio::net::TcpListener::bind(self.config.addr()).await?;
        info!(addr = %listener.local_addr()?, "bookline server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(error) => tracing::error!(%error, "failed to listen for shutdown signal"),
    }
}
