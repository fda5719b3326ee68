//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use orders_types::{Authenticator, InventoryClient, OrderStore};

use super::auth::auth_middleware;
use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::OrderService;

/// HTTP Server for the Orders API.
pub struct HttpServer<R: OrderStore, I: InventoryClient> {
    state: Arc<AppState<R, I>>,
    rate_limiter: Arc<RateLimiterState>,
    cors_origin: Option<HeaderValue>,
}

impl<R: OrderStore, I: InventoryClient> HttpServer<R, I> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: OrderService<R, I>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                authenticator,
            }),
            rate_limiter: Arc::new(RateLimiterState::default()), // 100 req/min default
            cors_origin: None,
        }
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(
        service: OrderService<R, I>,
        authenticator: Arc<dyn Authenticator>,
        requests_per_minute: u32,
    ) -> Self {
        Self {
            rate_limiter: Arc::new(RateLimiterState::per_minute(requests_per_minute)),
            ..Self::new(service, authenticator)
        }
    }

    /// Allows browser requests from `origin`.
    pub fn with_cors_origin(mut self, origin: &str) -> anyhow::Result<Self> {
        self.cors_origin = Some(HeaderValue::from_str(origin)?);
        Ok(self)
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let router = Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .route(
                "/payment-methods",
                post(handlers::create_payment_method::<R, I>)
                    .get(handlers::list_payment_methods::<R, I>),
            )
            .route(
                "/payment-methods/{id}",
                delete(handlers::delete_payment_method::<R, I>),
            )
            .route(
                "/orders",
                post(handlers::create_order::<R, I>).get(handlers::list_orders::<R, I>),
            )
            .route("/orders/{id}", get(handlers::get_order::<R, I>))
            .route(
                "/orders/{id}/status",
                patch(handlers::update_order_status::<R, I>),
            )
            .route(
                "/orders/{id}/process-payment",
                post(handlers::process_payment::<R, I>),
            )
            .route("/orders/{id}/refund", post(handlers::refund_order::<R, I>))
            .layer(metrics)
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth_middleware::<R, I>,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        // Outermost so preflight requests are answered before authentication
        match &self.cors_origin {
            Some(origin) => router.layer(
                CorsLayer::new()
                    .allow_origin(origin.clone())
                    .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
            ),
            None => router,
        }
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
