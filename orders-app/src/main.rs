//! # Orders Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Create the inventory and user-service clients
//! - Create the order service
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orders_hex::{
    OrderService,
    inbound::HttpServer,
    outbound::{HttpAuthenticator, HttpInventoryClient},
};
use orders_repo::build_repo;

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("orders-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;

    // OpenTelemetry export is opt-in
    let (telemetry, otel_provider) = match &config.otlp_endpoint {
        Some(endpoint) => {
            let (tracer, provider) = init_tracer(endpoint)?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(provider),
            )
        }
        None => (None, None),
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orders_app=debug,orders_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    tracing::info!("Starting orders server on port {}", config.port);
    tracing::info!(
        inventory = %config.inventory_service_url,
        users = %config.user_service_url,
        fee_bps = config.fee_rate.bps(),
        "Collaborator configuration"
    );

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    tracing::info!("Using {} storage", repo.backend());

    let inventory =
        HttpInventoryClient::new(&config.inventory_service_url, config.inventory_timeout)?;
    let authenticator =
        HttpAuthenticator::new(&config.user_service_url, config.user_service_timeout)?;

    // Create the order service
    let service = OrderService::new(repo, inventory, config.fee_rate);

    // Create and run the HTTP server
    let server = HttpServer::with_rate_limit(
        service,
        Arc::new(authenticator),
        config.rate_limit_per_minute,
    )
    .with_cors_origin(&config.cors_allowed_origin)?;
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
