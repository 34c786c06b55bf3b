use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geopost_api::bootstrap;
use geopost_api::config::ApiConfig;
use geopost_api::router::create_router_with_limit;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geopost_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api = ApiConfig::from_env();
    let settings = bootstrap::load_settings(&api)?;
    if api.uses_dev_secret() {
        tracing::warn!("GEOPOST_JWT_SECRET not set, using the development secret");
    }

    tracing::info!(
        port = api.port,
        index = %settings.index_name.value,
        default_radius_km = settings.default_radius_km.value,
        elasticsearch = api.uses_elasticsearch(),
        postgres = api.uses_postgres(),
        "Starting geopost API server"
    );

    let backends = bootstrap::connect_backends(&api, &settings).await.map_err(|e| {
        tracing::error!(
            "Remediation:\n\
            1. Ensure Elasticsearch, S3 and PostgreSQL are reachable\n\
            2. Verify ELASTICSEARCH_URL, GEOPOST_S3_BUCKET and DATABASE_URL\n\
            3. Unset a variable to fall back to the in-memory backend"
        );
        e
    })?;
    bootstrap::prepare_index(&backends).await?;

    let _reconciler = bootstrap::spawn_reconciler(&api, &settings, &backends);
    let state = Arc::new(bootstrap::build_state(&api, &settings, backends));

    let cors = CorsLayer::new()
        .allow_origin(
            api.cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid GEOPOST_CORS_ORIGIN '{}'", api.cors_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router_with_limit(state, api.max_upload_bytes).layer(cors);

    let addr = api.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", api.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
