use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use badge_api::config::{Config, PersistenceConfig};
use badge_api::db::create_pool;
use badge_api::fonts::{FontLibrary, FontStoreSettings, PgFontCatalog, S3FontBlobs};
use badge_api::presets::PgPresetStore;
use badge_api::routes::build_router;
use badge_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Badge API v{} (storage: {:?})",
        env!("CARGO_PKG_VERSION"),
        config.storage_backend
    );

    let state = match &config.persistence {
        Some(persistence) => build_persistent_state(&config, persistence).await?,
        None => {
            warn!("STORAGE_BACKEND=memory: presets and fonts are lost on restart");
            AppState::in_memory(config.clone())
        }
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres for preset and font metadata, S3 for font binaries.
async fn build_persistent_state(
    config: &Config,
    persistence: &PersistenceConfig,
) -> Result<AppState> {
    let db = create_pool(&persistence.database_url)
        .await
        .context("failed to initialise the preset/font database")?;

    let s3 = build_s3_client(persistence).await;
    info!("S3 client initialized (bucket: {})", persistence.s3_bucket);

    let fonts = FontLibrary::new(
        Arc::new(PgFontCatalog::new(db.clone())),
        Arc::new(S3FontBlobs::new(s3, persistence.s3_bucket.clone())),
        FontStoreSettings {
            url_prefix: config.font_url_prefix.clone(),
            max_bytes: config.max_font_bytes,
        },
    );

    Ok(AppState {
        presets: Arc::new(PgPresetStore::new(db)),
        fonts: Arc::new(fonts),
        config: config.clone(),
    })
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(persistence: &PersistenceConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &persistence.aws_access_key_id,
        &persistence.aws_secret_access_key,
        None,
        None,
        "badge-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&persistence.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not subdomain.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
