use std::sync::Arc;

use anyhow::Context;
use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::{S3BlobStore, S3Settings};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use plantdex_server::build_router;
use plantdex_server::config::{AppConfig, StorageBackend, StorageConfig};
use plantdex_server::database::init_db;
use plantdex_server::plants::openai::OpenAiGenerator;
use plantdex_server::plants::store::{MemoryPlantStore, SeaOrmPlantStore};
use plantdex_server::plants::{ImageStore, PlantStore};
use plantdex_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let store: Arc<dyn PlantStore> = if config.database.is_memory() {
        warn!("Using the in-memory plant store; records are lost on exit");
        Arc::new(MemoryPlantStore::new())
    } else {
        let db = init_db(&config.database)
            .await
            .context("Failed to connect to database")?;
        Arc::new(SeaOrmPlantStore::new(db))
    };

    let blobs = open_blob_store(&config.storage).await?;
    let images = ImageStore::new(blobs, config.server.public_url());

    let generator = OpenAiGenerator::new(config.generator.clone())
        .context("Failed to build content generator client")?;
    if config.generator.api_key.is_none() {
        warn!("generator.api_key is not set; image generation and suggestions will fail");
    }

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store.clone(), Arc::new(generator), images);
    let app = build_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if let Err(e) = store.close().await {
        error!(error = %e, "Failed to close plant store");
    }
    Ok(())
}

async fn open_blob_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Filesystem => Arc::new(
            FilesystemBlobStore::new(config.data_dir.clone(), config.max_blob_size)
                .await
                .with_context(|| format!("Failed to open {}", config.data_dir.display()))?,
        ),
        StorageBackend::S3 => {
            let settings = S3Settings {
                bucket: config.s3.bucket.clone(),
                region: config.s3.region.clone(),
                endpoint: config.s3.endpoint.clone(),
                access_key: config.s3.access_key.clone(),
                secret_key: config.s3.secret_key.clone(),
                path_style: config.s3.path_style,
            };
            Arc::new(
                S3BlobStore::new(&settings, config.max_blob_size)
                    .context("Failed to configure S3 storage")?,
            )
        }
    };
    info!(backend = store.backend_name(), "Blob storage ready");
    Ok(store)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
}
