//! Docling OCR - HTTP front end for the Docling upload client.

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use docling_ocr::{
    DoclingOcr, DoclingOcrConfig, EnvSecretLoader, OcrContext, OcrSettings, OcrUploadHandler,
    SecretLoader, SourceFile, UploadResult,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    handler: Arc<dyn OcrUploadHandler>,
    secrets: Arc<dyn SecretLoader>,
    spool_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "docling_ocr=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional JSON settings file; env vars fill whatever it leaves out
    let settings = match std::env::var("DOCLING_OCR_SETTINGS") {
        Ok(path) if !path.is_empty() => Some(OcrSettings::load(Path::new(&path))?),
        _ => None,
    };
    let config = DoclingOcrConfig::from_env(settings.as_ref())?;
    info!("Docling OCR config: {:?}", config);

    let ocr = DoclingOcr::new(config)?;
    let state = AppState {
        handler: Arc::new(ocr),
        secrets: Arc::new(EnvSecretLoader),
        spool_dir: std::env::temp_dir(),
    };

    let addr = std::env::var("DOCLING_OCR_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ocr", post(ocr_document))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024)) // 100MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct OcrQuery {
    user_id: Option<String>,
}

/// Run an uploaded document through the OCR backend.
async fn ocr_document(
    State(state): State<AppState>,
    Query(query): Query<OcrQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResult>, (StatusCode, String)> {
    let mut upload = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e))
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("document").to_string();
            let mime_type = field.content_type().map(str::to_string);

            // The client streams from disk, so spool the upload there chunk by chunk
            let spool_path = state.spool_dir.join(format!("docling-ocr-{}", uuid::Uuid::new_v4()));
            match spool_field(&mut field, &spool_path).await {
                Ok(size) => upload = Some((filename, mime_type, spool_path, size)),
                Err(e) => {
                    remove_spool(&spool_path).await;
                    return Err(e);
                }
            }
            break;
        }
    }

    let (filename, mime_type, spool_path, size) = match upload {
        Some(upload) if upload.3 > 0 => upload,
        Some((_, _, spool_path, _)) => {
            remove_spool(&spool_path).await;
            return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
        }
        None => return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string())),
    };

    info!(
        "Received file: {} ({} bytes) via {}",
        filename,
        size,
        state.handler.name()
    );

    let ctx = OcrContext {
        user_id: query.user_id.filter(|u| !u.is_empty()),
        file: SourceFile {
            path: spool_path.clone(),
            name: filename,
            size,
            mime_type,
        },
        secrets: state.secrets.clone(),
    };
    let result = state.handler.handle_file_upload(&ctx).await;
    remove_spool(&spool_path).await;

    result.map(Json).map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Write a multipart field to `path`, returning the number of bytes written.
async fn spool_field(field: &mut Field<'_>, path: &Path) -> Result<u64, (StatusCode, String)> {
    let store_failed = |e: std::io::Error| {
        error!("Failed to spool upload to {:?}: {}", path, e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to store upload: {}", e))
    };

    let mut file = tokio::fs::File::create(path).await.map_err(store_failed)?;
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
    })? {
        file.write_all(&chunk).await.map_err(store_failed)?;
        size += chunk.len() as u64;
    }
    file.flush().await.map_err(store_failed)?;

    Ok(size)
}

async fn remove_spool(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove spooled upload {:?}: {}", path, e);
    }
}
