//! Web form front end: upload images, pick a size and a color, get padded copies back

use std::path::PathBuf;
use std::sync::Arc;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{BackgroundColor, BatchSettings, Config, OutputFormat, TargetBox};
use crate::error::{PadResizeError, Result};
use crate::parallel::{build_worker_pool, BatchRunner};
use crate::processing::{has_supported_extension, sanitize_file_name, ProcessingItem};

pub mod page;

pub use page::{FormValues, UploadSummary};

/// Shared state of the web handlers.
///
/// Every request runs its batch on the same worker pool, so concurrent
/// uploads together never use more than the configured worker count.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: Arc<rayon::ThreadPool>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = build_worker_pool(config.processing.workers)?;

        Ok(Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
        })
    }

    /// Threads available to all uploads combined
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.config.server.output_dir
    }
}

/// Build the router with every route of the web front end
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/resize", post(resize))
        .route("/processed/:name", get(download))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve on an already bound listener until the process is interrupted
pub async fn serve_on(listener: TcpListener, config: Config) -> Result<()> {
    let app = router(AppState::new(config)?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

/// Bind the configured address and serve the form
pub async fn serve(config: Config) -> Result<()> {
    let listener = TcpListener::bind(config.server.bind).await.map_err(|e| {
        PadResizeError::config(format!("Cannot listen on {}: {}", config.server.bind, e))
    })?;

    info!(
        "Listening on http://{} (outputs in {:?})",
        listener.local_addr()?,
        config.server.output_dir
    );

    serve_on(listener, config).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> impl IntoResponse {
    "ok"
}

async fn index() -> Html<String> {
    Html(page::render_form(None, &FormValues::default()))
}

async fn resize(State(state): State<AppState>, multipart: Multipart) -> std::result::Result<Html<String>, AppError> {
    let upload = read_upload(multipart).await?;
    let values = upload.values.clone();

    match process_upload(&state, upload).await {
        Ok(summary) => Ok(Html(page::render_summary(&summary))),
        Err(PadResizeError::InvalidConfiguration { message }) => {
            warn!(error = %message, "rejected upload");
            Err(AppError::InvalidForm { message, values })
        }
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}

async fn download(State(state): State<AppState>, Path(name): Path<String>) -> std::result::Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("No processed image named '{}'", name));

    // Only bare file names inside the output folder are served
    if sanitize_file_name(&name).as_deref() != Some(name.as_str()) {
        return Err(not_found());
    }

    let path = state.output_dir().join(&name);
    let data = tokio::fs::read(&path).await.map_err(|_| not_found())?;

    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => OutputFormat::Png.mime_type(),
        Some("jpeg") | Some("jpg") => OutputFormat::Jpeg.mime_type(),
        _ => "application/octet-stream",
    };

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// Fields of one multipart form submission
#[derive(Debug, Default)]
struct Upload {
    values: FormValues,
    files: Vec<(String, Bytes)>,
    /// Field names were present, as opposed to blank
    has_width: bool,
    has_height: bool,
}

async fn read_upload(mut multipart: Multipart) -> std::result::Result<Upload, AppError> {
    let mut upload = Upload::default();
    let bad_body = |e: axum::extract::multipart::MultipartError| AppError::InvalidForm {
        message: format!("Could not read the upload: {}", e),
        values: FormValues::default(),
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(bad_body)?;

                // An empty file input still submits one nameless, empty part
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                upload.files.push((file_name, data));
            }
            "width" => {
                upload.values.width = field.text().await.map_err(bad_body)?.trim().to_string();
                upload.has_width = !upload.values.width.is_empty();
            }
            "height" => {
                upload.values.height = field.text().await.map_err(bad_body)?.trim().to_string();
                upload.has_height = !upload.values.height.is_empty();
            }
            "bgcolor" => {
                upload.values.bgcolor = field.text().await.map_err(bad_body)?.trim().to_string();
            }
            other => {
                warn!(field = %other, "ignoring unknown form field");
            }
        }
    }

    Ok(upload)
}

/// Validate the form, then run one batch over the uploaded files.
///
/// Nothing is written unless every form field is valid.
async fn process_upload(state: &AppState, upload: Upload) -> Result<UploadSummary> {
    let Upload { values, files, has_width, has_height } = upload;

    if !has_width || !has_height {
        return Err(PadResizeError::config("Width and height are required"));
    }
    let target = TargetBox::parse(&values.width, &values.height)?;
    let background = BackgroundColor::parse_hex(&values.bgcolor)?;

    let processing = &state.config.processing;
    let output_dir: PathBuf = state.output_dir().to_path_buf();

    let mut items = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for (raw_name, data) in files {
        match sanitize_file_name(&raw_name) {
            Some(name) if has_supported_extension(&name) => {
                items.push(ProcessingItem::from_bytes(&name, data, &output_dir, processing.output_format));
            }
            _ => skipped.push(raw_name),
        }
    }

    if items.is_empty() {
        return Err(PadResizeError::config(
            "No valid image files were uploaded (accepted: .png, .jpg, .jpeg)",
        ));
    }

    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| PadResizeError::write(&output_dir, e))?;

    info!(
        "Processing upload of {} images ({} skipped) to {} on {}",
        items.len(),
        skipped.len(),
        target,
        background
    );

    let settings = BatchSettings::new(target, processing).background(background);
    let runner = BatchRunner::with_pool(settings, Arc::clone(&state.pool))?;
    let result = runner.run_async(items).await?;

    Ok(UploadSummary {
        target,
        background,
        result,
        skipped,
    })
}

/// Failure responses of the web handlers
#[derive(Debug)]
pub enum AppError {
    /// Form rejected before any processing; re-rendered with the message
    InvalidForm { message: String, values: FormValues },
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidForm { message, values } => (
                StatusCode::BAD_REQUEST,
                Html(page::render_form(Some(&message), &values)),
            )
                .into_response(),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            AppError::Internal(message) => {
                tracing::error!(error = %message, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(page::render_form(Some(&message), &FormValues::default())),
                )
                    .into_response()
            }
        }
    }
}
