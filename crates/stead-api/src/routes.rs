use std::sync::Arc;

use axum::extract::{Multipart, Path, Request, State};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use stead_core::sync::{csrf_token_from_cookies, SyncRequest, SyncResponse};
use stead_core::util::unix_timestamp_now;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::staging::StagingStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    staging: Arc<StagingStore>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.media_dir)
            .map_err(|error| AppError::internal(format!("create media dir: {error}")))?;
        let staging = Arc::new(StagingStore::open(&config.db_path)?);
        Ok(Self { config, staging })
    }
}

pub fn app_router(state: AppState) -> Router {
    let media_dir = state.config.media_dir.clone();

    Router::new()
        .route("/healthz", get(healthz))
        .route("/editor/{site}", patch(editor_sync))
        .route("/editor/upload", post(upload_image))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(middleware::from_fn(require_csrf))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: unix_timestamp_now(),
    })
}

/// Anti-forgery gate: a state-mutating request carrying a `csrf` cookie
/// must echo it on `X-CSRF-Token`. Requests without the cookie pass; the
/// reference service does not manage sessions.
async fn require_csrf(request: Request, next: Next) -> Result<Response, AppError> {
    if !matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return Ok(next.run(request).await);
    }

    let cookie_token = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(csrf_token_from_cookies);

    if let Some(expected) = cookie_token {
        let presented = request
            .headers()
            .get("X-CSRF-Token")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if presented != expected {
            tracing::debug!("Rejecting request with mismatched anti-forgery token");
            return Err(AppError::forbidden("anti-forgery token mismatch"));
        }
    }

    Ok(next.run(request).await)
}

/// The sync arbitration endpoint.
///
/// First contact stages the client's envelope and reports it up to date.
/// A strictly newer client replaces staging. Anything else gets the raw
/// staging blob back with `shouldPatch: true`: the stored envelope, so
/// `siteData` arrives doubly-nested and the client unwraps it.
async fn editor_sync(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    if site.trim().is_empty() {
        return Err(AppError::bad_request("site slug must not be empty"));
    }

    let Some(staged) = state.staging.get(&site)? else {
        let blob = serde_json::to_string(&request)
            .map_err(|error| AppError::internal(format!("serialize staging: {error}")))?;
        state.staging.put(&site, &blob, unix_timestamp_now())?;
        tracing::debug!("First sync for {site}; staged client data");
        return Ok(Json(SyncResponse {
            should_patch: false,
            site_data: None,
        }));
    };

    if request.local_data.last_updated > staged.last_update {
        let blob = serde_json::to_string(&request)
            .map_err(|error| AppError::internal(format!("serialize staging: {error}")))?;
        state
            .staging
            .put(&site, &blob, request.local_data.last_updated)?;
        tracing::debug!("Client is newer for {site}; staging replaced");
        return Ok(Json(SyncResponse {
            should_patch: false,
            site_data: None,
        }));
    }

    let site_data = serde_json::from_str(&staged.data)
        .map_err(|error| AppError::internal(format!("parse staging: {error}")))?;
    tracing::debug!("Server is newer for {site}; returning staged data");
    Ok(Json(SyncResponse {
        should_patch: true,
        site_data: Some(site_data),
    }))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: u8,
    file: UploadedFile,
}

#[derive(Debug, Serialize)]
struct UploadedFile {
    url: String,
}

/// The block editor's image upload endpoint: multipart field `file`.
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::bad_request(format!("invalid multipart body: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::bad_request(format!("unreadable upload: {error}")))?;
        if bytes.is_empty() {
            return Err(AppError::bad_request("uploaded file is empty"));
        }

        let key = object_key(&filename);
        let target = state.config.media_dir.join(&key);
        std::fs::write(&target, &bytes)
            .map_err(|error| AppError::internal(format!("persist upload: {error}")))?;

        tracing::debug!("Stored upload {filename} as {key}");
        return Ok(Json(UploadResponse {
            success: 1,
            file: UploadedFile {
                url: state.config.media_url(&key),
            },
        }));
    }

    Err(AppError::bad_request("multipart field 'file' missing"))
}

/// Content-addressed-ish object key: fresh UUID plus a sanitized extension
/// from the original filename.
fn object_key(filename: &str) -> String {
    let id = uuid::Uuid::now_v7();
    match sanitized_extension(filename) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn sanitized_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .take(8)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sanitized_extension_strips_oddities() {
        assert_eq!(sanitized_extension("photo.PNG"), Some("png".to_string()));
        assert_eq!(sanitized_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(sanitized_extension("no-extension"), None);
        assert_eq!(sanitized_extension("weird.p/n;g"), Some("png".to_string()));
        assert_eq!(sanitized_extension("dotfile."), None);
    }

    #[test]
    fn object_keys_are_unique_and_keep_extension() {
        let a = object_key("a.png");
        let b = object_key("b.png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
    }
}
