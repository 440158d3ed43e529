//! Image upload client
//!
//! The external block editor delegates image uploads here and expects the
//! exact result shape `{ success, file: { url } }` back, including on
//! failure, where `success: 0` with an empty URL tells the widget to show
//! its own error state. Nothing in this module ever raises.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::csrf_token_from_cookies;
use crate::util::{compact_text, normalize_base_url};

const UPLOAD_HTTP_TIMEOUT_SECS: u64 = 30;

/// Result shape consumed by the block editor's image tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub success: u8,
    pub file: UploadedFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

impl UploadResult {
    /// The normalized failure shape.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            success: 0,
            file: UploadedFile { url: String::new() },
        }
    }

    fn uploaded(url: String) -> Self {
        Self {
            success: 1,
            file: UploadedFile { url },
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == 1
    }
}

/// Whatever the endpoint actually answered; anything that doesn't carry a
/// usable URL is normalized away by the client.
#[derive(Debug, Deserialize)]
struct UploadResponseWire {
    #[serde(default)]
    success: i64,
    #[serde(default)]
    file: Option<UploadedFileWire>,
}

#[derive(Debug, Deserialize)]
struct UploadedFileWire {
    #[serde(default)]
    url: Option<String>,
}

/// HTTP client for the multipart upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadClient {
    endpoint: String,
    cookies: Option<String>,
    client: reqwest::Client,
}

impl UploadClient {
    /// Build a client for an explicit upload endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = normalize_base_url(&endpoint.into())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| {
                Error::InvalidInput(format!("failed to construct HTTP client: {error}"))
            })?;
        Ok(Self {
            endpoint,
            cookies: None,
            client,
        })
    }

    /// Attach the origin cookie string; uploads are state-mutating, so the
    /// anti-forgery token travels on them too.
    #[must_use]
    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    /// Upload one file as multipart field `file`.
    ///
    /// Never fails: transport errors, non-2xx statuses, and unexpected
    /// response shapes are all normalized to [`UploadResult::failure`].
    pub async fn upload(&self, filename: &str, content_type: &str, bytes: Vec<u8>) -> UploadResult {
        match self.perform(filename, content_type, bytes).await {
            Ok(result) => result,
            Err(reason) => {
                tracing::warn!("Upload of {filename} normalized to failure: {reason}");
                UploadResult::failure()
            }
        }
    }

    async fn perform(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<UploadResult, String> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|error| format!("invalid content type: {error}"))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let token = self
            .cookies
            .as_deref()
            .and_then(csrf_token_from_cookies)
            .unwrap_or_default();

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("X-CSRF-Token", token)
            .multipart(form);
        if let Some(cookies) = &self.cookies {
            request = request.header(reqwest::header::COOKIE, cookies.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|error| format!("upload request failed: {error}"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "upload endpoint returned HTTP {status}: {}",
                compact_text(&body)
            ));
        }

        let payload = response
            .json::<UploadResponseWire>()
            .await
            .map_err(|error| format!("invalid upload response body: {error}"))?;

        match (payload.success, payload.file.and_then(|file| file.url)) {
            (1, Some(url)) if !url.is_empty() => Ok(UploadResult::uploaded(url)),
            _ => Err("response did not carry a usable file URL".to_string()),
        }
    }
}
