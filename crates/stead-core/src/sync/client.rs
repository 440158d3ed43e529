//! Remote sync client

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Draft, SiteId};
use crate::util::{compact_text, normalize_base_url};

use super::protocol::{resolve_response, ResolvedFrom, SyncRequest, SyncResponse};

/// Request timeout for the sync exchange; a hung request must not outlive
/// the next debounce window by much.
const SYNC_HTTP_TIMEOUT_SECS: u64 = 10;

/// Name of the origin cookie carrying the anti-forgery token.
const CSRF_COOKIE_NAME: &str = "csrf";

/// Header the token is forwarded on.
const CSRF_HEADER_NAME: &str = "X-CSRF-Token";

/// Result of one sync round-trip.
///
/// There is always a usable draft: every degraded path keeps the local
/// side. Callers that need to know what happened get the winning side and
/// whether the server accepted the exchange at all.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// The new baseline draft
    pub draft: Draft,
    /// Which side supplied the baseline
    pub resolved_from: ResolvedFrom,
    /// Whether the server accepted the exchange
    pub reached_server: bool,
}

impl SyncOutcome {
    fn local(draft: &Draft, reached_server: bool) -> Self {
        Self {
            draft: draft.clone(),
            resolved_from: ResolvedFrom::Local,
            reached_server,
        }
    }
}

/// Transport seam between the sync engine and the remote authority.
///
/// The loop and the controller only see this trait; hosts and tests can
/// substitute transports without touching scheduling.
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Reconcile a local draft with the remote authority.
    ///
    /// Infallible by contract: network, status, and parse failures all
    /// degrade to the local draft winning.
    async fn sync(&self, site: &SiteId, local: &Draft) -> SyncOutcome;
}

/// HTTP client for the per-site sync endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSyncClient {
    base_url: String,
    cookies: Option<String>,
    client: reqwest::Client,
}

impl RemoteSyncClient {
    /// Build a client for an explicit service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SYNC_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| {
                Error::InvalidInput(format!("failed to construct HTTP client: {error}"))
            })?;
        Ok(Self {
            base_url,
            cookies: None,
            client,
        })
    }

    /// Attach the origin cookie string sent as credentials.
    ///
    /// The anti-forgery token is extracted from it; an absent `csrf`
    /// cookie sends an empty token and never blocks the exchange.
    #[must_use]
    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    /// The base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn csrf_token(&self) -> String {
        self.cookies
            .as_deref()
            .and_then(csrf_token_from_cookies)
            .unwrap_or_default()
    }

    async fn exchange(
        &self,
        site: &SiteId,
        local: &Draft,
    ) -> std::result::Result<SyncResponse, String> {
        let url = format!(
            "{}/editor/{}",
            self.base_url,
            urlencoding::encode(site.as_str())
        );

        let mut request = self
            .client
            .patch(&url)
            .header(CSRF_HEADER_NAME, self.csrf_token())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SyncRequest {
                local_data: local.clone(),
            });
        if let Some(cookies) = &self.cookies {
            request = request.header(reqwest::header::COOKIE, cookies.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|error| format!("sync request failed: {error}"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "sync endpoint returned HTTP {status}: {}",
                compact_text(&body)
            ));
        }

        response
            .json::<SyncResponse>()
            .await
            .map_err(|error| format!("invalid sync response body: {error}"))
    }
}

#[async_trait]
impl SyncService for RemoteSyncClient {
    async fn sync(&self, site: &SiteId, local: &Draft) -> SyncOutcome {
        match self.exchange(site, local).await {
            Ok(response) => {
                let (draft, resolved_from) = resolve_response(local, &response);
                tracing::debug!(
                    "Synced {site}: {}",
                    match resolved_from {
                        ResolvedFrom::Local => "local data kept",
                        ResolvedFrom::Server => "server data applied",
                    }
                );
                SyncOutcome {
                    draft,
                    resolved_from,
                    reached_server: true,
                }
            }
            Err(reason) => {
                tracing::warn!("Sync for {site} degraded to local data: {reason}");
                SyncOutcome::local(local, false)
            }
        }
    }
}

/// Extract the anti-forgery token from a cookie header string.
pub fn csrf_token_from_cookies(cookies: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == CSRF_COOKIE_NAME {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}
