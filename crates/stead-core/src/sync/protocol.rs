//! Wire types for the draft sync exchange

use serde::{Deserialize, Serialize};

use crate::models::Draft;

/// Request body for `PATCH /editor/{site}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub local_data: Draft,
}

/// Response body of the sync endpoint.
///
/// `site_data` is kept as raw JSON: the server may answer with a bare
/// draft or with its stored request envelope (`{"localData": ...}`), and
/// resolution has to cope with both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub should_patch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_data: Option<serde_json::Value>,
}

/// Which side of the exchange supplied the resolved draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Local,
    Server,
}

/// Apply the server's conflict decision to the local draft.
///
/// The server is the sole arbiter: only `shouldPatch = true` with usable
/// `siteData` replaces the local draft, whole-draft, no field merging.
/// One `{"localData": ...}` nesting level is unwrapped. Anything
/// unusable keeps the local draft.
pub fn resolve_response(local: &Draft, response: &SyncResponse) -> (Draft, ResolvedFrom) {
    if !response.should_patch {
        return (local.clone(), ResolvedFrom::Local);
    }

    let Some(site_data) = response.site_data.clone() else {
        return (local.clone(), ResolvedFrom::Local);
    };

    let unwrapped = match site_data {
        serde_json::Value::Object(mut map) => match map.remove("localData") {
            Some(inner) => inner,
            None => serde_json::Value::Object(map),
        },
        other => other,
    };

    match serde_json::from_value::<Draft>(unwrapped) {
        Ok(draft) => (draft, ResolvedFrom::Server),
        Err(error) => {
            tracing::warn!("Ignoring malformed siteData from server: {error}");
            (local.clone(), ResolvedFrom::Local)
        }
    }
}
