use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::client::{BackendError, KvBackend};

/// Shared handler state
pub type Backend = Arc<dyn KvBackend>;

/// Body of `PUT /kv/{key}` and `GET /kv/{key}`
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct ValueBody {
    #[serde(default, alias = "Value")]
    pub value: String,
}

/// Percent-decode the `{key}` segment into raw bytes.
///
/// Read from the URI rather than through `Path`, whose captures must decode
/// to UTF-8. Keys are opaque, so `/kv/%FF` addresses the one-byte key `0xFF`.
/// `{key}` is always the last segment of the matched route.
fn path_key(uri: &Uri) -> Bytes {
    let raw = uri.path().rsplit('/').next().unwrap_or_default();
    Bytes::from(percent_decode_str(raw).collect::<Vec<u8>>())
}

// ── PUT /kv/{key} ────────────────────────────────────────────

pub async fn handle_put(
    State(backend): State<Backend>,
    uri: Uri,
    body: Bytes,
) -> Response {
    let key = path_key(&uri);

    // Decoded by hand so any body, whatever its content type, that is not
    // valid JSON maps to 400.
    let req: ValueBody = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!("rejecting PUT /kv/{}: {}", String::from_utf8_lossy(&key), e);
            return (StatusCode::BAD_REQUEST, "invalid json").into_response();
        }
    };

    match backend.put(key, Bytes::from(req.value)).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => {
            warn!("PUT failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to put").into_response()
        }
    }
}

// ── GET /kv/{key} ────────────────────────────────────────────

pub async fn handle_get(State(backend): State<Backend>, uri: Uri) -> Response {
    match backend.get(path_key(&uri)).await {
        Ok(value) => {
            let body = ValueBody {
                value: String::from_utf8_lossy(&value).into_owned(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            if let BackendError::Rpc(_) = e {
                warn!("GET failed: {}", e);
            }
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

// ── DELETE /kv/{key} ─────────────────────────────────────────

/// Whether the key existed is not surfaced: deleting an absent key is
/// reported as 204 as well.
pub async fn handle_delete(State(backend): State<Backend>, uri: Uri) -> Response {
    match backend.delete(path_key(&uri)).await {
        Ok(existed) => {
            debug!(existed, "DELETE ok");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!("DELETE failed: {}", e);
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}
