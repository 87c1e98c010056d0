//! HTTP gateway
//!
//! Translates `/kv/{key}` requests into calls against the storage node and
//! maps the outcome back onto HTTP status codes.

pub mod client;
pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::put;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::Result;

pub use self::client::{BackendError, KvBackend, StorageClient};
use self::handlers::{Backend, handle_delete, handle_get, handle_put};

/// Build the gateway router over any backend
pub fn router(backend: Backend) -> Router {
    Router::new()
        .route(
            "/kv/{key}",
            put(handle_put).get(handle_get).delete(handle_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(backend)
}

/// HTTP server in front of a remote storage node
pub struct GatewayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl GatewayServer {
    /// Bind the HTTP listener and prepare the storage client
    pub async fn bind(config: &GatewayConfig) -> Result<Self> {
        let client = StorageClient::connect_lazy(config)?;
        info!("Storage backend: {}", config.backend_addr);

        let listener = TcpListener::bind(&config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP gateway bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            router: router(Arc::new(client)),
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Gateway started, listening on {}", self.local_addr);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Gateway stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tonic::Status;
    use tower::ServiceExt;

    /// Backend running the store in-process
    #[derive(Default)]
    struct LocalBackend {
        store: Store,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KvBackend for LocalBackend {
        async fn put(&self, key: Bytes, value: Bytes) -> std::result::Result<(), BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.store.put(key, value);
            Ok(())
        }

        async fn get(&self, key: Bytes) -> std::result::Result<Bytes, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.store.get(&key).ok_or(BackendError::NotFound)
        }

        async fn delete(&self, key: Bytes) -> std::result::Result<bool, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.store.delete(&key))
        }
    }

    /// Backend whose every call fails at the transport level
    struct DownBackend;

    #[async_trait]
    impl KvBackend for DownBackend {
        async fn put(&self, _: Bytes, _: Bytes) -> std::result::Result<(), BackendError> {
            Err(Status::unavailable("tcp connect error 10.0.0.7:8081").into())
        }

        async fn get(&self, _: Bytes) -> std::result::Result<Bytes, BackendError> {
            Err(Status::unavailable("tcp connect error 10.0.0.7:8081").into())
        }

        async fn delete(&self, _: Bytes) -> std::result::Result<bool, BackendError> {
            Err(Status::deadline_exceeded("timeout").into())
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: &'static str) -> (StatusCode, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let app = router(Arc::new(LocalBackend::default()));

        let (status, body) = send(&app, Method::PUT, "/kv/foo", r#"{"value":"bar"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.is_empty());

        let (status, body) = send(&app, Method::GET, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::OK);
        let decoded: handlers::ValueBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded.value, "bar");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let app = router(Arc::new(LocalBackend::default()));
        let (status, _) = send(&app, Method::GET, "/kv/missing", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_json_never_reaches_backend() {
        let backend = Arc::new(LocalBackend::default());
        let app = router(backend.clone());

        let (status, body) = send(&app, Method::PUT, "/kv/foo", "not-json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(&body[..], b"invalid json");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(backend.store.get(b"foo").is_none());
    }

    #[tokio::test]
    async fn test_wrong_value_type_is_bad_request() {
        let app = router(Arc::new(LocalBackend::default()));
        let (status, _) = send(&app, Method::PUT, "/kv/foo", r#"{"value":5}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_value_field_stores_empty_value() {
        let backend = Arc::new(LocalBackend::default());
        let app = router(backend.clone());

        let (status, _) = send(&app, Method::PUT, "/kv/foo", "{}").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(backend.store.get(b"foo"), Some(Bytes::new()));

        let (status, body) = send(&app, Method::GET, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], br#"{"value":""}"#);
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let app = router(Arc::new(LocalBackend::default()));
        send(&app, Method::PUT, "/kv/foo", r#"{"value":"bar"}"#).await;

        let (status, body) = send(&app, Method::DELETE, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = send(&app, Method::GET, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // Deleting an absent key is deliberately indistinguishable from deleting
    // a present one at the HTTP surface.
    #[tokio::test]
    async fn test_delete_absent_key_is_no_content() {
        let app = router(Arc::new(LocalBackend::default()));
        let (status, _) = send(&app, Method::DELETE, "/kv/never-set", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_percent_encoded_key() {
        let backend = Arc::new(LocalBackend::default());
        let app = router(backend.clone());

        let (status, _) = send(&app, Method::PUT, "/kv/a%20b", r#"{"value":"x"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(backend.store.get(b"a b"), Some(Bytes::from("x")));
    }

    #[tokio::test]
    async fn test_non_utf8_key_is_addressable() {
        let backend = Arc::new(LocalBackend::default());
        let app = router(backend.clone());

        let (status, body) = send(&app, Method::GET, "/kv/%FF", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"not found");

        let (status, _) = send(&app, Method::PUT, "/kv/%FF", r#"{"value":"raw"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(backend.store.get(&[0xFF]), Some(Bytes::from("raw")));

        let (status, body) = send(&app, Method::GET, "/kv/%FF", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], br#"{"value":"raw"}"#);

        let (status, _) = send(&app, Method::DELETE, "/kv/%FF", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(backend.store.get(&[0xFF]).is_none());
    }

    #[tokio::test]
    async fn test_non_utf8_key_with_backend_down() {
        let app = router(Arc::new(DownBackend));

        let (status, body) = send(&app, Method::PUT, "/kv/%FF", r#"{"value":"raw"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body[..], b"failed to put");

        let (status, body) = send(&app, Method::GET, "/kv/%FF", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"not found");

        let (status, body) = send(&app, Method::DELETE, "/kv/%FF", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"not found");
    }

    #[tokio::test]
    async fn test_capitalized_value_field() {
        let backend = Arc::new(LocalBackend::default());
        let app = router(backend.clone());

        let (status, _) = send(&app, Method::PUT, "/kv/foo", r#"{"Value":"x"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(backend.store.get(b"foo"), Some(Bytes::from("x")));

        // Any other field name is ignored and stores the empty value
        let (status, _) = send(&app, Method::PUT, "/kv/bar", r#"{"val":"x"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(backend.store.get(b"bar"), Some(Bytes::new()));
    }

    #[tokio::test]
    async fn test_backend_down_mapping() {
        let app = router(Arc::new(DownBackend));

        let (status, body) = send(&app, Method::PUT, "/kv/foo", r#"{"value":"bar"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body[..], b"failed to put");

        let (status, body) = send(&app, Method::GET, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"not found");

        let (status, _) = send(&app, Method::DELETE, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let app = router(Arc::new(LocalBackend::default()));
        let (status, _) = send(&app, Method::POST, "/kv/foo", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
