use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Response, Status};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::service::proto::key_value_client::KeyValueClient;
use crate::service::proto::{DeleteRequest, GetRequest, PutRequest};

/// Failure of a call against the storage backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The key has no binding
    #[error("key not found")]
    NotFound,

    /// Transport failure, deadline, or any other non-success status
    #[error("storage call failed: {0}")]
    Rpc(Status),
}

impl From<Status> for BackendError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::NotFound => BackendError::NotFound,
            _ => BackendError::Rpc(status),
        }
    }
}

/// Key-value operations the HTTP handlers delegate to
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn put(&self, key: Bytes, value: Bytes) -> std::result::Result<(), BackendError>;

    async fn get(&self, key: Bytes) -> std::result::Result<Bytes, BackendError>;

    /// Returns whether the key existed before the delete
    async fn delete(&self, key: Bytes) -> std::result::Result<bool, BackendError>;
}

/// gRPC client for a remote storage node
#[derive(Clone)]
pub struct StorageClient {
    inner: KeyValueClient<Channel>,
    request_timeout: Duration,
}

impl StorageClient {
    /// Build a client without dialing. The connection is established on the
    /// first call and re-established after failures, so the gateway can start
    /// before the node is reachable. Must be called within a tokio runtime.
    pub fn connect_lazy(config: &GatewayConfig) -> Result<Self> {
        let channel = endpoint(config)?.connect_lazy();
        Ok(Self {
            inner: KeyValueClient::new(channel),
            request_timeout: config.request_timeout(),
        })
    }

    /// Run one call under the request deadline. An elapsed deadline drops the
    /// in-flight call and is reported like any other transport failure.
    async fn call<T, F>(&self, call: F) -> std::result::Result<T, BackendError>
    where
        F: Future<Output = std::result::Result<Response<T>, Status>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(resp) => Ok(resp?.into_inner()),
            Err(_) => Err(BackendError::Rpc(Status::deadline_exceeded(
                "storage call timed out",
            ))),
        }
    }
}

fn endpoint(config: &GatewayConfig) -> Result<Endpoint> {
    let uri = if config.backend_addr.contains("://") {
        config.backend_addr.clone()
    } else {
        format!("http://{}", config.backend_addr)
    };

    let endpoint = Endpoint::from_shared(uri).map_err(|source| Error::InvalidEndpoint {
        addr: config.backend_addr.clone(),
        source,
    })?;

    Ok(endpoint
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout()))
}

#[async_trait]
impl KvBackend for StorageClient {
    async fn put(&self, key: Bytes, value: Bytes) -> std::result::Result<(), BackendError> {
        let mut client = self.inner.clone();
        self.call(client.put(Request::new(PutRequest { key, value })))
            .await?;
        Ok(())
    }

    async fn get(&self, key: Bytes) -> std::result::Result<Bytes, BackendError> {
        let mut client = self.inner.clone();
        let resp = self.call(client.get(Request::new(GetRequest { key }))).await?;
        Ok(resp.value)
    }

    async fn delete(&self, key: Bytes) -> std::result::Result<bool, BackendError> {
        let mut client = self.inner.clone();
        let resp = self
            .call(client.delete(Request::new(DeleteRequest { key })))
            .await?;
        Ok(resp.success)
    }
}
