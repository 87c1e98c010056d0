//! gRPC storage service
//!
//! Adapts the [`Store`] to the `kv.v1.KeyValue` service. The adapter keeps no
//! state of its own: each call is one store operation plus the mapping of its
//! outcome onto the wire (absence on `Get` becomes `NOT_FOUND`).

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::debug;

use crate::store::Store;

/// Generated protobuf types and gRPC stubs
pub mod proto {
    tonic::include_proto!("kv.v1");
}

use proto::key_value_server::{KeyValue, KeyValueServer};
use proto::{
    DeleteRequest, DeleteResponse, GetRequest, GetResponse, PutRequest, PutResponse,
};

/// Message carried by the `NOT_FOUND` status returned from `Get`
pub const KEY_NOT_FOUND: &str = "key not found";

/// Storage service backed by a shared entity store
#[derive(Clone)]
pub struct StorageService {
    store: Arc<Store>,
}

impl StorageService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Wrap the service into a tonic server ready to be mounted
    pub fn into_server(self) -> KeyValueServer<Self> {
        KeyValueServer::new(self)
    }
}

#[tonic::async_trait]
impl KeyValue for StorageService {
    async fn put(&self, request: Request<PutRequest>) -> Result<Response<PutResponse>, Status> {
        let PutRequest { key, value } = request.into_inner();
        debug!(key_len = key.len(), value_len = value.len(), "put");

        self.store.put(key, value);
        Ok(Response::new(PutResponse { success: true }))
    }

    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let key = request.into_inner().key;

        match self.store.get(&key) {
            Some(value) => {
                debug!(key_len = key.len(), value_len = value.len(), "get hit");
                Ok(Response::new(GetResponse { value }))
            }
            None => {
                debug!(key_len = key.len(), "get miss");
                Err(Status::not_found(KEY_NOT_FOUND))
            }
        }
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let key = request.into_inner().key;
        let existed = self.store.delete(&key);
        debug!(key_len = key.len(), existed, "delete");

        Ok(Response::new(DeleteResponse { success: existed }))
    }
}
