//! Remote store: the todo collection operations, one network call each.
//!
//! # Design
//! `RemoteStore` is the seam the cache depends on, so cache behaviour can be
//! tested against an in-memory store. `HttpRemoteStore` is the production
//! implementation: `TodoClient` builds and parses, a `Transport` does the I/O.
//! No retries happen at this layer.

use async_trait::async_trait;

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{CreateTodo, ReorderRequest, Todo, TodoId, UpdateTodo};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All todos, in no particular order.
    async fn list(&self) -> Result<Vec<Todo>, ApiError>;

    async fn get(&self, id: TodoId) -> Result<Todo, ApiError>;

    /// The server assigns `id` and appends at `order = max + 1`.
    async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError>;

    async fn update(&self, id: TodoId, input: &UpdateTodo) -> Result<Todo, ApiError>;

    /// Deleting an id that is already gone fails with `NotFound`.
    async fn delete(&self, id: TodoId) -> Result<(), ApiError>;

    /// `items` must name every existing todo exactly once with a dense
    /// `1..=N` order. Returns the full collection in its new order.
    async fn reorder(&self, items: &[ReorderRequest]) -> Result<Vec<Todo>, ApiError>;
}

/// `RemoteStore` speaking the `/todos` HTTP resource.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore<T = ReqwestTransport> {
    client: TodoClient,
    transport: T,
}

impl HttpRemoteStore<ReqwestTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(TodoClient::new(&config.base_url), ReqwestTransport::new(config)?))
    }
}

impl<T: Transport> HttpRemoteStore<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    /// Liveness probe against `/todos/health`.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_health()).await?;
        self.client.parse_health(response)
    }
}

#[async_trait]
impl<T: Transport> RemoteStore for HttpRemoteStore<T> {
    async fn list(&self) -> Result<Vec<Todo>, ApiError> {
        let response = self.transport.execute(self.client.build_list_todos()).await?;
        self.client.parse_list_todos(response)
    }

    async fn get(&self, id: TodoId) -> Result<Todo, ApiError> {
        let response = self.transport.execute(self.client.build_get_todo(id)).await?;
        self.client.parse_get_todo(response)
    }

    async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError> {
        let request = self.client.build_create_todo(input)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_create_todo(response)
    }

    async fn update(&self, id: TodoId, input: &UpdateTodo) -> Result<Todo, ApiError> {
        let request = self.client.build_update_todo(id, input)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_update_todo(response)
    }

    async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }

    async fn reorder(&self, items: &[ReorderRequest]) -> Result<Vec<Todo>, ApiError> {
        let request = self.client.build_reorder_todos(items)?;
        let response = self.transport.execute(request).await?;
        match self.client.parse_reorder_todos(response)? {
            Some(todos) => Ok(todos),
            None => {
                tracing::debug!("reorder acknowledged without body, listing");
                self.list().await
            }
        }
    }
}
