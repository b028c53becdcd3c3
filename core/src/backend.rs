//! The four remote calls the controller needs, behind one trait.
//!
//! Two implementations: the discovery-built `EndpointService`, dispatching by
//! operation name, and `FixedTodoService`, which calls hand-written
//! endpoints through `TodoClient` and is usable immediately.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::service::EndpointService;
use crate::transport::Transport;
use crate::types::{InsertTodo, ListQuery, TodoItem, TodoList};

pub const LIST_TODOS: &str = "listTodos";
pub const INSERT_TODO: &str = "insertTodo";
pub const TOGGLE_TODO: &str = "toggleTodo";
pub const DELETE_TODO: &str = "deleteTodo";

#[async_trait]
pub trait TodoBackend: Send + Sync {
    async fn list(&self) -> Result<TodoList, ApiError>;
    async fn insert(&self, input: &InsertTodo) -> Result<TodoItem, ApiError>;
    async fn toggle(&self, id: &str) -> Result<TodoItem, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;

    /// Observes whether the backend is ready to take calls.
    fn loaded(&self) -> watch::Receiver<bool>;
}

#[async_trait]
impl TodoBackend for EndpointService {
    async fn list(&self) -> Result<TodoList, ApiError> {
        self.call_as(LIST_TODOS, json!({})).await
    }

    async fn insert(&self, input: &InsertTodo) -> Result<TodoItem, ApiError> {
        let args = serde_json::to_value(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.call_as(INSERT_TODO, args).await
    }

    async fn toggle(&self, id: &str) -> Result<TodoItem, ApiError> {
        self.call_as(TOGGLE_TODO, json!({ "id": id })).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.call(DELETE_TODO, json!({ "id": id })).await.map(|_| ())
    }

    fn loaded(&self) -> watch::Receiver<bool> {
        self.subscribe()
    }
}

/// Hand-written service over the fixed todo endpoints. Always loaded.
pub struct FixedTodoService {
    client: TodoClient,
    transport: Arc<dyn Transport>,
    loaded: watch::Sender<bool>,
}

impl FixedTodoService {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        let (loaded, _) = watch::channel(true);
        Ok(Self {
            client: TodoClient::new(base_url)?,
            transport,
            loaded,
        })
    }
}

#[async_trait]
impl TodoBackend for FixedTodoService {
    async fn list(&self) -> Result<TodoList, ApiError> {
        let request = self.client.build_list_todos(&ListQuery::default())?;
        self.client.parse_list_todos(self.transport.execute(request).await?)
    }

    async fn insert(&self, input: &InsertTodo) -> Result<TodoItem, ApiError> {
        let request = self.client.build_insert_todo(input)?;
        self.client.parse_insert_todo(self.transport.execute(request).await?)
    }

    async fn toggle(&self, id: &str) -> Result<TodoItem, ApiError> {
        let request = self.client.build_toggle_todo(id)?;
        self.client.parse_toggle_todo(self.transport.execute(request).await?)
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_todo(id)?;
        self.client.parse_delete_todo(self.transport.execute(request).await?)
    }

    fn loaded(&self) -> watch::Receiver<bool> {
        self.loaded.subscribe()
    }
}
