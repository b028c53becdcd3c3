//! Discovery-driven endpoint service.
//!
//! # Design
//! `EndpointService` owns the operation table and the loaded flag for one
//! session. `load_service` fetches a discovery document, builds one
//! `Operation` per method and only then flips the flag, so any observer
//! that sees `true` can call every operation. The flag lives in a
//! `tokio::sync::watch` channel: controllers subscribe and wait for the
//! transition instead of polling.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{watch, RwLock};

use crate::discovery::{build_discovery_request, parse_discovery};
use crate::error::ApiError;
use crate::operation::OperationRegistry;
use crate::transport::Transport;
use crate::types::ApiDescriptor;

pub struct EndpointService {
    base_url: String,
    transport: Arc<dyn Transport>,
    registry: RwLock<OperationRegistry>,
    loaded: watch::Sender<bool>,
}

impl EndpointService {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            registry: RwLock::new(OperationRegistry::default()),
            loaded,
        }
    }

    /// Fetch the discovery document for `api`/`version` and register its
    /// operations. Returns how many were registered.
    ///
    /// On failure nothing is registered and the loaded flag is untouched.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn load_service(&self, api: &str, version: &str) -> Result<usize, ApiError> {
        let descriptor = ApiDescriptor::new(api, version);
        let request = build_discovery_request(&self.base_url, &descriptor);
        let document = parse_discovery(self.transport.execute(request).await?)?;
        let operations = OperationRegistry::from_discovery(&self.base_url, &descriptor, &document)?;
        for name in operations.names() {
            tracing::debug!("Method {name} created");
        }
        let count = operations.len();
        self.registry.write().await.extend(operations);
        self.loaded.send_replace(true);
        tracing::info!(api = %descriptor, operations = count, "endpoint service loaded");
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    /// Receiver that observes the loaded flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.loaded.subscribe()
    }

    /// Registered operation names, sorted.
    pub async fn operation_names(&self) -> Vec<String> {
        self.registry.read().await.names().map(str::to_string).collect()
    }

    /// Invoke a registered operation with JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ApiError> {
        let operation = {
            let registry = self.registry.read().await;
            match registry.get(name) {
                Some(operation) => operation.clone(),
                None if !self.is_loaded() => return Err(ApiError::NotLoaded),
                None => return Err(ApiError::UnknownOperation(name.to_string())),
            }
        };
        let request = operation.build_request(&args)?;
        tracing::debug!(operation = name, method = request.method.as_str(), path = %request.path, "calling");
        operation.parse_response(self.transport.execute(request).await?)
    }

    /// `call`, deserializing the result into `T`.
    pub async fn call_as<T: DeserializeOwned>(&self, name: &str, args: Value) -> Result<T, ApiError> {
        let value = self.call(name, args).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

impl std::fmt::Debug for EndpointService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointService")
            .field("base_url", &self.base_url)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::types::TodoList;

    const DISCOVERY_URL: &str = "http://test/_ah/api/discovery/v1/apis/todo/v1/rest";

    /// Serves canned bodies by URL and records every request.
    #[derive(Default)]
    struct CannedTransport {
        responses: HashMap<String, (u16, String)>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn with(mut self, path: &str, status: u16, body: &str) -> Self {
            self.responses.insert(path.to_string(), (status, body.to_string()));
            self
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.responses.get(&request.path) {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    headers: Vec::new(),
                    body: body.clone(),
                }),
                None => Err(ApiError::Network(format!("connection refused: {}", request.path))),
            }
        }
    }

    fn discovery() -> String {
        json!({
            "resources": {
                "todo": {"methods": {
                    "insert": {"path": "todo", "httpMethod": "POST"},
                    "delete": {"path": "todo/{id}", "httpMethod": "DELETE",
                               "parameters": {"id": {"type": "string", "location": "path", "required": true}}},
                    "toggle": {"path": "todo/{id}",
                               "parameters": {"id": {"type": "string", "location": "path", "required": true}}}
                }},
                "todos": {"methods": {"list": {"path": "todos", "httpMethod": "GET"}}}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn not_loaded_before_load_service() {
        let service = EndpointService::new("http://test", Arc::new(CannedTransport::default()));
        assert!(!service.is_loaded());
        let err = service.call("listTodos", Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::NotLoaded));
    }

    #[tokio::test]
    async fn load_service_registers_every_method() {
        let transport = CannedTransport::default().with(DISCOVERY_URL, 200, &discovery());
        let service = EndpointService::new("http://test/", Arc::new(transport));
        let count = service.load_service("todo", "v1").await.unwrap();
        assert_eq!(count, 4);
        assert!(service.is_loaded());
        assert_eq!(
            service.operation_names().await,
            vec!["deleteTodo", "insertTodo", "listTodos", "toggleTodo"]
        );
    }

    #[tokio::test]
    async fn failed_discovery_leaves_service_unloaded() {
        let transport = CannedTransport::default().with(DISCOVERY_URL, 200, "<html>");
        let service = EndpointService::new("http://test", Arc::new(transport));
        let err = service.load_service("todo", "v1").await.unwrap_err();
        assert!(matches!(err, ApiError::DiscoveryParse(_)));
        assert!(!service.is_loaded());

        let err = service.load_service("other", "v1").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!service.is_loaded());
    }

    #[tokio::test]
    async fn loaded_flag_never_reverts() {
        let transport = CannedTransport::default().with(DISCOVERY_URL, 200, &discovery());
        let service = EndpointService::new("http://test", Arc::new(transport));
        let mut rx = service.subscribe();
        service.load_service("todo", "v1").await.unwrap();
        assert!(*rx.borrow_and_update());

        assert!(service.load_service("missing", "v9").await.is_err());
        assert!(service.is_loaded());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn call_routes_to_the_described_endpoint() {
        let transport = Arc::new(
            CannedTransport::default()
                .with(DISCOVERY_URL, 200, &discovery())
                .with(
                    "http://test/_ah/api/todo/v1/todos",
                    200,
                    r#"{"items":[{"id":"1","title":"a","completed":false}]}"#,
                )
                .with("http://test/_ah/api/todo/v1/todo/1", 200, r#"{"id":"1","title":"a","completed":true}"#),
        );
        let service = EndpointService::new("http://test", transport.clone());
        service.load_service("todo", "v1").await.unwrap();

        let list: TodoList = service.call_as("listTodos", json!({})).await.unwrap();
        assert_eq!(list.items.len(), 1);

        let toggled = service.call("toggleTodo", json!({"id": "1"})).await.unwrap();
        assert_eq!(toggled["completed"], true);

        let requests = transport.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.method, crate::http::HttpMethod::Post);
        assert_eq!(last.path, "http://test/_ah/api/todo/v1/todo/1");
    }

    #[tokio::test]
    async fn unknown_operation_after_load() {
        let transport = CannedTransport::default().with(DISCOVERY_URL, 200, &discovery());
        let service = EndpointService::new("http://test", Arc::new(transport));
        service.load_service("todo", "v1").await.unwrap();
        let err = service.call("archiveTodo", Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::UnknownOperation(name) if name == "archiveTodo"));
    }
}
