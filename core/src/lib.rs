//! Async client for a discovery-described todo API.
//!
//! # Overview
//! `EndpointService` fetches an API's discovery document and builds one
//! callable `Operation` per resource/method pair (`listTodos`,
//! `insertTodo`, ...). `TodoController` binds view state to those
//! operations, or to the hand-written `FixedTodoService`, and re-lists after
//! each mutation.
//!
//! # Design
//! - Request building and response parsing stay I/O free (`TodoClient`,
//!   `Operation`, `discovery`): they produce `HttpRequest` and consume
//!   `HttpResponse` values. A `Transport` does the round-trip.
//! - Session state is explicit: each `EndpointService` owns its operation
//!   table and loaded flag, each `TodoController` its view state.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod backend;
pub mod client;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod http;
pub mod logging;
pub mod operation;
pub mod service;
pub mod settings;
pub mod transport;
pub mod types;

pub use backend::{FixedTodoService, TodoBackend};
pub use client::TodoClient;
pub use controller::{ControllerConfig, TodoController, ViewState};
pub use discovery::DiscoveryDocument;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use logging::trace_init;
pub use operation::{Operation, OperationRegistry};
pub use service::EndpointService;
pub use settings::Settings;
pub use transport::{Transport, UreqTransport};
pub use types::{ApiDescriptor, InsertTodo, ListQuery, TodoItem, TodoList};
