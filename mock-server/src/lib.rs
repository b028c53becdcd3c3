use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_NAME: &str = "todo";
pub const API_VERSION: &str = "v1";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub items: Vec<Todo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Deserialize)]
pub struct InsertTodo {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<usize>,
    pub order: Option<String>,
    pub page_token: Option<String>,
}

/// Items in insertion order.
pub type Db = Arc<RwLock<Vec<Todo>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/_ah/api/discovery/v1/apis/{api}/{version}/rest", get(discovery))
        .route("/_ah/api/todo/v1/todos", get(list_todos))
        .route("/_ah/api/todo/v1/todo", post(insert_todo))
        .route("/_ah/api/todo/v1/todo/{id}", post(toggle_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Discovery document for the todo API, in the shape Endpoints serves.
pub fn discovery_document() -> Value {
    let id_param = json!({"id": {"type": "string", "location": "path", "required": true}});
    json!({
        "kind": "discovery#restDescription",
        "discoveryVersion": "v1",
        "name": API_NAME,
        "version": API_VERSION,
        "description": "TODO API",
        "protocol": "rest",
        "servicePath": "todo/v1/",
        "resources": {
            "todo": {
                "methods": {
                    "insert": {
                        "id": "todo.todo.insert",
                        "path": "todo",
                        "httpMethod": "POST",
                        "request": {"$ref": "TodoModel"},
                        "response": {"$ref": "TodoModel"}
                    },
                    "delete": {
                        "id": "todo.todo.delete",
                        "path": "todo/{id}",
                        "httpMethod": "DELETE",
                        "parameters": id_param,
                        "parameterOrder": ["id"],
                        "response": {"$ref": "TodoModel"}
                    },
                    "toggle": {
                        "id": "todo.todo.toggle",
                        "path": "todo/{id}",
                        "httpMethod": "POST",
                        "parameters": id_param,
                        "parameterOrder": ["id"],
                        "response": {"$ref": "TodoModel"}
                    }
                }
            },
            "todos": {
                "methods": {
                    "list": {
                        "id": "todo.todos.list",
                        "path": "todos",
                        "httpMethod": "GET",
                        "parameters": {
                            "limit": {"type": "integer", "format": "int32", "location": "query"},
                            "order": {"type": "string", "location": "query"},
                            "pageToken": {"type": "string", "location": "query"}
                        },
                        "response": {"$ref": "TodoModelCollection"}
                    }
                }
            }
        },
        "schemas": {
            "TodoModel": {
                "id": "TodoModel",
                "type": "object",
                "properties": {
                    "id": {"type": "string"},
                    "title": {"type": "string"},
                    "completed": {"type": "boolean"}
                }
            },
            "TodoModelCollection": {
                "id": "TodoModelCollection",
                "type": "object",
                "properties": {
                    "items": {"type": "array", "items": {"$ref": "TodoModel"}},
                    "nextPageToken": {"type": "string"}
                }
            }
        }
    })
}

async fn discovery(Path((api, version)): Path<(String, String)>) -> Result<Json<Value>, StatusCode> {
    if api == API_NAME && version == API_VERSION {
        Ok(Json(discovery_document()))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn list_todos(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Result<Json<TodoList>, StatusCode> {
    // A zero-sized page never advances the page token.
    if params.limit == Some(0) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut items = db.read().await.clone();
    match params.order.as_deref() {
        None => {}
        Some("title") => items.sort_by(|a, b| a.title.cmp(&b.title)),
        Some("-title") => items.sort_by(|a, b| b.title.cmp(&a.title)),
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    }

    let offset = match params.page_token.as_deref() {
        None => 0,
        Some(token) => token.parse::<usize>().map_err(|_| StatusCode::BAD_REQUEST)?,
    };
    let remaining: Vec<Todo> = items.into_iter().skip(offset).collect();
    let (items, next_page_token) = match params.limit {
        Some(limit) if remaining.len() > limit => {
            let page = remaining.into_iter().take(limit).collect();
            (page, Some((offset + limit).to_string()))
        }
        _ => (remaining, None),
    };
    Ok(Json(TodoList { items, next_page_token }))
}

async fn insert_todo(State(db): State<Db>, Json(input): Json<InsertTodo>) -> Json<Todo> {
    let todo = Todo {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        completed: false,
    };
    tracing::info!(id = %todo.id, title = %todo.title, "todo inserted");
    db.write().await.push(todo.clone());
    Json(todo)
}

async fn toggle_todo(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Todo>, StatusCode> {
    let mut todos = db.write().await;
    let todo = todos.iter_mut().find(|t| t.id == id).ok_or(StatusCode::NOT_FOUND)?;
    todo.completed = !todo.completed;
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Todo>, StatusCode> {
    let mut todos = db.write().await;
    let index = todos.iter().position(|t| t.id == id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(todos.remove(index)))
}
