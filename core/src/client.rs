//! Hand-written request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` is the fixed counterpart of the discovery-built operations:
//! the same four endpoints at paths known ahead of time. It holds only the
//! service root and carries no mutable state between calls. Each operation
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`; the caller executes the
//! round-trip in between.

use url::Url;

use crate::error::ApiError;
use crate::http::{check_status, HttpMethod, HttpRequest, HttpResponse};
use crate::operation::service_root;
use crate::types::{ApiDescriptor, InsertTodo, ListQuery, TodoItem, TodoList};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    root: Url,
}

impl TodoClient {
    /// Client for the `todo/v1` API served under `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            root: service_root(base_url, &ApiDescriptor::new("todo", "v1"), None)?,
        })
    }

    pub fn build_list_todos(&self, query: &ListQuery) -> Result<HttpRequest, ApiError> {
        let mut url = self.url(&["todos"])?;
        let mut pairs = Vec::new();
        if let Some(limit) = query.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(order) = &query.order {
            pairs.push(("order", order.clone()));
        }
        if let Some(token) = &query.page_token {
            pairs.push(("pageToken", token.clone()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(HttpRequest::get(url.to_string()))
    }

    pub fn build_insert_todo(&self, input: &InsertTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::json(HttpMethod::Post, self.url(&["todo"])?.to_string(), body))
    }

    pub fn build_toggle_todo(&self, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Post,
            self.item_url("toggleTodo", id)?.to_string(),
            "{}".to_string(),
        ))
    }

    pub fn build_delete_todo(&self, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_url("deleteTodo", id)?.to_string(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<TodoList, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_insert_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_toggle_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// The server echoes the deleted item; it is not needed.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)?;
        Ok(())
    }

    /// `todo/{id}`; an empty id would address the collection instead.
    fn item_url(&self, operation: &str, id: &str) -> Result<Url, ApiError> {
        if id.is_empty() {
            return Err(ApiError::MissingParameter {
                operation: operation.to_string(),
                parameter: "id".to_string(),
            });
        }
        self.url(&["todo", id])
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TodoClient {
        TodoClient::new("http://localhost:3000").unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_list_todos_produces_correct_request() {
        let req = client().build_list_todos(&ListQuery::default()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/_ah/api/todo/v1/todos");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_list_todos_with_query() {
        let query = ListQuery {
            limit: Some(10),
            order: Some("-title".to_string()),
            page_token: None,
        };
        let req = client().build_list_todos(&query).unwrap();
        assert_eq!(req.path, "http://localhost:3000/_ah/api/todo/v1/todos?limit=10&order=-title");
    }

    #[test]
    fn build_insert_todo_produces_correct_request() {
        let input = InsertTodo {
            title: "Buy milk".to_string(),
        };
        let req = client().build_insert_todo(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/_ah/api/todo/v1/todo");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Buy milk");
    }

    #[test]
    fn build_toggle_todo_posts_to_item_path() {
        let req = client().build_toggle_todo("5").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/_ah/api/todo/v1/todo/5");
    }

    #[test]
    fn build_delete_todo_produces_correct_request() {
        let req = client().build_delete_todo("5").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/_ah/api/todo/v1/todo/5");
        assert!(req.body.is_none());
    }

    #[test]
    fn empty_id_is_a_missing_parameter() {
        let err = client().build_toggle_todo("").unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter { ref operation, .. } if operation == "toggleTodo"));
        let err = client().build_delete_todo("").unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter { ref operation, .. } if operation == "deleteTodo"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TodoClient::new("http://localhost:3000/").unwrap();
        let req = client.build_delete_todo("1").unwrap();
        assert_eq!(req.path, "http://localhost:3000/_ah/api/todo/v1/todo/1");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(TodoClient::new("not a url"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn parse_list_todos_keeps_server_order() {
        let list = client()
            .parse_list_todos(response(
                200,
                r#"{"items":[{"id":"2","title":"b","completed":false},{"id":"1","title":"a","completed":true}]}"#,
            ))
            .unwrap();
        let ids: Vec<&str> = list.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn parse_list_todos_bad_json() {
        let err = client().parse_list_todos(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_insert_todo_success() {
        let todo = client()
            .parse_insert_todo(response(200, r#"{"id":"1","title":"New","completed":false}"#))
            .unwrap();
        assert_eq!(todo.title, "New");
    }

    #[test]
    fn parse_insert_todo_wrong_status() {
        let err = client().parse_insert_todo(response(500, "internal error")).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn parse_toggle_todo_success() {
        let todo = client()
            .parse_toggle_todo(response(200, r#"{"id":"1","title":"x","completed":true}"#))
            .unwrap();
        assert!(todo.completed);
    }

    #[test]
    fn parse_delete_todo_not_found() {
        let err = client().parse_delete_todo(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
