//! Domain DTOs for the todo API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! integration tests catch drift between the two crates. Field names follow
//! the wire format (`nextPageToken`), hence the serde renames.

use serde::{Deserialize, Serialize};

/// A single todo item as last returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// Response of the `list` method. An empty collection may omit `items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    #[serde(default)]
    pub items: Vec<TodoItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Request payload for `insert`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertTodo {
    pub title: String,
}

/// Optional query fields of `list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Identifies which remote API to bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiDescriptor {
    pub name: String,
    pub version: String,
}

impl ApiDescriptor {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl std::fmt::Display for ApiDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_may_omit_items() {
        let list: TodoList = serde_json::from_str("{}").unwrap();
        assert!(list.items.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn list_reads_camel_case_page_token() {
        let list: TodoList = serde_json::from_str(
            r#"{"items":[{"id":"1","title":"a","completed":true}],"nextPageToken":"1"}"#,
        )
        .unwrap();
        assert_eq!(list.items.len(), 1);
        assert!(list.items[0].completed);
        assert_eq!(list.next_page_token.as_deref(), Some("1"));
    }

    #[test]
    fn item_without_completed_defaults_to_false() {
        let item: TodoItem = serde_json::from_str(r#"{"id":"7","title":"x"}"#).unwrap();
        assert!(!item.completed);
    }

    #[test]
    fn list_query_skips_unset_fields() {
        let query = ListQuery {
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&query).unwrap(), serde_json::json!({"limit": 5}));
    }

    #[test]
    fn descriptor_displays_as_name_slash_version() {
        assert_eq!(ApiDescriptor::new("todo", "v1").to_string(), "todo/v1");
    }
}
