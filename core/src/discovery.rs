//! Discovery documents: the machine-readable description of an API's
//! resources and methods.
//!
//! Only the fields needed to build requests are modelled; everything else in
//! the document (schemas, auth, icons) is ignored by serde.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::{check_status, HttpRequest, HttpResponse};
use crate::types::ApiDescriptor;

/// Prefix under which the backend mounts every API and the discovery service.
pub const API_ROOT: &str = "_ah/api";

/// A parsed discovery document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Absolute root as advertised by the server. Not used for routing.
    #[serde(default)]
    pub root_url: Option<String>,
    /// Path of the API below [`API_ROOT`], e.g. `todo/v1/`.
    #[serde(default)]
    pub service_path: Option<String>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceSpec>,
}

impl DiscoveryDocument {
    /// Total number of methods across all resources.
    pub fn method_count(&self) -> usize {
        self.resources.values().map(|r| r.methods.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceSpec {
    #[serde(default)]
    pub methods: BTreeMap<String, MethodSpec>,
}

/// One callable method of a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MethodSpec {
    #[serde(default)]
    pub id: Option<String>,
    pub path: String,
    /// Endpoints methods declared without an explicit verb are POST.
    #[serde(default = "default_http_method")]
    pub http_method: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,
}

fn default_http_method() -> String {
    "POST".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterSpec {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

/// `GET {base}/_ah/api/discovery/v1/apis/{api}/{version}/rest`
pub fn build_discovery_request(base_url: &str, api: &ApiDescriptor) -> HttpRequest {
    HttpRequest::get(format!(
        "{}/{API_ROOT}/discovery/v1/apis/{}/{}/rest",
        base_url.trim_end_matches('/'),
        api.name,
        api.version
    ))
}

pub fn parse_discovery(response: HttpResponse) -> Result<DiscoveryDocument, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DiscoveryParse(e.to_string()))
}
