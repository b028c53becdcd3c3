//! Typed invokers built from a discovery document.
//!
//! # Design
//! Every resource/method pair of a discovery document becomes one
//! `Operation`, keyed `{method}{Resource}` (`list` on `todos` is
//! `listTodos`). An `Operation` is a plain value: `build_request` turns JSON
//! arguments into an `HttpRequest`, `parse_response` turns the reply into
//! JSON. The `OperationRegistry` is the table the service dispatches through.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use url::Url;

use crate::discovery::{DiscoveryDocument, MethodSpec, ParameterLocation, ParameterSpec, API_ROOT};
use crate::error::ApiError;
use crate::http::{check_status, HttpMethod, HttpRequest, HttpResponse};
use crate::types::ApiDescriptor;

/// `{method}{Resource}`, with the resource's first character upper-cased.
pub fn operation_name(method: &str, resource: &str) -> String {
    let mut chars = resource.chars();
    match chars.next() {
        Some(first) => format!("{method}{}{}", first.to_uppercase(), chars.as_str()),
        None => method.to_string(),
    }
}

/// Root URL every operation path of `api` is resolved against.
///
/// `{base}/_ah/api/{servicePath}`, where `servicePath` falls back to
/// `{api}/{version}/` when the document does not carry one.
pub fn service_root(base_url: &str, api: &ApiDescriptor, service_path: Option<&str>) -> Result<Url, ApiError> {
    let root = Url::parse(&format!("{}/{API_ROOT}/", base_url.trim_end_matches('/')))?;
    let service_path = match service_path {
        Some(path) => path.trim_start_matches('/').to_string(),
        None => format!("{}/{}/", api.name, api.version),
    };
    Ok(root.join(&service_path)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub api: ApiDescriptor,
    pub resource: String,
    pub method: String,
    pub http_method: HttpMethod,
    /// Path template relative to the service root, e.g. `todo/{id}`.
    pub path: String,
    pub parameters: BTreeMap<String, ParameterSpec>,
    root: Url,
}

impl Operation {
    pub fn from_spec(
        root: &Url,
        api: &ApiDescriptor,
        resource: &str,
        method: &str,
        spec: &MethodSpec,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            name: operation_name(method, resource),
            api: api.clone(),
            resource: resource.to_string(),
            method: method.to_string(),
            http_method: spec.http_method.parse()?,
            path: spec.path.clone(),
            parameters: spec.parameters.clone(),
            root: root.clone(),
        })
    }

    /// Build the request for one invocation.
    ///
    /// `args` must be a JSON object (or null). Path parameters are taken out
    /// of it first, then declared query parameters. What remains becomes the
    /// JSON body for methods that carry one and extra query parameters for
    /// those that don't.
    pub fn build_request(&self, args: &Value) -> Result<HttpRequest, ApiError> {
        let mut args = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(ApiError::Serialization(format!(
                    "arguments to `{}` must be a JSON object, got {other}",
                    self.name
                )))
            }
        };

        let mut url = self.root.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty();
            for segment in self.path.split('/').filter(|s| !s.is_empty()) {
                match template_parameter(segment) {
                    Some(name) => {
                        let value = args
                            .remove(name)
                            .filter(|value| !is_blank(value))
                            .ok_or_else(|| self.missing(name))?;
                        segments.push(&scalar(&value));
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }

        let mut query: Vec<(String, String)> = Vec::new();
        for (name, spec) in &self.parameters {
            if spec.location != ParameterLocation::Query {
                continue;
            }
            match args.remove(name) {
                Some(value) => push_query(&mut query, name, &value),
                None if spec.required => return Err(self.missing(name)),
                None => {}
            }
        }

        let body = if self.http_method.has_body() {
            Some(serde_json::to_string(&Value::Object(args)).map_err(|e| ApiError::Serialization(e.to_string()))?)
        } else {
            for (name, value) in &args {
                push_query(&mut query, name, value);
            }
            None
        };

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        Ok(match body {
            Some(body) => HttpRequest::json(self.http_method, url.to_string(), body),
            None => HttpRequest {
                method: self.http_method,
                path: url.to_string(),
                headers: Vec::new(),
                body: None,
            },
        })
    }

    /// Any 2xx resolves to the JSON body; an empty body resolves to `{}`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    fn missing(&self, parameter: &str) -> ApiError {
        ApiError::MissingParameter {
            operation: self.name.clone(),
            parameter: parameter.to_string(),
        }
    }
}

fn template_parameter(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// A blank path value would collapse the path onto the parent collection.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn push_query(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(values) => {
            for v in values {
                query.push((name.to_string(), scalar(v)));
            }
        }
        other => query.push((name.to_string(), scalar(other))),
    }
}

/// Operations registered for one or more APIs, keyed by operation name.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: BTreeMap<String, Operation>,
}

impl OperationRegistry {
    /// One operation per method of every resource in `doc`.
    pub fn from_discovery(base_url: &str, api: &ApiDescriptor, doc: &DiscoveryDocument) -> Result<Self, ApiError> {
        let root = service_root(base_url, api, doc.service_path.as_deref())?;
        let mut operations = BTreeMap::new();
        for (resource, spec) in &doc.resources {
            for (method, method_spec) in &spec.methods {
                let operation = Operation::from_spec(&root, api, resource, method, method_spec)?;
                operations.insert(operation.name.clone(), operation);
            }
        }
        Ok(Self { operations })
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Later registrations replace earlier ones with the same name.
    pub fn extend(&mut self, other: OperationRegistry) {
        self.operations.extend(other.operations);
    }
}
