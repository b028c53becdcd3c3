//! Error types for the endpoints client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the item
//! does not exist" from "the server returned an unexpected status." All other
//! non-2xx responses land in `Http` with the raw status and body.

/// Errors returned by the client, the discovery loader and the service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The discovery document was malformed or described something unusable.
    #[error("discovery document invalid: {0}")]
    DiscoveryParse(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No operation is registered under this key.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// A path parameter required by the operation was absent from the arguments.
    #[error("operation `{operation}` is missing parameter `{parameter}`")]
    MissingParameter { operation: String, parameter: String },

    /// An operation was invoked before any API finished loading.
    #[error("service not loaded")]
    NotLoaded,

    /// The base URL or a built URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Settings could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ApiError {
    /// Whether a read that failed with this error is worth repeating.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
