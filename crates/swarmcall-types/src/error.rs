//! Shared error types for SwarmCall.

use thiserror::Error;

/// Top-level error type for node, transport and configuration failures.
///
/// Timeouts are deliberately absent: a call that collects fewer replies
/// than requested returns a short list instead of an error.
#[derive(Error, Debug)]
pub enum SwarmError {
    /// The transport refused or failed to publish a message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node has no transport attached yet.
    #[error("Node is not bound to a transport")]
    NotBound,

    /// The node was already bound to a transport.
    #[error("Node '{0}' is already bound to a transport")]
    AlreadyBound(String),

    /// Another node with the same identity is already on the channel.
    #[error("Duplicate node identity on channel: {0}")]
    DuplicateIdentity(String),

    /// A packet could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request was malformed before it reached the wire.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SwarmError {
    /// Whether this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, SwarmError::Transport(_) | SwarmError::NotBound)
    }
}

/// Alias for Result with SwarmError.
pub type SwarmResult<T> = Result<T, SwarmError>;

/// Failure raised by an endpoint handler.
///
/// The dispatcher turns this into a structured error reply carrying
/// `kind` as `error_type` and `message` as `error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct EndpointError {
    /// Error category, e.g. `InvalidArgument`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl EndpointError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// A required argument was absent from the request body.
    pub fn missing_argument(name: &str) -> Self {
        Self::new("MissingArgument", format!("missing argument '{name}'"))
    }

    /// An argument was present but unusable.
    pub fn invalid_argument(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::new("InvalidArgument", format!("invalid argument '{name}': {reason}"))
    }

    /// The named endpoint is not registered on `node`.
    pub fn bad_endpoint(endpoint: &str, node: &str) -> Self {
        Self::new(
            "BadEndpoint",
            format!("Endpoint {endpoint} not supported by node {node}"),
        )
    }

    /// The handler for `endpoint` panicked.
    pub fn handler_panic(endpoint: &str, detail: &str) -> Self {
        Self::new(
            "HandlerPanic",
            format!("Endpoint {endpoint} panicked: {detail}"),
        )
    }
}
