//! Endpoint registry and dispatcher.
//!
//! The [`EndpointRegistry`] maps endpoint names to handlers. [`dispatch`]
//! runs the handler named by an inbound request and turns the outcome into
//! a reply packet.

use crate::addressing::ANYONE;
use crate::node::Node;
use crate::packet::{Body, Packet};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use swarmcall_types::error::EndpointError;
use tracing::{debug, info, warn};

/// A named capability a node performs on behalf of a request.
///
/// Argument validation is the handler's own business: the body arrives
/// exactly as the caller sent it.
#[async_trait]
pub trait EndpointHandler: Send + Sync + 'static {
    /// Human-readable description, reported by `endpoint-info`.
    fn description(&self) -> &str {
        ""
    }

    /// Run the endpoint against a request body.
    async fn handle(&self, node: &Node, body: Body) -> Result<Body, EndpointError>;
}

/// Thread-safe name → handler map.
pub struct EndpointRegistry {
    endpoints: RwLock<HashMap<String, Arc<dyn EndpointHandler>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self {
            endpoints: RwLock::new(HashMap::new()),
        }
    }

    /// Register `handler` under `name`. The last registration wins; the
    /// replaced handler, if any, is returned.
    pub fn register(
        &self,
        name: &str,
        handler: Arc<dyn EndpointHandler>,
    ) -> Option<Arc<dyn EndpointHandler>> {
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());
        let previous = endpoints.insert(name.to_string(), handler);
        if previous.is_some() {
            info!(endpoint = %name, "Replacing endpoint");
        } else {
            info!(endpoint = %name, "Registering endpoint");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn EndpointHandler>> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints.contains_key(name)
    }

    /// Registered endpoint names, sorted.
    pub fn names(&self) -> Vec<String> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = endpoints.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reply body for an endpoint this node does not have.
pub fn bad_endpoint_body(node: &Node, endpoint: &str) -> Body {
    handler_error_body(node, EndpointError::bad_endpoint(endpoint, node.node_id()))
}

/// Reply body for a handler failure.
pub fn handler_error_body(node: &Node, err: EndpointError) -> Body {
    let mut body = Body::new();
    body.insert("error".into(), Value::String(err.message));
    body.insert("error_type".into(), Value::String(err.kind));
    body.insert("hostname".into(), Value::String(node.hostname().to_string()));
    body.insert("node".into(), Value::String(node.node_id().to_string()));
    body
}

/// Run the endpoint named by `request` and build the reply.
///
/// Returns `None` only when the endpoint is unknown and the request was
/// addressed to [`ANYONE`]: a node that cannot help stays silent.
pub async fn dispatch(node: &Node, request: &Packet) -> Option<Packet> {
    let Some(handler) = node.endpoints().get(request.endpoint()) else {
        if request.dst() == ANYONE {
            debug!(
                endpoint = %request.endpoint(),
                src = %request.src(),
                "Ignoring any-responder request for unsupported endpoint"
            );
            return None;
        }
        debug!(
            endpoint = %request.endpoint(),
            src = %request.src(),
            "Rejecting request for unknown endpoint"
        );
        let body = bad_endpoint_body(node, request.endpoint());
        return Some(Packet::reply(node.node_id(), request, body));
    };

    debug!(
        "[{}] [{} -> {}]",
        request.endpoint(),
        request.src(),
        request.dst()
    );
    let outcome = AssertUnwindSafe(handler.handle(node, request.body().clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            let detail = panic_detail(payload.as_ref());
            warn!(
                endpoint = %request.endpoint(),
                src = %request.src(),
                panic = %detail,
                "Endpoint handler panicked"
            );
            Err(EndpointError::handler_panic(request.endpoint(), &detail))
        });
    let body = match outcome {
        Ok(result) => result,
        Err(e) => {
            debug!(endpoint = %request.endpoint(), error = %e, "Endpoint failed");
            handler_error_body(node, e)
        }
    };
    Some(Packet::reply(node.node_id(), request, body))
}

/// Text of a panic payload, when it carries one.
fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
