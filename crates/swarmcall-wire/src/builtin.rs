//! Endpoints every node exposes.

use crate::endpoint::{EndpointHandler, EndpointRegistry};
use crate::node::Node;
use crate::packet::Body;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use swarmcall_types::error::EndpointError;

pub const PING: &str = "ping";
pub const ENDPOINT_INFO: &str = "endpoint-info";
pub const ADD: &str = "add";

/// Register the built-in endpoints on `registry`.
pub fn register_builtins(registry: &EndpointRegistry) {
    registry.register(PING, Arc::new(Ping));
    registry.register(ENDPOINT_INFO, Arc::new(EndpointInfo));
    registry.register(ADD, Arc::new(Add));
}

fn into_body(value: Value) -> Body {
    match value {
        Value::Object(map) => map,
        _ => Body::new(),
    }
}

/// Node identity and capabilities.
pub struct Ping;

#[async_trait]
impl EndpointHandler for Ping {
    fn description(&self) -> &str {
        "args: none\nreturns: node identity, instance, pid, hostname, uptime and endpoint names"
    }

    async fn handle(&self, node: &Node, _body: Body) -> Result<Body, EndpointError> {
        Ok(into_body(json!({
            "node": node.node_id(),
            "instance": node.instance_id().to_string(),
            "pid": std::process::id(),
            "hostname": node.hostname(),
            "uptime_secs": node.uptime().as_secs(),
            "endpoints": node.endpoints().names(),
        })))
    }
}

/// Describe another endpoint on this node.
pub struct EndpointInfo;

#[async_trait]
impl EndpointHandler for EndpointInfo {
    fn description(&self) -> &str {
        "args: name\nreturns: the endpoint's name and description"
    }

    async fn handle(&self, node: &Node, body: Body) -> Result<Body, EndpointError> {
        let name = match body.get("name") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(EndpointError::invalid_argument(
                    "name",
                    format!("expected a string, got {other}"),
                ))
            }
            None => return Err(EndpointError::missing_argument("name")),
        };
        let handler = node
            .endpoints()
            .get(name)
            .ok_or_else(|| EndpointError::bad_endpoint(name, node.node_id()))?;
        let description = handler.description();
        let doc: Vec<&str> = description
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        Ok(into_body(json!({
            "endpoint": name,
            "description": description,
            "doc": doc,
        })))
    }
}

/// Sum of `x`, `y` and `z`.
pub struct Add;

fn number_arg(body: &Body, name: &str) -> Result<f64, EndpointError> {
    match body.get(name) {
        None => Err(EndpointError::missing_argument(name)),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| EndpointError::invalid_argument(name, "not representable as f64")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| EndpointError::invalid_argument(name, e)),
        Some(other) => Err(EndpointError::invalid_argument(
            name,
            format!("expected a number, got {other}"),
        )),
    }
}

#[async_trait]
impl EndpointHandler for Add {
    fn description(&self) -> &str {
        "args: x, y, z\nreturns: x + y + z"
    }

    async fn handle(&self, _node: &Node, body: Body) -> Result<Body, EndpointError> {
        let x = number_arg(&body, "x")?;
        let y = number_arg(&body, "y")?;
        let z = number_arg(&body, "z")?;
        Ok(into_body(json!({ "result": x + y + z })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmcall_types::config::NodeConfig;

    fn node() -> Node {
        Node::new(NodeConfig {
            node_id: Some("beta".into()),
            ..Default::default()
        })
        .unwrap()
    }

    fn args(value: Value) -> Body {
        into_body(value)
    }

    #[tokio::test]
    async fn test_ping_reports_identity() {
        let node = node();
        let body = Ping.handle(&node, Body::new()).await.unwrap();
        assert_eq!(body["node"], "beta");
        assert_eq!(body["pid"], std::process::id());
        assert_eq!(body["instance"], node.instance_id().to_string());
        let endpoints = body["endpoints"].as_array().unwrap();
        assert_eq!(endpoints, &vec![json!("add"), json!("endpoint-info"), json!("ping")]);
    }

    #[tokio::test]
    async fn test_endpoint_info() {
        let node = node();
        let body = EndpointInfo
            .handle(&node, args(json!({"name": "add"})))
            .await
            .unwrap();
        assert_eq!(body["endpoint"], "add");
        assert_eq!(body["doc"], json!(["args: x, y, z", "returns: x + y + z"]));
    }

    #[tokio::test]
    async fn test_endpoint_info_unknown() {
        let node = node();
        let err = EndpointInfo
            .handle(&node, args(json!({"name": "camera"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "BadEndpoint");
        assert!(err.message.contains("camera"));
        assert!(err.message.contains("beta"));
    }

    #[tokio::test]
    async fn test_endpoint_info_bad_argument() {
        let node = node();
        let err = EndpointInfo.handle(&node, Body::new()).await.unwrap_err();
        assert_eq!(err.kind, "MissingArgument");
        let err = EndpointInfo
            .handle(&node, args(json!({"name": 7})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "InvalidArgument");
    }

    #[tokio::test]
    async fn test_add_accepts_numbers_and_strings() {
        let node = node();
        let body = Add
            .handle(&node, args(json!({"x": 1, "y": "2.5", "z": -0.5})))
            .await
            .unwrap();
        assert_eq!(body["result"], json!(3.0));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let node = node();
        let err = Add
            .handle(&node, args(json!({"x": 1, "y": 2})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "MissingArgument");
        let err = Add
            .handle(&node, args(json!({"x": 1, "y": 2, "z": "three"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "InvalidArgument");
    }
}
