//! Node: one participant on the shared channel.
//!
//! A [`Node`] owns its identity, endpoint registry, packet buffer and (once
//! bound) a [`Transport`]. Inbound text enters through
//! [`Node::on_transport_message`]; outbound calls go through [`Node::call`].
//!
//! ```text
//! inbound text ─▶ parse ─▶ buffer ─▶ should_process ─▶ dispatch ─▶ publish reply
//! call ─▶ publish request ─▶ scan buffer for backlinks ─▶ replies
//! ```

use crate::addressing::should_process;
use crate::buffer::PacketBuffer;
use crate::builtin::register_builtins;
use crate::correlator::{send_and_collect, CallOptions};
use crate::endpoint::{dispatch, EndpointHandler, EndpointRegistry};
use crate::names::random_name;
use crate::packet::{Body, Packet};
use crate::transport::Transport;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use swarmcall_types::config::NodeConfig;
use swarmcall_types::error::{SwarmError, SwarmResult};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Transport binding state. `Unbound → Bound` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unbound,
    Bound,
}

pub struct Node {
    node_id: String,
    instance_id: Uuid,
    hostname: String,
    started_at: Instant,
    config: NodeConfig,
    endpoints: EndpointRegistry,
    buffer: PacketBuffer,
    transport: OnceLock<Arc<dyn Transport>>,
    /// Serializes inbound processing.
    inbound: tokio::sync::Mutex<()>,
}

impl Node {
    /// Create an unbound node with the built-in endpoints registered.
    pub fn new(config: NodeConfig) -> SwarmResult<Self> {
        config.validate()?;
        let node_id = config.node_id.clone().unwrap_or_else(random_name);
        let hostname =
            hostname::get().map_or_else(|_| "unknown".into(), |h| h.to_string_lossy().to_string());

        let node = Self {
            node_id,
            instance_id: Uuid::new_v4(),
            hostname,
            started_at: Instant::now(),
            buffer: PacketBuffer::new(config.retention()),
            config,
            endpoints: EndpointRegistry::new(),
            transport: OnceLock::new(),
            inbound: tokio::sync::Mutex::new(()),
        };
        register_builtins(&node.endpoints);
        Ok(node)
    }

    /// Shorthand for a default-configured node with identity `node_id`.
    pub fn with_id(node_id: &str) -> SwarmResult<Self> {
        Self::new(NodeConfig {
            node_id: Some(node_id.to_string()),
            ..Default::default()
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Random id distinguishing this process instance from a restarted one.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    pub fn buffer(&self) -> &PacketBuffer {
        &self.buffer
    }

    pub fn state(&self) -> NodeState {
        if self.transport.get().is_some() {
            NodeState::Bound
        } else {
            NodeState::Unbound
        }
    }

    /// Attach the transport. Only the first call succeeds.
    pub fn bind(&self, transport: Arc<dyn Transport>) -> SwarmResult<()> {
        let name = transport.name().to_string();
        self.transport
            .set(transport)
            .map_err(|_| SwarmError::AlreadyBound(self.node_id.clone()))?;
        info!(node_id = %self.node_id, transport = %name, "Node bound to transport");
        Ok(())
    }

    /// Add or replace an endpoint.
    pub fn register_endpoint(&self, name: &str, handler: Arc<dyn EndpointHandler>) {
        self.endpoints.register(name, handler);
    }

    /// Serialize `packet` and hand it to the transport.
    pub async fn publish(&self, packet: &Packet) -> SwarmResult<()> {
        let transport = self.transport.get().ok_or(SwarmError::NotBound)?;
        let text = packet.to_wire()?;
        transport.publish(&text).await
    }

    /// Call `endpoint` on `dst` with the default reply policy.
    pub async fn call(&self, dst: &str, endpoint: &str, body: Body) -> SwarmResult<Vec<Packet>> {
        let options = CallOptions::for_destination(dst, &self.config);
        self.call_with(dst, endpoint, body, options).await
    }

    /// Call `endpoint` on `dst`, waiting per `options`.
    pub async fn call_with(
        &self,
        dst: &str,
        endpoint: &str,
        body: Body,
        options: CallOptions,
    ) -> SwarmResult<Vec<Packet>> {
        if endpoint.is_empty() {
            return Err(SwarmError::InvalidRequest("endpoint name is empty".into()));
        }
        if dst.is_empty() {
            return Err(SwarmError::InvalidRequest("destination is empty".into()));
        }
        let request = Packet::request(&self.node_id, dst, endpoint, body);
        debug!(
            request_id = %request.id(),
            dst = %dst,
            endpoint = %endpoint,
            "Calling endpoint"
        );
        send_and_collect(self, request, options).await
    }

    /// Handle one message from the shared channel.
    ///
    /// Every packet is buffered, replies included. Requests this node should
    /// answer are dispatched and the reply published. Nothing here fails the
    /// caller: bad input is dropped and publish errors are logged.
    pub async fn on_transport_message(&self, text: &str) {
        let _guard = self.inbound.lock().await;

        let Some(packet) = Packet::parse(text) else {
            trace!(node_id = %self.node_id, "Ignoring non-packet message");
            return;
        };

        self.buffer.append(packet.clone());

        if !should_process(&self.node_id, &packet) {
            return;
        }

        let Some(reply) = dispatch(self, &packet).await else {
            return;
        };
        if let Err(e) = self.publish(&reply).await {
            warn!(
                node_id = %self.node_id,
                request_id = %packet.id(),
                error = %e,
                "Failed to publish reply"
            );
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("node_id", &self.node_id)
            .field("instance_id", &self.instance_id)
            .field("state", &self.state())
            .field("endpoints", &self.endpoints.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::{ANYONE, EVERYONE};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records published text and echoes it back into the node, like a
    /// channel with self-delivery and no other members.
    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<Packet> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|t| Packet::parse(t))
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        async fn publish(&self, text: &str) -> SwarmResult<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        fn name(&self) -> &str {
            "failing"
        }

        async fn publish(&self, _text: &str) -> SwarmResult<()> {
            Err(SwarmError::Transport("channel unreachable".into()))
        }
    }

    fn bound(id: &str) -> (Node, Arc<RecordingTransport>) {
        let node = Node::with_id(id).unwrap();
        let transport = RecordingTransport::new();
        node.bind(transport.clone()).unwrap();
        (node, transport)
    }

    fn wire(p: &Packet) -> String {
        p.to_wire().unwrap()
    }

    #[test]
    fn test_generated_identity() {
        let node = Node::new(NodeConfig::default()).unwrap();
        assert!(node.node_id().contains('-'));
        assert_eq!(node.state(), NodeState::Unbound);
        assert!(node.endpoints().contains("ping"));
        assert!(node.endpoints().contains("endpoint-info"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NodeConfig {
            retention_secs: 1,
            ..Default::default()
        };
        assert!(matches!(Node::new(config), Err(SwarmError::Config(_))));
    }

    #[test]
    fn test_bind_is_one_way() {
        let (node, _) = bound("alpha");
        assert_eq!(node.state(), NodeState::Bound);
        let err = node.bind(RecordingTransport::new()).unwrap_err();
        assert!(matches!(err, SwarmError::AlreadyBound(id) if id == "alpha"));
    }

    #[tokio::test]
    async fn test_publish_unbound_fails() {
        let node = Node::with_id("alpha").unwrap();
        let p = Packet::request("alpha", "beta", "ping", Body::new());
        let err = node.publish(&p).await.unwrap_err();
        assert!(matches!(err, SwarmError::NotBound));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_call_propagates_transport_failure() {
        let node = Node::with_id("alpha").unwrap();
        node.bind(Arc::new(FailingTransport)).unwrap();
        let err = node.call("beta", "ping", Body::new()).await.unwrap_err();
        assert!(matches!(err, SwarmError::Transport(_)));
    }

    #[tokio::test]
    async fn test_call_rejects_empty_endpoint() {
        let (node, transport) = bound("alpha");
        let err = node.call("beta", "", Body::new()).await.unwrap_err();
        assert!(matches!(err, SwarmError::InvalidRequest(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_inbound_request_is_answered() {
        let (beta, transport) = bound("beta");
        let req = Packet::request("alpha", "beta", "ping", Body::new());
        beta.on_transport_message(&wire(&req)).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].backlink(), req.id());
        assert_eq!(sent[0].dst(), "alpha");
        assert_eq!(sent[0].body()["node"], "beta");
        assert_eq!(beta.buffer().len(), 1);
    }

    #[tokio::test]
    async fn test_inbound_reply_is_buffered_not_dispatched() {
        let (alpha, transport) = bound("alpha");
        let req = Packet::request("alpha", "beta", "ping", Body::new());
        let reply = Packet::reply("beta", &req, Body::new());
        alpha.on_transport_message(&wire(&reply)).await;

        assert!(transport.sent().is_empty());
        assert_eq!(alpha.buffer().len(), 1);
    }

    #[tokio::test]
    async fn test_own_anyone_request_not_answered() {
        let (alpha, transport) = bound("alpha");
        let req = Packet::request("alpha", ANYONE, "ping", Body::new());
        alpha.on_transport_message(&wire(&req)).await;
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_broadcast_is_answered() {
        let (alpha, transport) = bound("alpha");
        let req = Packet::request("alpha", EVERYONE, "ping", Body::new());
        alpha.on_transport_message(&wire(&req)).await;
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].backlink(), req.id());
    }

    #[tokio::test]
    async fn test_request_for_someone_else_ignored() {
        let (gamma, transport) = bound("gamma");
        let req = Packet::request("alpha", "beta", "ping", Body::new());
        gamma.on_transport_message(&wire(&req)).await;
        assert!(transport.sent().is_empty());
        assert_eq!(gamma.buffer().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_traffic_ignored() {
        let (alpha, transport) = bound("alpha");
        alpha.on_transport_message("anyone up for lunch?").await;
        alpha.on_transport_message("{not json").await;
        assert!(transport.sent().is_empty());
        assert!(alpha.buffer().is_empty());
    }

    #[tokio::test]
    async fn test_reply_publish_failure_is_contained() {
        let beta = Node::with_id("beta").unwrap();
        beta.bind(Arc::new(FailingTransport)).unwrap();
        let req = Packet::request("alpha", "beta", "ping", Body::new());
        beta.on_transport_message(&wire(&req)).await;
        beta.on_transport_message(&wire(&req)).await;
        assert_eq!(beta.buffer().len(), 2);
    }
}
