//! Transport adapters.
//!
//! A [`Transport`] is the publish side of a shared broadcast channel. The
//! receive side is the adapter's responsibility: it must feed every message
//! it observes, including the node's own, to [`Node::on_transport_message`].
//!
//! [`LoopbackBus`] is an in-process channel built on `tokio::sync::broadcast`.
//! It backs the CLI and the integration tests and serves as the reference for
//! adapters over real chat services.

use crate::node::Node;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use swarmcall_types::error::{SwarmError, SwarmResult};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Publish side of a broadcast channel shared by every node.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Short adapter name for logs.
    fn name(&self) -> &str;

    /// Hand one text message to the channel.
    ///
    /// Delivery is at-most-once. Failures are reported, not retried.
    async fn publish(&self, text: &str) -> SwarmResult<()>;
}

/// In-process broadcast channel with self-delivery.
#[derive(Clone)]
pub struct LoopbackBus {
    sender: broadcast::Sender<String>,
    members: Arc<Mutex<HashSet<String>>>,
}

impl LoopbackBus {
    /// Create a bus buffering up to `capacity` undelivered messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            members: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Attach `node` to the bus.
    ///
    /// Binds a [`LoopbackTransport`] to the node and spawns a task feeding
    /// every bus message into it. Fails if a node with the same identity is
    /// already attached or if the node is already bound.
    ///
    /// The task only holds a weak reference: once the caller drops its last
    /// `Arc<Node>` the task exits at the next message and the identity is
    /// released. Aborting the returned handle stops delivery to the node at once.
    pub fn connect(&self, node: Arc<Node>) -> SwarmResult<JoinHandle<()>> {
        let node_id = node.node_id().to_string();
        {
            let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
            if !members.insert(node_id.clone()) {
                return Err(SwarmError::DuplicateIdentity(node_id));
            }
        }

        // Subscribe before binding so the node sees its own first publish.
        let mut rx = self.sender.subscribe();
        let transport = Arc::new(LoopbackTransport {
            sender: self.sender.clone(),
        });
        if let Err(e) = node.bind(transport) {
            self.release(&node_id);
            return Err(e);
        }
        info!(node_id = %node_id, "Joined loopback bus");

        let node = Arc::downgrade(&node);
        let members = self.members.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(text) => {
                        let Some(node) = node.upgrade() else {
                            debug!(node_id = %node_id, "Node dropped, leaving loopback bus");
                            break;
                        };
                        node.on_transport_message(&text).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            node_id = %node_id,
                            skipped,
                            "Loopback bus subscriber lagged, messages dropped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(node_id = %node_id, "Loopback bus closed");
                        break;
                    }
                }
            }
            members
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&node_id);
        });
        Ok(handle)
    }

    fn release(&self, node_id: &str) {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        members.remove(node_id);
    }

    /// Put raw text on the bus, e.g. chat traffic that is not a packet.
    /// Returns the number of subscribers that received it.
    pub fn inject(&self, text: &str) -> usize {
        self.sender.send(text.to_string()).unwrap_or(0)
    }

    /// Identities currently attached.
    pub fn members(&self) -> Vec<String> {
        let members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = members.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Publish handle bound to a node by [`LoopbackBus::connect`].
pub struct LoopbackTransport {
    sender: broadcast::Sender<String>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn name(&self) -> &str {
        "loopback"
    }

    async fn publish(&self, text: &str) -> SwarmResult<()> {
        self.sender
            .send(text.to_string())
            .map(|_| ())
            .map_err(|_| SwarmError::Transport("loopback bus has no subscribers".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmcall_types::config::NodeConfig;

    fn node(id: &str) -> Arc<Node> {
        Arc::new(
            Node::new(NodeConfig {
                node_id: Some(id.into()),
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected() {
        let bus = LoopbackBus::new(16);
        let alpha = node("alpha");
        bus.connect(alpha.clone()).unwrap();
        let err = bus.connect(node("alpha")).unwrap_err();
        assert!(matches!(err, SwarmError::DuplicateIdentity(id) if id == "alpha"));
        assert_eq!(bus.members(), vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_rebind_rejected_and_membership_released() {
        let bus = LoopbackBus::new(16);
        let other = LoopbackBus::new(16);
        let alpha = node("alpha");
        bus.connect(alpha.clone()).unwrap();
        let err = other.connect(alpha).unwrap_err();
        assert!(matches!(err, SwarmError::AlreadyBound(_)));
        assert!(other.members().is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_fails() {
        let (sender, _) = broadcast::channel(4);
        let transport = LoopbackTransport { sender };
        let err = transport.publish("hello").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_inject_reaches_members() {
        let bus = LoopbackBus::new(16);
        let nodes = [node("alpha"), node("beta")];
        for n in &nodes {
            bus.connect(n.clone()).unwrap();
        }
        assert_eq!(bus.inject("good morning"), 2);
    }

    #[tokio::test]
    async fn test_dropped_node_leaves_bus() {
        let bus = LoopbackBus::new(16);
        let alpha = node("alpha");
        let handle = bus.connect(alpha.clone()).unwrap();
        drop(alpha);

        bus.inject("anyone home?");
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("receive task should exit once the node is gone")
            .unwrap();
        assert!(bus.members().is_empty());
        bus.connect(node("alpha")).unwrap();
    }

    #[tokio::test]
    async fn test_abort_detaches_node() {
        let bus = LoopbackBus::new(16);
        let alpha = node("alpha");
        let handle = bus.connect(alpha.clone()).unwrap();
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(bus.inject("still there?"), 0);
    }
}
