//! Send-and-collect: turn a broadcast stream into a bounded call.
//!
//! A request is published, then the node's packet buffer is scanned for
//! packets whose backlink matches the request id until enough replies have
//! arrived or the deadline passes. The collected list is best-effort: a short
//! or empty list means the call timed out, not that it failed.

use crate::addressing::Destination;
use crate::buffer::PacketBuffer;
use crate::node::Node;
use crate::packet::Packet;
use std::collections::HashSet;
use std::time::Duration;
use swarmcall_types::config::NodeConfig;
use swarmcall_types::error::SwarmResult;
use tokio::time::Instant;
use tracing::debug;

/// How many replies to wait for, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub min_replies: usize,
    pub timeout: Duration,
}

impl CallOptions {
    /// Default policy for `dst`: one reply from a specific peer, everything
    /// that arrives before the timeout from a wildcard.
    pub fn for_destination(dst: &str, config: &NodeConfig) -> Self {
        let min_replies = if Destination::classify(dst).is_wildcard() {
            config.fanout_min_replies
        } else {
            1
        };
        Self {
            min_replies,
            timeout: config.call_timeout(),
        }
    }

    pub fn with_min_replies(mut self, min_replies: usize) -> Self {
        self.min_replies = min_replies;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Publish `request` through `node` and collect its replies.
///
/// Transport failures propagate; running out of time does not.
pub async fn send_and_collect(
    node: &Node,
    request: Packet,
    options: CallOptions,
) -> SwarmResult<Vec<Packet>> {
    node.publish(&request).await?;
    let replies = collect_replies(
        node.buffer(),
        request.id(),
        options,
        node.config().poll_interval(),
    )
    .await;
    debug!(
        request_id = %request.id(),
        endpoint = %request.endpoint(),
        dst = %request.dst(),
        replies = replies.len(),
        wanted = options.min_replies,
        "Call finished"
    );
    Ok(replies)
}

/// Scan `buffer` for replies to `request_id` until `options` is satisfied.
///
/// Waits at most `poll_interval` between scans and wakes early whenever
/// the buffer receives a packet.
pub async fn collect_replies(
    buffer: &PacketBuffer,
    request_id: &str,
    options: CallOptions,
    poll_interval: Duration,
) -> Vec<Packet> {
    let deadline = Instant::now() + options.timeout;
    let mut seen: HashSet<String> = HashSet::new();
    let mut replies = Vec::new();

    loop {
        // Register interest before scanning so an append between the scan
        // and the wait is not missed.
        let appended = buffer.appended().notified();
        tokio::pin!(appended);
        appended.as_mut().enable();

        for packet in buffer.replies_to(request_id, &seen) {
            seen.insert(packet.id().to_string());
            replies.push(packet);
        }
        if replies.len() >= options.min_replies {
            break;
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let wait = poll_interval.min(deadline - now);
        let _ = tokio::time::timeout(wait, appended).await;
    }

    replies
}
