//! Packet buffer: age-bounded history of inbound packets.
//!
//! Every packet a node observes lands here before anything else happens to
//! it. Correlators scan the buffer for replies; eviction keeps it bounded by
//! age rather than count.

use crate::packet::Packet;
use std::collections::{HashSet, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::debug;

/// A packet and the local time it arrived.
#[derive(Debug, Clone)]
pub struct BufferEntry {
    pub received_at: Instant,
    pub packet: Packet,
}

/// Chronological store of recently received packets.
pub struct PacketBuffer {
    retention: Duration,
    entries: RwLock<VecDeque<BufferEntry>>,
    /// Woken after every append.
    appended: Notify,
}

impl PacketBuffer {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: RwLock::new(VecDeque::new()),
            appended: Notify::new(),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Record `packet` as received now. Returns the number of evicted entries.
    pub fn append(&self, packet: Packet) -> usize {
        self.append_at(Instant::now(), packet)
    }

    /// Record `packet` as received at `now`, then evict expired entries.
    ///
    /// Insertion and eviction happen under one write lock, so a concurrent
    /// scan sees the buffer either before or after both.
    pub fn append_at(&self, now: Instant, packet: Packet) -> usize {
        let evicted = {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
            entries.push_back(BufferEntry {
                received_at: now,
                packet,
            });
            let mut evicted = 0;
            while let Some(front) = entries.front() {
                if now.saturating_duration_since(front.received_at) <= self.retention {
                    break;
                }
                if let Some(old) = entries.pop_front() {
                    debug!(packet_id = %old.packet.id(), "Evicting expired packet");
                    evicted += 1;
                }
            }
            evicted
        };
        self.appended.notify_waiters();
        evicted
    }

    /// Replies to `request_id` not yet in `excluding`, in arrival order.
    pub fn replies_to(&self, request_id: &str, excluding: &HashSet<String>) -> Vec<Packet> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| e.packet.backlink() == request_id && !excluding.contains(e.packet.id()))
            .map(|e| e.packet.clone())
            .collect()
    }

    /// Snapshot of every buffered packet, oldest first.
    pub fn packets(&self) -> Vec<Packet> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().map(|e| e.packet.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifier signalled after each append.
    pub fn appended(&self) -> &Notify {
        &self.appended
    }
}
