//! Packet envelope and wire encoding.
//!
//! Each packet travels as one self-contained JSON object:
//!
//! ```json
//! {"id":"…","src":"brave-otter","dst":"#everyone","endpoint":"ping","body":{},"backlink":""}
//! ```
//!
//! A packet whose `backlink` is set is a reply to the packet with that id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Call arguments or reply fields.
pub type Body = Map<String, Value>;

/// A request or reply travelling over the shared channel.
///
/// Fields are private: a packet is built by [`Packet::request`],
/// [`Packet::reply`] or [`Packet::parse`] and is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    id: String,
    #[serde(default)]
    src: String,
    #[serde(default)]
    dst: String,
    #[serde(default)]
    endpoint: String,
    #[serde(default)]
    body: Body,
    #[serde(default)]
    backlink: String,
}

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Packet {
    /// Build a fresh request from `caller_id` to `dst`.
    pub fn request(caller_id: &str, dst: &str, endpoint: &str, body: Body) -> Self {
        Self {
            id: fresh_id(),
            src: caller_id.to_string(),
            dst: dst.to_string(),
            endpoint: endpoint.to_string(),
            body,
            backlink: String::new(),
        }
    }

    /// Build a reply to `request`, addressed back to its sender.
    pub fn reply(caller_id: &str, request: &Packet, body: Body) -> Self {
        Self {
            id: fresh_id(),
            src: caller_id.to_string(),
            dst: request.src.clone(),
            endpoint: request.endpoint.clone(),
            body,
            backlink: request.id.clone(),
        }
    }

    /// Decode a channel message.
    ///
    /// Returns `None` for anything that is not a packet. The channel is
    /// shared with ordinary chat traffic, so this is not an error.
    pub fn parse(text: &str) -> Option<Self> {
        let packet: Packet = serde_json::from_str(text.trim()).ok()?;
        if packet.id.is_empty() {
            return None;
        }
        Some(packet)
    }

    /// Encode as a single-line JSON message.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn backlink(&self) -> &str {
        &self.backlink
    }

    /// Replies carry a backlink; requests never do.
    pub fn is_reply(&self) -> bool {
        !self.backlink.is_empty()
    }

    /// Whether the body carries a structured error.
    pub fn is_error(&self) -> bool {
        self.body.contains_key("error")
    }
}
