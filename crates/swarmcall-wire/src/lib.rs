//! SwarmCall wire protocol: request/response over a shared broadcast channel.
//!
//! Every node on the channel sees every message, its own included. This
//! crate layers packet identity, addressing and reply correlation on top of
//! that so a node can call a named endpoint on one peer, on everyone, or on
//! whoever is able to answer.
//!
//! ## Architecture
//!
//! - **Packet**: JSON envelope with an id, addressing and an optional backlink
//! - **should_process**: addressing policy deciding whether a node answers
//! - **EndpointRegistry**: named handlers plus the dispatcher that runs them
//! - **PacketBuffer**: age-bounded store of inbound packets used for correlation
//! - **Transport**: publish side of the shared channel; `LoopbackBus` is the
//!   in-process reference implementation
//! - **Node**: owns all of the above and exposes `call` / `register_endpoint`

pub mod addressing;
pub mod buffer;
pub mod builtin;
pub mod correlator;
pub mod endpoint;
pub mod names;
pub mod node;
pub mod packet;
pub mod transport;

pub use addressing::{should_process, Destination, ANYONE, EVERYONE};
pub use buffer::PacketBuffer;
pub use correlator::CallOptions;
pub use endpoint::{EndpointHandler, EndpointRegistry};
pub use node::{Node, NodeState};
pub use packet::{Body, Packet};
pub use transport::{LoopbackBus, Transport};
pub use swarmcall_types::error::{EndpointError, SwarmError, SwarmResult};
