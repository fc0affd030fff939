//! Addressing policy: which inbound packets a node should answer.

use crate::packet::Packet;

/// Broadcast wildcard: every node answers, the sender included.
pub const EVERYONE: &str = "#everyone";

/// Any-responder wildcard: capable nodes answer, the rest stay silent.
pub const ANYONE: &str = "#anyone";

/// A packet destination, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    /// A single node identity.
    Peer(&'a str),
    /// [`EVERYONE`].
    Everyone,
    /// [`ANYONE`].
    Anyone,
}

impl<'a> Destination<'a> {
    pub fn classify(dst: &'a str) -> Self {
        match dst {
            EVERYONE => Destination::Everyone,
            ANYONE => Destination::Anyone,
            peer => Destination::Peer(peer),
        }
    }

    /// Wildcard destinations have an unknown number of responders.
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, Destination::Peer(_))
    }
}

/// Decide whether `local_id` should dispatch `packet`.
///
/// Replies are never dispatched; they are only observed by a waiting
/// correlator. A node answers its own broadcast but never its own
/// any-responder request.
pub fn should_process(local_id: &str, packet: &Packet) -> bool {
    if packet.is_reply() {
        return false;
    }
    if packet.dst() == local_id || packet.dst() == EVERYONE {
        return true;
    }
    if packet.src() == local_id {
        return false;
    }
    packet.dst() == ANYONE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Body;

    fn req(src: &str, dst: &str) -> Packet {
        Packet::request(src, dst, "ping", Body::new())
    }

    #[test]
    fn test_classify() {
        assert_eq!(Destination::classify("#everyone"), Destination::Everyone);
        assert_eq!(Destination::classify("#anyone"), Destination::Anyone);
        assert_eq!(Destination::classify("beta"), Destination::Peer("beta"));
        assert!(Destination::Everyone.is_wildcard());
        assert!(Destination::Anyone.is_wildcard());
        assert!(!Destination::Peer("beta").is_wildcard());
    }

    #[test]
    fn test_direct_request() {
        assert!(should_process("beta", &req("alpha", "beta")));
        assert!(!should_process("gamma", &req("alpha", "beta")));
    }

    #[test]
    fn test_broadcast_includes_sender() {
        assert!(should_process("alpha", &req("alpha", EVERYONE)));
        assert!(should_process("beta", &req("alpha", EVERYONE)));
    }

    #[test]
    fn test_anyone_excludes_sender() {
        assert!(!should_process("alpha", &req("alpha", ANYONE)));
        assert!(should_process("beta", &req("alpha", ANYONE)));
    }

    #[test]
    fn test_request_to_self() {
        assert!(should_process("alpha", &req("alpha", "alpha")));
    }

    #[test]
    fn test_replies_never_processed() {
        for dst in ["alpha", "beta", EVERYONE, ANYONE] {
            let request = req("beta", dst);
            let reply = Packet::reply("gamma", &request, Body::new());
            for local in ["alpha", "beta", "gamma"] {
                assert!(!should_process(local, &reply), "{local} answered a reply");
            }
        }
    }

    #[test]
    fn test_unrelated_destination_ignored() {
        let p = Packet::parse(r#"{"id":"1","src":"alpha","dst":"","endpoint":"ping"}"#).unwrap();
        assert!(!should_process("beta", &p));
    }
}
