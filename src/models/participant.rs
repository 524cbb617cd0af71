use std::net::SocketAddr;

/// Opaque participant token used solely to deduplicate ballots.
///
/// Supplied by the transport layer from the peer network address. This is a
/// coarse, spoofable proxy (shared NATs collide, address changes evade it),
/// kept deliberately: deduplication here is a courtesy, not a security
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl From<&SocketAddr> for ParticipantId {
    fn from(addr: &SocketAddr) -> Self {
        // Port intentionally ignored: one ballot per host.
        Self::new(addr.ip().to_string())
    }
}
