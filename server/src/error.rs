use thiserror::Error;

/// Failure reading or writing the session list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("session list could not be decoded: {0}")]
    Corrupt(#[from] bincode::Error),
}

/// Failure delivering a frame to a peer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("peer is gone")]
    PeerGone,
}
