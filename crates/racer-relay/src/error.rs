//! Relay error types.

use racer_proto::{ConnectionId, ProtoError};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Proto(#[from] ProtoError),
    #[error("{id} is not a member of room {room_id}")]
    NotMember { room_id: String, id: ConnectionId },
    #[error("invalid listen address {0:?}")]
    InvalidAddr(String),
}
