//! Room registry and event forwarding.
//!
//! Every WebSocket connection joins exactly one room, named by the URL it
//! connected to. The relay does not simulate anything: it stamps inbound
//! events with the sender's id and forwards them to the other members.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use racer_proto::{ClientEvent, ConnectionId, FinishNotice, ServerEvent};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::RelayError;

/// Sending half of one member's socket writer.
pub type Outbound = mpsc::UnboundedSender<String>;

#[derive(Debug, Default, Clone)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, HashMap<ConnectionId, Outbound>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new member to `room_id` and queues its `connected` greeting.
    pub fn join(
        &self,
        room_id: &str,
    ) -> Result<(ConnectionId, mpsc::UnboundedReceiver<String>), RelayError> {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let greeting = ServerEvent::Connected { id: id.clone() }.to_json()?;
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(greeting);

        let mut rooms = self.rooms.write();
        let members = rooms.entry(room_id.to_string()).or_default();
        members.insert(id.clone(), tx);
        tracing::info!("[relay] {id} joined {room_id} ({} members)", members.len());
        Ok((id, rx))
    }

    /// Removes a member and tells the rest of the room. Returns whether the
    /// member was present.
    pub fn leave(&self, room_id: &str, id: &str) -> bool {
        let removed = {
            let mut rooms = self.rooms.write();
            let Some(members) = rooms.get_mut(room_id) else {
                return false;
            };
            let removed = members.remove(id).is_some();
            if members.is_empty() {
                rooms.remove(room_id);
                tracing::debug!("[relay] room {room_id} closed");
            }
            removed
        };
        if removed {
            tracing::info!("[relay] {id} left {room_id}");
            let event = ServerEvent::PlayerDisconnected { id: id.to_string() };
            if let Err(e) = self.broadcast(room_id, Some(id), &event) {
                tracing::warn!("[relay] disconnect notice failed: {e}");
            }
        }
        removed
    }

    /// Decodes one client frame and forwards it to the sender's room mates.
    /// Returns how many members received it.
    pub fn handle_frame(
        &self,
        room_id: &str,
        from: &str,
        text: &str,
    ) -> Result<usize, RelayError> {
        if !self.is_member(room_id, from) {
            return Err(RelayError::NotMember {
                room_id: room_id.to_string(),
                id: from.to_string(),
            });
        }
        let event = ClientEvent::from_json(text)?;
        if event.room_id() != room_id {
            tracing::debug!(
                "[relay] {from} addressed {} from room {room_id}; using its socket room",
                event.room_id()
            );
        }
        let forwarded = match event {
            ClientEvent::PlayerMovement(movement) => {
                ServerEvent::PlayerMoved(movement.into_moved(from.to_string()))
            }
            ClientEvent::PlayerFinished(report) => {
                tracing::info!("[relay] {from} finished in {:.2}s", report.finish_time);
                ServerEvent::PlayerFinished(FinishNotice {
                    id: from.to_string(),
                    finish_time: report.finish_time,
                })
            }
        };
        self.broadcast(room_id, Some(from), &forwarded)
    }

    /// Sends an event to every member of a room except `except`.
    pub fn broadcast(
        &self,
        room_id: &str,
        except: Option<&str>,
        event: &ServerEvent,
    ) -> Result<usize, RelayError> {
        let json = event.to_json()?;
        let rooms = self.rooms.read();
        let Some(members) = rooms.get(room_id) else {
            return Ok(0);
        };
        let mut delivered = 0;
        for (id, tx) in members {
            if Some(id.as_str()) == except {
                continue;
            }
            // A closed receiver means the socket is going away; its own
            // task removes it.
            if tx.send(json.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::trace!("[relay] {room_id}: delivered to {delivered}");
        Ok(delivered)
    }

    pub fn is_member(&self, room_id: &str, id: &str) -> bool {
        self.rooms
            .read()
            .get(room_id)
            .is_some_and(|members| members.contains_key(id))
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.read().get(room_id).map_or(0, HashMap::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }
}
