//! Racer Protocol Library
//!
//! JSON event shapes exchanged between race clients and the relay.
//!
//! Every frame on the wire is an object of the form
//! `{"event": "<name>", "data": { ... }}`. Field names are camelCase so the
//! payloads stay compatible with browser clients.

#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Deserializer, Serialize};

/// Stable identifier the relay assigns to every connection.
pub type ConnectionId = String;

/// Error type for wire encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("malformed event: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

// ============================================================================
// Client → relay
// ============================================================================

/// Per-tick state of the sender's own vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMovement {
    pub room_id: String,
    pub x: f32,
    pub z: f32,
    pub rotation: f32,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub turn_dir: i8,
    #[serde(default)]
    pub is_boosting: bool,
    #[serde(default)]
    pub is_skidding: bool,
    #[serde(default)]
    pub laps: u32,
    #[serde(default)]
    pub checkpoint: usize,
}

impl PlayerMovement {
    /// Re-addresses the movement as seen by the other members of the room.
    pub fn into_moved(self, id: ConnectionId) -> PlayerMoved {
        PlayerMoved {
            id,
            x: self.x,
            z: self.z,
            rotation: self.rotation,
            laps: self.laps,
            checkpoint: self.checkpoint,
            speed: self.speed,
            turn_dir: self.turn_dir,
            is_boosting: self.is_boosting,
            is_skidding: self.is_skidding,
        }
    }
}

/// Sent once when the sender's vehicle completes the race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishReport {
    pub room_id: String,
    #[serde(deserialize_with = "lenient_seconds")]
    pub finish_time: f32,
}

/// Events a client emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    PlayerMovement(PlayerMovement),
    PlayerFinished(FinishReport),
}

impl ClientEvent {
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(ProtoError::Encode)
    }

    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(ProtoError::Decode)
    }

    /// Room the event is addressed to.
    pub fn room_id(&self) -> &str {
        match self {
            Self::PlayerMovement(movement) => &movement.room_id,
            Self::PlayerFinished(report) => &report.room_id,
        }
    }
}

// ============================================================================
// Relay → client
// ============================================================================

/// Another member's vehicle state, forwarded by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoved {
    pub id: ConnectionId,
    pub x: f32,
    pub z: f32,
    pub rotation: f32,
    #[serde(default)]
    pub laps: u32,
    #[serde(default)]
    pub checkpoint: usize,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub turn_dir: i8,
    #[serde(default)]
    pub is_boosting: bool,
    #[serde(default)]
    pub is_skidding: bool,
}

/// Another member finished the race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishNotice {
    pub id: ConnectionId,
    #[serde(deserialize_with = "lenient_seconds")]
    pub finish_time: f32,
}

/// Events the relay delivers to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Greeting carrying the id the relay assigned to this connection.
    Connected { id: ConnectionId },
    PlayerMoved(PlayerMoved),
    PlayerFinished(FinishNotice),
    PlayerDisconnected { id: ConnectionId },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(ProtoError::Encode)
    }

    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(ProtoError::Decode)
    }
}

/// Browser clients format finish times with two decimals, so the value may
/// arrive either as a number or as a numeric string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f32),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(value) => Ok(value),
        Seconds::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_uses_camel_case_envelope() {
        let event = ClientEvent::PlayerMovement(PlayerMovement {
            room_id: "r1".to_string(),
            x: 1.0,
            z: -2.0,
            rotation: 0.5,
            speed: 1.25,
            turn_dir: -1,
            is_boosting: true,
            is_skidding: false,
            laps: 1,
            checkpoint: 3,
        });

        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "playerMovement");
        assert_eq!(value["data"]["roomId"], "r1");
        assert_eq!(value["data"]["turnDir"], -1);
        assert_eq!(value["data"]["isBoosting"], true);
        assert_eq!(value["data"]["checkpoint"], 3);
    }

    #[test]
    fn test_moved_defaults_missing_fields() {
        let json = r#"{"event":"playerMoved","data":{"id":"abc","x":3.5,"z":4.0,"rotation":1.0}}"#;
        let ServerEvent::PlayerMoved(moved) = ServerEvent::from_json(json).unwrap() else {
            panic!("expected playerMoved");
        };
        assert_eq!(moved.id, "abc");
        assert_eq!(moved.laps, 0);
        assert_eq!(moved.checkpoint, 0);
        assert!(!moved.is_boosting);
        assert!(moved.speed.abs() < f32::EPSILON);
    }

    #[test]
    fn test_finish_time_accepts_string() {
        let json = r#"{"event":"playerFinished","data":{"id":"abc","finishTime":"42.17"}}"#;
        let ServerEvent::PlayerFinished(notice) = ServerEvent::from_json(json).unwrap() else {
            panic!("expected playerFinished");
        };
        assert!((notice.finish_time - 42.17).abs() < 1e-4);

        let json = r#"{"event":"playerFinished","data":{"roomId":"r","finishTime":12.5}}"#;
        let event = ClientEvent::from_json(json).unwrap();
        assert_eq!(event.room_id(), "r");
    }

    #[test]
    fn test_disconnect_event_shape() {
        let json = ServerEvent::PlayerDisconnected { id: "p9".to_string() }
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"event":"playerDisconnected","data":{"id":"p9"}}"#);
    }

    #[test]
    fn test_unknown_event_is_decode_error() {
        let err = ClientEvent::from_json(r#"{"event":"joinLobby","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtoError::Decode(_)));
    }

    #[test]
    fn test_into_moved_keeps_state() {
        let movement = PlayerMovement {
            room_id: "r".to_string(),
            x: 10.0,
            z: 20.0,
            rotation: 3.0,
            speed: 2.0,
            turn_dir: 1,
            is_boosting: false,
            is_skidding: true,
            laps: 2,
            checkpoint: 1,
        };
        let moved = movement.into_moved("peer".to_string());
        assert_eq!(moved.id, "peer");
        assert_eq!(moved.laps, 2);
        assert!(moved.is_skidding);
    }
}
