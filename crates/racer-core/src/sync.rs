//! Multiplayer state exchange.
//!
//! The local player's car is the only one this client simulates. Every
//! other member of the room is a mirror that copies the latest received
//! snapshot verbatim and derives its cosmetics from it. Snapshots carry no
//! sequence number, so the last one to arrive wins.
//!
//! Inbound events are queued on a [`NetworkInbox`] by whatever owns the
//! socket and drained by the session at the start of each tick.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use racer_proto::{ClientEvent, ConnectionId, PlayerMoved, PlayerMovement, ServerEvent};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::vehicle::{Controller, Vehicle};

/// Mirror-only state: the last snapshot received for this car.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteMirror {
    pub last_snapshot: Option<PlayerMoved>,
}

/// One member of an online room, as handed over by the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: ConnectionId,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub car_index: usize,
}

/// Queue of relay events waiting for the next tick.
///
/// Clones share the same queue, so a socket callback can push while the
/// session owns another handle.
#[derive(Debug, Clone, Default)]
pub struct NetworkInbox {
    inner: Arc<Mutex<VecDeque<ServerEvent>>>,
}

impl NetworkInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: ServerEvent) {
        self.inner.lock().push_back(event);
    }

    /// Decodes a raw frame and queues it.
    pub fn push_json(&self, json: &str) -> Result<(), racer_proto::ProtoError> {
        self.push(ServerEvent::from_json(json)?);
        Ok(())
    }

    /// Takes every pending event in arrival order.
    pub fn drain(&self) -> Vec<ServerEvent> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

/// Outbound half of the relay connection. Emission never blocks or fails
/// loudly; a dropped message is fixed by the next tick's snapshot.
pub trait Transport: Send + Sync {
    fn is_connected(&self) -> bool;
    fn emit(&self, event: ClientEvent);
}

/// Transport that buffers events for the host to forward to the socket.
#[derive(Debug, Clone)]
pub struct Outbox {
    queue: Arc<Mutex<VecDeque<ClientEvent>>>,
    connected: Arc<AtomicBool>,
}

impl Default for Outbox {
    fn default() -> Self {
        Self {
            queue: Arc::default(),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn drain(&self) -> Vec<ClientEvent> {
        self.queue.lock().drain(..).collect()
    }

    /// Drains and encodes every pending event.
    pub fn drain_json(&self) -> Vec<String> {
        self.drain()
            .iter()
            .filter_map(|event| match event.to_json() {
                Ok(json) => Some(json),
                Err(e) => {
                    tracing::warn!("[sync] dropping unencodable event: {e}");
                    None
                }
            })
            .collect()
    }
}

impl Transport for Outbox {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn emit(&self, event: ClientEvent) {
        self.queue.lock().push_back(event);
    }
}

/// Builds the per-tick snapshot of the local car.
pub fn snapshot(vehicle: &Vehicle, room_id: &str) -> PlayerMovement {
    PlayerMovement {
        room_id: room_id.to_string(),
        x: vehicle.position.x,
        z: vehicle.position.y,
        rotation: vehicle.heading,
        speed: vehicle.speed,
        turn_dir: vehicle.turn_dir,
        is_boosting: vehicle.boosting,
        is_skidding: vehicle.skidding,
        laps: vehicle.progress.laps,
        checkpoint: vehicle.progress.checkpoint,
    }
}

/// Copies a received snapshot onto a mirror. Unconditional, last write wins.
pub fn apply_snapshot(vehicle: &mut Vehicle, moved: PlayerMoved) {
    vehicle.position.x = moved.x;
    vehicle.position.y = moved.z;
    vehicle.heading = moved.rotation;
    vehicle.progress.laps = moved.laps;
    vehicle.progress.checkpoint = moved.checkpoint;
    if let Controller::Remote(mirror) = &mut vehicle.controller {
        mirror.last_snapshot = Some(moved);
    }
}

/// Cosmetic triggers produced by replaying a mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorReport {
    pub emitted_particles: bool,
    pub stamped_skid: bool,
}

/// Derives wheel, chassis and effect state from a mirror's last snapshot.
///
/// A mirror that has not received anything yet only ages its effects.
pub fn replay_visuals(vehicle: &mut Vehicle, rng: &mut impl Rng) -> MirrorReport {
    let mut report = MirrorReport::default();
    let snapshot = match &vehicle.controller {
        Controller::Remote(mirror) => mirror.last_snapshot.clone(),
        _ => None,
    };

    if let Some(data) = snapshot {
        vehicle.speed = data.speed;
        vehicle.turn_dir = data.turn_dir.signum();
        vehicle.boosting = data.is_boosting;
        vehicle.skidding = data.is_skidding;
        vehicle.visual.apply(
            vehicle.turn_dir,
            data.speed,
            vehicle.config.max_speed,
            false,
        );
        if data.is_boosting {
            vehicle
                .effects
                .emit_exhaust(vehicle.position, vehicle.heading, rng);
            report.emitted_particles = true;
        }
        if data.is_skidding {
            report.stamped_skid = vehicle
                .effects
                .stamp_skid(vehicle.position, vehicle.heading);
        }
    }

    vehicle.effects.update();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarConfig;
    use crate::track::StartSlot;
    use crate::vehicle::VehicleId;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn mirror() -> Vehicle {
        Vehicle::new(
            VehicleId::Remote("peer".into()),
            "Peer",
            CarConfig::nomad(),
            StartSlot::new(-76.0, 20.0, 0.0),
            Controller::Remote(RemoteMirror::default()),
        )
    }

    fn moved(x: f32, z: f32) -> PlayerMoved {
        PlayerMoved {
            id: "peer".into(),
            x,
            z,
            rotation: 1.5,
            laps: 1,
            checkpoint: 2,
            speed: 1.2,
            turn_dir: -1,
            is_boosting: false,
            is_skidding: false,
        }
    }

    #[test]
    fn test_boosting_snapshot_emits_particles() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let mut car = mirror();
        let mut data = moved(10.0, 20.0);
        data.is_boosting = true;
        apply_snapshot(&mut car, data);

        let report = replay_visuals(&mut car, &mut rng);
        assert!(report.emitted_particles);
        assert_eq!(car.effects.active_particles(), 2);
        assert!(car.boosting);
    }

    #[test]
    fn test_snapshot_overwrites_state() {
        let mut car = mirror();
        apply_snapshot(&mut car, moved(10.0, 20.0));
        assert_eq!(car.position, Vec2::new(10.0, 20.0));
        assert!((car.heading - 1.5).abs() < f32::EPSILON);
        assert_eq!(car.progress.laps, 1);
        assert_eq!(car.progress.checkpoint, 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut car = mirror();
        apply_snapshot(&mut car, moved(50.0, 50.0));
        // An older packet arriving late still replaces the newer one.
        apply_snapshot(&mut car, moved(40.0, 40.0));
        assert_eq!(car.position, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_replay_visual_hints() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut car = mirror();
        let mut data = moved(0.0, 0.0);
        data.is_skidding = true;
        apply_snapshot(&mut car, data);
        let report = replay_visuals(&mut car, &mut rng);
        assert!(report.stamped_skid);
        assert!(!report.emitted_particles);
        assert!((car.visual.front_steer + 0.5).abs() < f32::EPSILON);
        assert!((car.visual.wheel_spin + 0.6).abs() < 1e-6);
        let expected_roll = -(1.2 / 1.8) * 0.1;
        assert!((car.visual.chassis_roll - expected_roll).abs() < 1e-6);
    }

    #[test]
    fn test_silent_mirror_only_ages_effects() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut car = mirror();
        let report = replay_visuals(&mut car, &mut rng);
        assert_eq!(report, MirrorReport::default());
        assert_eq!(car.position, Vec2::new(-76.0, 20.0));
    }

    #[test]
    fn test_snapshot_shape() {
        let mut car = mirror();
        car.speed = 0.75;
        car.turn_dir = 1;
        car.boosting = true;
        car.progress.laps = 2;
        let packet = snapshot(&car, "room-7");
        assert_eq!(packet.room_id, "room-7");
        assert!((packet.x + 76.0).abs() < f32::EPSILON);
        assert!((packet.z - 20.0).abs() < f32::EPSILON);
        assert_eq!(packet.turn_dir, 1);
        assert!(packet.is_boosting);
        assert_eq!(packet.laps, 2);
    }

    #[test]
    fn test_inbox_drains_in_order() {
        let inbox = NetworkInbox::new();
        let producer = inbox.clone();
        producer.push(ServerEvent::PlayerDisconnected { id: "a".into() });
        producer
            .push_json(r#"{"event":"playerDisconnected","data":{"id":"b"}}"#)
            .unwrap();
        assert_eq!(inbox.len(), 2);
        let drained = inbox.drain();
        assert_eq!(
            drained,
            vec![
                ServerEvent::PlayerDisconnected { id: "a".into() },
                ServerEvent::PlayerDisconnected { id: "b".into() },
            ]
        );
        assert!(inbox.is_empty());
        assert!(producer.push_json("not json").is_err());
    }

    #[test]
    fn test_outbox_encodes() {
        let outbox = Outbox::new();
        assert!(outbox.is_connected());
        outbox.emit(ClientEvent::PlayerMovement(snapshot(&mirror(), "r")));
        let frames = outbox.drain_json();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with(r#"{"event":"playerMovement""#));
        outbox.set_connected(false);
        assert!(!outbox.is_connected());
    }
}
