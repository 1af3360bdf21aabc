//! Race session: owns every vehicle and runs the per-tick pipeline.
//!
//! A tick drains the network inbox, advances the countdown, simulates the
//! player and the AI opponents, replays the mirrors, resolves collisions
//! and pickups, broadcasts the local snapshot and finally packs a
//! [`TickOutput`]. Problems with a single vehicle are logged and that
//! vehicle sits the tick out; the session itself never aborts.

use std::collections::BTreeMap;
use std::time::Duration;

use racer_proto::{ClientEvent, ConnectionId, FinishReport, ServerEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{self, AiDriver};
use crate::audio::{AudioCue, EngineSound};
use crate::clock::RaceClock;
use crate::collision;
use crate::config::{AI_COLORS, AI_NAMES, CarConfig, Difficulty, RaceConfig};
use crate::containment;
use crate::hud::{
    CameraHint, HudState, NitrousBar, ORBIT_SPEED, RaceEvent, ResultRow, TickOutput,
    VehicleFrame, display_speed,
};
use crate::input::ControlInput;
use crate::kinematics::{self, BOOST_PAD_MAX_SCALE};
use crate::pickups;
use crate::progress::{self, ProgressEvent};
use crate::sync::{self, NetworkInbox, RemoteMirror, RosterEntry, Transport};
use crate::track::Track;
use crate::vehicle::{Controller, StepSkip, Vehicle, VehicleId};

/// Where the race is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RacePhase {
    /// Lights are counting down; nobody can drive.
    Countdown { remaining_frames: u32 },
    Racing,
    /// Session torn down; ticks produce nothing.
    Stopped,
}

/// Offline race against AI, or an online race against mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceMode {
    Offline { difficulty: Difficulty },
    Online { room_id: String, local_id: ConnectionId },
}

/// What the lobby hands over when an online race starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineRoom {
    pub room_id: String,
    pub local_id: ConnectionId,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

/// Timers running after the local car finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FinishFlow {
    banner_frames: u32,
    results_frames: u32,
}

pub struct RaceSession {
    config: RaceConfig,
    track: Track,
    mode: RaceMode,
    car_index: usize,
    phase: RacePhase,
    player: Vehicle,
    opponents: Vec<Vehicle>,
    remotes: BTreeMap<ConnectionId, Vehicle>,
    inbox: NetworkInbox,
    transport: Option<Box<dyn Transport>>,
    rng: ChaCha8Rng,
    clock: RaceClock,
    frame: u64,
    paused: bool,
    orbit_angle: f32,
    finish_flow: Option<FinishFlow>,
    hud: HudState,
    pending_events: Vec<RaceEvent>,
    pending_audio: Vec<AudioCue>,
}

impl std::fmt::Debug for RaceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceSession")
            .field("track", &self.track.name)
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("frame", &self.frame)
            .field("opponents", &self.opponents.len())
            .field("remotes", &self.remotes.len())
            .finish_non_exhaustive()
    }
}

impl RaceSession {
    /// Player against AI opponents on random car presets.
    pub fn offline(track: Track, car_index: usize, difficulty: Difficulty, config: RaceConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let player = Vehicle::new(
            VehicleId::Player,
            "You",
            CarConfig::preset(car_index),
            track.start_positions.player,
            Controller::Human,
        );

        let preset_count = CarConfig::presets().len();
        let opponents = (0..config.ai_opponents)
            .map(|i| {
                let mut car = CarConfig::preset(rng.random_range(0..preset_count));
                car.color = AI_COLORS[i % AI_COLORS.len()];
                let driver = AiDriver::new(difficulty, &mut rng);
                Vehicle::new(
                    VehicleId::Ai(i),
                    AI_NAMES[i % AI_NAMES.len()],
                    car,
                    track.ai_slot(i),
                    Controller::Ai(driver),
                )
            })
            .collect();

        tracing::info!(
            "[race] offline session on {} ({} opponents, {})",
            track.name,
            config.ai_opponents,
            difficulty.as_str()
        );
        Self::assemble(
            config,
            track,
            RaceMode::Offline { difficulty },
            car_index,
            player,
            opponents,
            BTreeMap::new(),
            NetworkInbox::new(),
            None,
            rng,
        )
    }

    /// Local player plus one mirror per other roster member, all on the
    /// staggered online grid.
    pub fn online(
        track: Track,
        car_index: usize,
        config: RaceConfig,
        room: OnlineRoom,
        inbox: NetworkInbox,
        transport: Box<dyn Transport>,
    ) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let my_index = room
            .roster
            .iter()
            .position(|entry| entry.id == room.local_id)
            .unwrap_or(0);
        let my_name = room
            .roster
            .get(my_index)
            .map(|entry| entry.player_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "You".to_string());

        let player = Vehicle::new(
            VehicleId::Player,
            my_name,
            CarConfig::preset(car_index),
            track.grid_slot(my_index),
            Controller::Human,
        );

        let mut remotes = BTreeMap::new();
        for (index, entry) in room.roster.iter().enumerate() {
            if entry.id == room.local_id {
                continue;
            }
            let name = if entry.player_name.is_empty() {
                format!("Player {}", index + 1)
            } else {
                entry.player_name.clone()
            };
            tracing::info!("[sync] mirroring {} as {name}", entry.id);
            remotes.insert(
                entry.id.clone(),
                Vehicle::new(
                    VehicleId::Remote(entry.id.clone()),
                    name,
                    CarConfig::preset(entry.car_index),
                    track.grid_slot(index),
                    Controller::Remote(RemoteMirror::default()),
                ),
            );
        }

        tracing::info!(
            "[race] online session in room {} with {} mirrors",
            room.room_id,
            remotes.len()
        );
        Self::assemble(
            config,
            track,
            RaceMode::Online {
                room_id: room.room_id,
                local_id: room.local_id,
            },
            car_index,
            player,
            Vec::new(),
            remotes,
            inbox,
            Some(transport),
            rng,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        config: RaceConfig,
        track: Track,
        mode: RaceMode,
        car_index: usize,
        player: Vehicle,
        opponents: Vec<Vehicle>,
        remotes: BTreeMap<ConnectionId, Vehicle>,
        inbox: NetworkInbox,
        transport: Option<Box<dyn Transport>>,
        rng: ChaCha8Rng,
    ) -> Self {
        let fps = config.frames_per_second();
        let countdown = config.countdown_frames;
        let mut pending_events = Vec::new();
        let mut pending_audio = vec![AudioCue::Init];
        if countdown > 0 {
            pending_events.push(RaceEvent::Countdown {
                remaining: countdown.div_ceil(fps),
            });
            pending_audio.push(AudioCue::countdown_beep());
        }
        let hud = HudState {
            max_laps: config.max_laps,
            rank: 1,
            nitrous: player.nitrous.level,
            ..HudState::default()
        };

        Self {
            config,
            track,
            mode,
            car_index,
            phase: RacePhase::Countdown {
                remaining_frames: countdown,
            },
            player,
            opponents,
            remotes,
            inbox,
            transport,
            rng,
            clock: RaceClock::new(),
            frame: 0,
            paused: false,
            orbit_angle: std::f32::consts::PI,
            finish_flow: None,
            hud,
            pending_events,
            pending_audio,
        }
    }

    /// Fresh offline session with the same track, car and difficulty.
    /// Online races cannot be restarted from here.
    pub fn restart(&mut self) -> Option<RaceSession> {
        let RaceMode::Offline { difficulty } = self.mode else {
            return None;
        };
        let mut config = self.config.clone();
        config.seed = self.rng.random();
        Some(Self::offline(self.track.clone(), self.car_index, difficulty, config))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn mode(&self) -> &RaceMode {
        &self.mode
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn can_drive(&self) -> bool {
        self.phase == RacePhase::Racing
    }

    pub fn player(&self) -> &Vehicle {
        &self.player
    }

    pub fn opponents(&self) -> &[Vehicle] {
        &self.opponents
    }

    pub fn mirror(&self, id: &str) -> Option<&Vehicle> {
        self.remotes.get(id)
    }

    pub fn mirrors(&self) -> impl Iterator<Item = &Vehicle> {
        self.remotes.values()
    }

    /// Handle for the socket side to queue inbound events on.
    pub fn inbox(&self) -> NetworkInbox {
        self.inbox.clone()
    }

    fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        std::iter::once(&self.player)
            .chain(self.opponents.iter())
            .chain(self.remotes.values())
    }

    /// Current race order as a results table.
    pub fn standings(&self) -> Vec<ResultRow> {
        progress::standings(self.vehicles(), &self.track.checkpoints)
            .into_iter()
            .enumerate()
            .map(|(index, vehicle)| ResultRow {
                rank: index + 1,
                id: vehicle.id.clone(),
                name: vehicle.name.clone(),
                finish_time: vehicle.progress.finish_time,
                local: vehicle.id == VehicleId::Player,
            })
            .collect()
    }

    fn player_rank(&self) -> usize {
        progress::standings(self.vehicles(), &self.track.checkpoints)
            .iter()
            .position(|v| v.id == VehicleId::Player)
            .map_or(1, |index| index + 1)
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Pauses or resumes. Only allowed while racing and before the local
    /// car finishes. Returns the new paused state.
    pub fn toggle_pause(&mut self, now: Duration) -> bool {
        if self.phase != RacePhase::Racing || self.player.finished() {
            return self.paused;
        }
        self.paused = !self.paused;
        if self.paused {
            self.clock.pause(now);
            self.hud.online_pause_warning = matches!(self.mode, RaceMode::Online { .. });
            self.pending_audio.push(AudioCue::StopEngine);
            self.pending_events.push(RaceEvent::Paused);
            tracing::info!("[race] paused");
        } else {
            self.clock.resume(now);
            self.hud.online_pause_warning = false;
            self.pending_events.push(RaceEvent::Resumed);
            tracing::info!("[race] resumed");
        }
        self.paused
    }

    /// Tears the session down and releases every per-session resource.
    pub fn stop(&mut self) -> TickOutput {
        if self.phase != RacePhase::Stopped {
            tracing::info!("[race] session stopped after {} frames", self.frame);
        }
        self.phase = RacePhase::Stopped;
        self.paused = false;
        self.opponents.clear();
        self.remotes.clear();
        self.inbox.clear();
        self.transport = None;
        self.finish_flow = None;
        self.player.effects.clear();
        self.pending_events.push(RaceEvent::Stopped);
        self.pending_audio.push(AudioCue::StopEngine);
        self.output(Vec::new(), None)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the race by one frame.
    ///
    /// `now` is the host's monotonic time and only feeds the race clock.
    pub fn tick(&mut self, input: &ControlInput, now: Duration) -> TickOutput {
        if self.phase == RacePhase::Stopped {
            return self.output(Vec::new(), None);
        }
        self.frame += 1;

        self.drain_inbox();

        if self.paused {
            self.hud.paused = true;
            let frames = self.vehicles().map(VehicleFrame::of).collect();
            return self.output(frames, None);
        }
        self.hud.paused = false;

        let can_drive = self.advance_countdown(now);
        let elapsed = self.clock.elapsed_secs(now);
        let max_laps = self.config.max_laps;

        // Player.
        kinematics::step(&mut self.player, Some(input), can_drive, &mut self.rng);
        if let Err(skip) = containment::contain(&mut self.player, self.track.layout) {
            log_skip(&skip);
        }
        if can_drive {
            match progress::check_progress(&mut self.player, &self.track.checkpoints, max_laps, elapsed) {
                Ok(Some(event)) => self.on_player_progress(event),
                Ok(None) => {}
                Err(skip) => log_skip(&skip),
            }
        }

        // AI opponents.
        for vehicle in &mut self.opponents {
            if let Err(skip) = ai::steer(vehicle, &self.track.waypoints, can_drive, &mut self.rng) {
                log_skip(&skip);
                continue;
            }
            kinematics::step(vehicle, None, can_drive, &mut self.rng);
            if let Err(skip) = containment::contain(vehicle, self.track.layout) {
                log_skip(&skip);
            }
            if can_drive {
                match progress::check_progress(vehicle, &self.track.checkpoints, max_laps, elapsed) {
                    Ok(Some(event)) => {
                        self.pending_events
                            .push(progress_event(vehicle.id.clone(), event));
                    }
                    Ok(None) => {}
                    Err(skip) => log_skip(&skip),
                }
            }
        }

        // Mirrors.
        for vehicle in self.remotes.values_mut() {
            sync::replay_visuals(vehicle, &mut self.rng);
        }

        self.resolve_collisions();
        self.collect_pickups();
        self.broadcast(can_drive);
        self.update_hud(input, can_drive, elapsed);
        self.advance_finish_flow();

        let camera = self.camera();
        let frames = self.vehicles().map(VehicleFrame::of).collect();
        self.output(frames, camera)
    }

    fn output(&mut self, vehicles: Vec<VehicleFrame>, camera: Option<CameraHint>) -> TickOutput {
        TickOutput {
            frame: self.frame,
            phase: self.phase,
            vehicles,
            hud: self.hud.clone(),
            camera,
            events: std::mem::take(&mut self.pending_events),
            audio: std::mem::take(&mut self.pending_audio),
        }
    }

    /// Counts the lights down. Returns whether driving is enabled.
    fn advance_countdown(&mut self, now: Duration) -> bool {
        let RacePhase::Countdown { remaining_frames } = self.phase else {
            return self.phase == RacePhase::Racing;
        };
        let fps = self.config.frames_per_second();
        let remaining = remaining_frames.saturating_sub(1);
        if remaining == 0 {
            self.phase = RacePhase::Racing;
            self.clock.start(now);
            self.hud.countdown = None;
            self.pending_events.push(RaceEvent::Go);
            self.pending_audio.push(AudioCue::go_tone());
            tracing::info!("[race] GO at frame {}", self.frame);
            return true;
        }
        self.phase = RacePhase::Countdown {
            remaining_frames: remaining,
        };
        self.hud.countdown = Some(remaining.div_ceil(fps));
        if remaining % fps == 0 {
            self.pending_events.push(RaceEvent::Countdown {
                remaining: remaining / fps,
            });
            self.pending_audio.push(AudioCue::countdown_beep());
        }
        false
    }

    fn on_player_progress(&mut self, event: ProgressEvent) {
        self.pending_events
            .push(progress_event(VehicleId::Player, event));
        let ProgressEvent::Finished { time, .. } = event else {
            return;
        };

        if let (RaceMode::Online { room_id, .. }, Some(transport)) = (&self.mode, &self.transport) {
            if transport.is_connected() {
                transport.emit(ClientEvent::PlayerFinished(FinishReport {
                    room_id: room_id.clone(),
                    finish_time: time,
                }));
            }
        }
        self.pending_audio.push(AudioCue::Finish);
        self.pending_audio.push(AudioCue::StopEngine);
        self.hud.finish_banner = true;
        self.finish_flow = Some(FinishFlow {
            banner_frames: self.config.finish_banner_frames,
            results_frames: self.config.results_delay_frames,
        });
    }

    fn advance_finish_flow(&mut self) {
        let Some(mut flow) = self.finish_flow else {
            return;
        };
        if flow.banner_frames > 0 {
            flow.banner_frames -= 1;
            if flow.banner_frames == 0 {
                self.hud.finish_banner = false;
                self.pending_events.push(RaceEvent::FinishBannerHidden);
            }
        }
        flow.results_frames = flow.results_frames.saturating_sub(1);
        if flow.results_frames == 0 {
            self.finish_flow = None;
            self.show_results();
        } else {
            self.finish_flow = Some(flow);
        }
    }

    fn show_results(&mut self) {
        let standings = self.standings();
        self.pending_events.push(RaceEvent::ShowResults { standings });
    }

    /// Applies every queued relay event in arrival order.
    fn drain_inbox(&mut self) {
        for event in self.inbox.drain() {
            match event {
                ServerEvent::PlayerMoved(moved) => {
                    if let Some(mirror) = self.remotes.get_mut(&moved.id) {
                        sync::apply_snapshot(mirror, moved);
                    } else if !self.is_local(&moved.id) {
                        tracing::debug!("[sync] {}", StepSkip::UnknownMirror(moved.id));
                    }
                }
                ServerEvent::PlayerFinished(notice) => {
                    let Some(mirror) = self.remotes.get_mut(&notice.id) else {
                        tracing::debug!("[sync] {}", StepSkip::UnknownMirror(notice.id));
                        continue;
                    };
                    if mirror.finish(notice.finish_time) {
                        tracing::info!("[sync] {} finished in {:.2}s", mirror.name, notice.finish_time);
                        self.pending_events.push(RaceEvent::Finished {
                            vehicle: mirror.id.clone(),
                            time: notice.finish_time,
                        });
                    }
                    if self.player.finished() {
                        self.show_results();
                    }
                }
                ServerEvent::PlayerDisconnected { id } => {
                    if let Some(mirror) = self.remotes.remove(&id) {
                        tracing::info!("[sync] {} left the race", mirror.name);
                        self.pending_events.push(RaceEvent::MirrorLeft { id });
                    }
                }
                ServerEvent::Connected { id } => {
                    tracing::debug!("[sync] relay greeting for {id}");
                }
            }
        }
    }

    fn is_local(&self, id: &str) -> bool {
        matches!(&self.mode, RaceMode::Online { local_id, .. } if local_id == id)
    }

    fn resolve_collisions(&mut self) {
        let mut all: Vec<&mut Vehicle> = std::iter::once(&mut self.player)
            .chain(self.opponents.iter_mut())
            .chain(self.remotes.values_mut())
            .collect();
        let pass = collision::resolve_all(&mut all);
        for skip in &pass.skipped {
            log_skip(skip);
        }
        for contact in &pass.contacts {
            tracing::trace!("[race] {} bumped {} ({:.2})", contact.a, contact.b, contact.depth);
        }
    }

    fn collect_pickups(&mut self) {
        if pickups::collect_boost(&mut self.player, &self.track.boosts) {
            self.pending_audio.push(AudioCue::Boost);
        }
        for vehicle in &mut self.opponents {
            pickups::collect_boost(vehicle, &self.track.boosts);
        }
    }

    /// Sends the local snapshot while the car is racing.
    fn broadcast(&self, can_drive: bool) {
        let (RaceMode::Online { room_id, .. }, Some(transport)) = (&self.mode, &self.transport)
        else {
            return;
        };
        if !can_drive || self.player.finished() || !transport.is_connected() {
            return;
        }
        transport.emit(ClientEvent::PlayerMovement(sync::snapshot(&self.player, room_id)));
    }

    fn update_hud(&mut self, input: &ControlInput, can_drive: bool, elapsed: f32) {
        let player = &self.player;
        self.hud.laps = player.progress.laps;
        self.hud.nitrous = player.nitrous.level;
        self.hud.nitrous_bar = NitrousBar::of(&player.nitrous);
        self.hud.boosting = player.boosting || player.boost_timer > 0;
        if !can_drive || player.finished() {
            return;
        }
        self.hud.time = elapsed;
        self.hud.speed = display_speed(player.speed);
        self.hud.rank = self.player_rank();
        self.pending_audio.push(AudioCue::Engine(EngineSound {
            speed: self.player.speed,
            max_speed: self.player.config.max_speed * BOOST_PAD_MAX_SCALE,
            accelerating: input.forward,
        }));
    }

    fn camera(&mut self) -> Option<CameraHint> {
        if !self.player.position.is_finite() {
            return None;
        }
        if self.player.finished() {
            self.orbit_angle += ORBIT_SPEED;
            Some(CameraHint::orbit(&self.player, self.orbit_angle))
        } else {
            Some(CameraHint::chase(&self.player))
        }
    }
}

fn progress_event(vehicle: VehicleId, event: ProgressEvent) -> RaceEvent {
    match event {
        ProgressEvent::Checkpoint { next } => RaceEvent::Checkpoint { vehicle, next },
        ProgressEvent::Lap { laps } => {
            tracing::info!("[race] {vehicle} completed lap {laps}");
            RaceEvent::Lap { vehicle, laps }
        }
        ProgressEvent::Finished { time, .. } => {
            tracing::info!("[race] {vehicle} finished in {time:.2}s");
            RaceEvent::Finished { vehicle, time }
        }
    }
}

fn log_skip(skip: &StepSkip) {
    tracing::warn!("[race] skipping vehicle this tick: {skip}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Outbox;
    use racer_proto::{FinishNotice, PlayerMoved};

    #[allow(clippy::cast_precision_loss)]
    fn at(frame: u64) -> Duration {
        Duration::from_secs_f64(frame as f64 / 60.0)
    }

    fn run(session: &mut RaceSession, frames: u32, input: &ControlInput) -> Vec<TickOutput> {
        (0..frames)
            .map(|_| {
                let now = at(session.frame() + 1);
                session.tick(input, now)
            })
            .collect()
    }

    fn offline() -> RaceSession {
        RaceSession::offline(Track::oval(), 0, Difficulty::Medium, RaceConfig::default())
    }

    fn roster() -> OnlineRoom {
        OnlineRoom {
            room_id: "room-1".into(),
            local_id: "me".into(),
            roster: vec![
                RosterEntry {
                    id: "me".into(),
                    player_name: "Ana".into(),
                    car_index: 0,
                },
                RosterEntry {
                    id: "peer".into(),
                    player_name: String::new(),
                    car_index: 2,
                },
            ],
        }
    }

    fn online() -> (RaceSession, Outbox) {
        let outbox = Outbox::new();
        let session = RaceSession::online(
            Track::oval(),
            1,
            RaceConfig::default(),
            roster(),
            NetworkInbox::new(),
            Box::new(outbox.clone()),
        );
        (session, outbox)
    }

    fn moved(id: &str, x: f32, z: f32) -> ServerEvent {
        ServerEvent::PlayerMoved(PlayerMoved {
            id: id.into(),
            x,
            z,
            rotation: 0.5,
            laps: 0,
            checkpoint: 1,
            speed: 1.0,
            turn_dir: 0,
            is_boosting: false,
            is_skidding: false,
        })
    }

    #[test]
    fn test_offline_spawn() {
        let session = offline();
        assert_eq!(session.opponents().len(), 3);
        assert_eq!(session.player().name, "You");
        assert_eq!(session.player().position, glam::Vec2::new(-80.0, 20.0));
        for (i, ai) in session.opponents().iter().enumerate() {
            assert_eq!(ai.name, AI_NAMES[i]);
            assert_eq!(ai.config.color, AI_COLORS[i]);
            assert_eq!(ai.position, session.track().ai_slot(i).position());
            assert!(ai.is_ai());
        }
        assert_eq!(
            session.phase(),
            RacePhase::Countdown {
                remaining_frames: 180
            }
        );
    }

    #[test]
    fn test_countdown_beeps_then_go() {
        let mut session = offline();
        let outputs = run(&mut session, 180, &ControlInput::default());

        let first = &outputs[0];
        assert!(first.has_event(|e| *e == RaceEvent::Countdown { remaining: 3 }));
        assert_eq!(first.audio[0], AudioCue::Init);
        assert_eq!(first.hud.countdown, Some(3));

        let beeps: Vec<u64> = outputs
            .iter()
            .filter(|o| o.audio.contains(&AudioCue::countdown_beep()))
            .map(|o| o.frame)
            .collect();
        assert_eq!(beeps, vec![1, 60, 120]);

        let go = outputs.last().unwrap();
        assert_eq!(go.frame, 180);
        assert!(go.has_event(|e| *e == RaceEvent::Go));
        assert!(go.audio.contains(&AudioCue::go_tone()));
        assert_eq!(go.phase, RacePhase::Racing);
        assert!(outputs[..179].iter().all(|o| !o.has_event(|e| *e == RaceEvent::Go)));
        assert!(session.can_drive());
    }

    #[test]
    fn test_no_driving_before_go() {
        let mut session = offline();
        run(&mut session, 179, &ControlInput::forward());
        assert!(session.player().speed.abs() < f32::EPSILON);
        assert_eq!(session.player().position, glam::Vec2::new(-80.0, 20.0));

        run(&mut session, 30, &ControlInput::forward());
        assert!(session.player().speed > 0.3);
        assert!(session.player().position.y < 20.0);
    }

    #[test]
    fn test_pause_freezes_race_and_rebases_clock() {
        let mut session = offline();
        run(&mut session, 240, &ControlInput::forward());
        let frozen_at = session.player().position;

        assert!(session.toggle_pause(at(240)));
        let paused = run(&mut session, 120, &ControlInput::forward());
        assert!(paused.iter().all(|o| o.hud.paused));
        assert!(paused[0].has_event(|e| *e == RaceEvent::Paused));
        assert!(paused[0].audio.contains(&AudioCue::StopEngine));
        assert_eq!(session.player().position, frozen_at);

        assert!(!session.toggle_pause(at(360)));
        let resumed = run(&mut session, 1, &ControlInput::forward());
        assert!(resumed[0].has_event(|e| *e == RaceEvent::Resumed));
        // 60 racing frames before the pause plus one after it.
        assert!((resumed[0].hud.time - 61.0 / 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_pause_ignored_during_countdown() {
        let mut session = offline();
        run(&mut session, 10, &ControlInput::default());
        assert!(!session.toggle_pause(at(10)));
        assert!(!session.is_paused());
    }

    #[test]
    fn test_online_spawn_from_roster() {
        let (session, _) = online();
        assert_eq!(session.player().name, "Ana");
        assert_eq!(session.player().position, session.track().grid_slot(0).position());
        let peer = session.mirror("peer").unwrap();
        assert_eq!(peer.name, "Player 2");
        assert_eq!(peer.position, session.track().grid_slot(1).position());
        assert_eq!(peer.config, CarConfig::preset(2));
        assert!(session.opponents().is_empty());
    }

    #[test]
    fn test_snapshots_only_sent_while_racing() {
        let (mut session, outbox) = online();
        run(&mut session, 179, &ControlInput::forward());
        assert!(outbox.drain().is_empty());

        run(&mut session, 5, &ControlInput::forward());
        let sent = outbox.drain();
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|e| matches!(e, ClientEvent::PlayerMovement(m) if m.room_id == "room-1")));

        outbox.set_connected(false);
        run(&mut session, 5, &ControlInput::forward());
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn test_inbound_events_update_mirrors() {
        let (mut session, _) = online();
        let inbox = session.inbox();
        inbox.push(moved("peer", 12.0, -30.0));
        inbox.push(moved("stranger", 1.0, 1.0));
        inbox.push(moved("me", 99.0, 99.0));
        run(&mut session, 1, &ControlInput::default());

        let peer = session.mirror("peer").unwrap();
        assert_eq!(peer.position, glam::Vec2::new(12.0, -30.0));
        assert_eq!(peer.progress.checkpoint, 1);
        assert!(session.mirror("stranger").is_none());
        assert_ne!(session.player().position, glam::Vec2::new(99.0, 99.0));

        inbox.push(ServerEvent::PlayerFinished(FinishNotice {
            id: "peer".into(),
            finish_time: 42.5,
        }));
        let out = run(&mut session, 1, &ControlInput::default());
        assert!(out[0].has_event(|e| matches!(e, RaceEvent::Finished { time, .. } if (*time - 42.5).abs() < f32::EPSILON)));
        assert_eq!(session.mirror("peer").unwrap().progress.finish_time, Some(42.5));
        assert!(!out[0].has_event(|e| matches!(e, RaceEvent::ShowResults { .. })));

        inbox.push(ServerEvent::PlayerDisconnected { id: "peer".into() });
        let out = run(&mut session, 1, &ControlInput::default());
        assert!(out[0].has_event(|e| *e == RaceEvent::MirrorLeft { id: "peer".into() }));
        assert!(session.mirror("peer").is_none());
    }

    #[test]
    fn test_online_pause_raises_warning() {
        let (mut session, _) = online();
        run(&mut session, 200, &ControlInput::default());
        assert!(session.toggle_pause(at(200)));
        let out = run(&mut session, 1, &ControlInput::default());
        assert!(out[0].hud.paused);
        assert!(out[0].hud.online_pause_warning);

        assert!(!session.toggle_pause(at(201)));
        let out = run(&mut session, 1, &ControlInput::default());
        assert!(!out[0].hud.online_pause_warning);
    }

    #[test]
    fn test_offline_pause_has_no_warning() {
        let mut session = offline();
        run(&mut session, 200, &ControlInput::default());
        assert!(session.toggle_pause(at(200)));
        let out = run(&mut session, 1, &ControlInput::default());
        assert!(out[0].hud.paused);
        assert!(!out[0].hud.online_pause_warning);
    }

    #[test]
    fn test_remote_finish_after_local_finish_shows_results() {
        let config = RaceConfig {
            max_laps: 1,
            ..RaceConfig::default()
        };
        let mut session = RaceSession::online(
            Track::oval(),
            0,
            config,
            roster(),
            NetworkInbox::new(),
            Box::new(Outbox::new()),
        );
        run(&mut session, 300, &ControlInput::default());
        session.player.progress.checkpoint = 3;
        run(&mut session, 1, &ControlInput::default());
        assert!(session.player().finished());

        session.inbox().push(ServerEvent::PlayerFinished(FinishNotice {
            id: "peer".into(),
            finish_time: 3.5,
        }));
        let out = run(&mut session, 1, &ControlInput::default());
        let results: Vec<&RaceEvent> = out[0]
            .events
            .iter()
            .filter(|e| matches!(e, RaceEvent::ShowResults { .. }))
            .collect();
        assert_eq!(results.len(), 1);
        let RaceEvent::ShowResults { standings } = results[0] else {
            unreachable!()
        };
        assert_eq!(standings.len(), 2);
        assert!(standings.iter().all(|row| row.finish_time.is_some()));
    }

    #[test]
    fn test_inbox_drained_while_paused() {
        let (mut session, _) = online();
        run(&mut session, 200, &ControlInput::default());
        session.toggle_pause(at(200));
        session.inbox().push(moved("peer", 5.0, 5.0));
        run(&mut session, 1, &ControlInput::default());
        assert_eq!(session.mirror("peer").unwrap().position, glam::Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_local_finish_flow() {
        let config = RaceConfig {
            max_laps: 1,
            ..RaceConfig::default()
        };
        let outbox = Outbox::new();
        let mut session = RaceSession::online(
            Track::oval(),
            0,
            config,
            roster(),
            NetworkInbox::new(),
            Box::new(outbox.clone()),
        );
        run(&mut session, 300, &ControlInput::default());
        outbox.drain();

        // The start slot sits inside the last gate.
        session.player.progress.checkpoint = 3;
        let out = run(&mut session, 1, &ControlInput::default());
        assert!(out[0].has_event(|e| matches!(e, RaceEvent::Finished { vehicle: VehicleId::Player, .. })));
        assert!(out[0].audio.contains(&AudioCue::Finish));
        assert!(out[0].hud.finish_banner);
        let time = session.player().progress.finish_time.unwrap();
        assert!((time - 2.02).abs() < 1e-3);

        let rest = run(&mut session, 200, &ControlInput::default());
        let finishes: Vec<_> = outbox
            .drain()
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::PlayerFinished(_)))
            .collect();
        assert_eq!(finishes.len(), 1);

        let hidden = rest
            .iter()
            .position(|o| o.has_event(|e| *e == RaceEvent::FinishBannerHidden))
            .unwrap();
        let results = rest
            .iter()
            .position(|o| o.has_event(|e| matches!(e, RaceEvent::ShowResults { .. })))
            .unwrap();
        assert_eq!(hidden, 118);
        assert_eq!(results, 178);
        assert!(matches!(rest[0].camera, Some(CameraHint::Orbit { .. })));
        assert!(!session.toggle_pause(at(600)));

        let RaceEvent::ShowResults { standings } = rest[results]
            .events
            .iter()
            .find(|e| matches!(e, RaceEvent::ShowResults { .. }))
            .unwrap()
            .clone()
        else {
            unreachable!()
        };
        assert_eq!(standings[0].id, VehicleId::Player);
        assert_eq!(standings[1].time_text(), "DNF (Still Racing)");
    }

    #[test]
    fn test_stop_releases_everything() {
        let (mut session, outbox) = online();
        run(&mut session, 190, &ControlInput::forward());
        session.inbox().push(moved("peer", 1.0, 1.0));

        let out = session.stop();
        assert!(out.has_event(|e| *e == RaceEvent::Stopped));
        assert!(out.audio.contains(&AudioCue::StopEngine));
        assert_eq!(session.phase(), RacePhase::Stopped);
        assert_eq!(session.mirrors().count(), 0);
        assert!(session.inbox().is_empty());

        outbox.drain();
        let after = run(&mut session, 3, &ControlInput::forward());
        assert!(after.iter().all(|o| o.vehicles.is_empty() && o.events.is_empty()));
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn test_restart_offline_only() {
        let mut session = offline();
        run(&mut session, 50, &ControlInput::default());
        let fresh = session.restart().unwrap();
        assert_eq!(fresh.frame(), 0);
        assert_eq!(fresh.opponents().len(), 3);

        let (mut networked, _) = online();
        assert!(networked.restart().is_none());
    }

    #[test]
    fn test_ai_race_makes_progress() {
        let mut session = offline();
        let outputs = run(&mut session, 3600, &ControlInput::default());
        for ai in session.opponents() {
            assert!(ai.is_finite(), "{} went non-finite", ai.name);
        }
        assert!(
            session
                .opponents()
                .iter()
                .any(|ai| ai.progress.laps > 0 || ai.progress.checkpoint > 0)
        );
        assert!(outputs.iter().all(|o| o.vehicles.len() == 4));
    }

    #[test]
    fn test_same_seed_same_race() {
        let mut a = offline();
        let mut b = offline();
        let left = run(&mut a, 600, &ControlInput::forward());
        let right = run(&mut b, 600, &ControlInput::forward());
        assert_eq!(left.last().unwrap().vehicles, right.last().unwrap().vehicles);
    }
}
