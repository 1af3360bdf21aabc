//! Per-tick output handed to the presentation layer.
//!
//! The simulation never touches a screen. Each tick produces a
//! [`TickOutput`] with vehicle transforms, HUD values, a camera target,
//! race events and audio cues; the host decides what to do with them.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::audio::AudioCue;
use crate::progress::ordinal_suffix;
use crate::session::RacePhase;
use crate::vehicle::{Nitrous, Vehicle, VehicleId, VisualState};

/// Multiplier from simulation speed to the number shown on the speedometer.
pub const SPEED_DISPLAY_SCALE: f32 = 85.0;
/// Tank level under which the bar turns to its warning color.
pub const NITROUS_LOW: f32 = 25.0;

pub const CHASE_DISTANCE: f32 = 22.0;
pub const CHASE_HEIGHT: f32 = 10.0;
pub const CHASE_LOOK_HEIGHT: f32 = 2.0;
pub const ORBIT_RADIUS: f32 = 20.0;
pub const ORBIT_HEIGHT: f32 = 6.0;
pub const ORBIT_SPEED: f32 = 0.01;

/// Render transform and cosmetic state of one car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFrame {
    pub id: VehicleId,
    pub name: String,
    pub color: u32,
    pub position: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub visual: VisualState,
    pub boosting: bool,
    pub skidding: bool,
    pub finished: bool,
}

impl VehicleFrame {
    pub fn of(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id.clone(),
            name: vehicle.name.clone(),
            color: vehicle.config.color,
            position: vehicle.position,
            heading: vehicle.heading,
            speed: vehicle.speed,
            visual: vehicle.visual,
            boosting: vehicle.boosting || vehicle.boost_timer > 0,
            skidding: vehicle.skidding,
            finished: vehicle.finished(),
        }
    }
}

/// Color state of the nitrous gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NitrousBar {
    #[default]
    Normal,
    Low,
    Locked,
}

impl NitrousBar {
    pub fn of(tank: &Nitrous) -> Self {
        if tank.lockout {
            NitrousBar::Locked
        } else if tank.level < NITROUS_LOW {
            NitrousBar::Low
        } else {
            NitrousBar::Normal
        }
    }
}

/// Values the HUD shows for the local car.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HudState {
    pub laps: u32,
    pub max_laps: u32,
    /// Race seconds, excluding pauses.
    pub time: f32,
    pub speed: u32,
    /// 1-based position in the standings.
    pub rank: usize,
    pub nitrous: f32,
    pub nitrous_bar: NitrousBar,
    /// Pickup boost or nitrous active, for the speed-lines overlay.
    pub boosting: bool,
    /// Number shown during the countdown, `None` once racing.
    pub countdown: Option<u32>,
    pub finish_banner: bool,
    pub paused: bool,
    /// Pausing online does not stop the other racers.
    pub online_pause_warning: bool,
}

impl HudState {
    pub fn time_text(&self) -> String {
        format!("{:.2}", self.time)
    }

    pub fn rank_text(&self) -> String {
        format!("{}{}", self.rank, ordinal_suffix(self.rank))
    }
}

/// Converts a simulation speed to speedometer units.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn display_speed(speed: f32) -> u32 {
    (speed.abs() * SPEED_DISPLAY_SCALE).round() as u32
}

/// Where the camera should head this tick. The host eases toward `eye`
/// by `smoothing` per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CameraHint {
    Chase {
        eye: Vec3,
        look_at: Vec3,
        smoothing: f32,
    },
    Orbit {
        eye: Vec3,
        look_at: Vec3,
        smoothing: f32,
        angle: f32,
    },
}

impl CameraHint {
    /// Behind and above the car.
    pub fn chase(vehicle: &Vehicle) -> Self {
        let behind = vehicle.position - vehicle.forward() * CHASE_DISTANCE;
        CameraHint::Chase {
            eye: Vec3::new(behind.x, CHASE_HEIGHT, behind.y),
            look_at: Vec3::new(vehicle.position.x, CHASE_LOOK_HEIGHT, vehicle.position.y),
            smoothing: 0.1,
        }
    }

    /// Circling a finished car.
    pub fn orbit(vehicle: &Vehicle, angle: f32) -> Self {
        let p = vehicle.position;
        CameraHint::Orbit {
            eye: Vec3::new(
                p.x + angle.sin() * ORBIT_RADIUS,
                ORBIT_HEIGHT,
                p.y + angle.cos() * ORBIT_RADIUS,
            ),
            look_at: Vec3::new(p.x, 0.0, p.y),
            smoothing: 0.05,
            angle,
        }
    }
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub rank: usize,
    pub id: VehicleId,
    pub name: String,
    pub finish_time: Option<f32>,
    pub local: bool,
}

impl ResultRow {
    pub fn time_text(&self) -> String {
        match self.finish_time {
            Some(t) => format!("{t:.2}s"),
            None => "DNF (Still Racing)".to_string(),
        }
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceEvent {
    /// A countdown number appeared.
    Countdown { remaining: u32 },
    /// Lights went green; driving is enabled.
    Go,
    Checkpoint { vehicle: VehicleId, next: usize },
    Lap { vehicle: VehicleId, laps: u32 },
    Finished { vehicle: VehicleId, time: f32 },
    FinishBannerHidden,
    ShowResults { standings: Vec<ResultRow> },
    MirrorLeft { id: String },
    Paused,
    Resumed,
    Stopped,
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    pub frame: u64,
    pub phase: RacePhase,
    pub vehicles: Vec<VehicleFrame>,
    pub hud: HudState,
    pub camera: Option<CameraHint>,
    pub events: Vec<RaceEvent>,
    pub audio: Vec<AudioCue>,
}

impl TickOutput {
    pub fn vehicle(&self, id: &VehicleId) -> Option<&VehicleFrame> {
        self.vehicles.iter().find(|v| &v.id == id)
    }

    pub fn has_event(&self, predicate: impl Fn(&RaceEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}
