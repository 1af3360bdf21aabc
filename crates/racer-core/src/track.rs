//! Track geometry: checkpoints, AI waypoints, start grid and boost pads.
//!
//! Coordinates live on the ground plane. `x` is lateral and `z` is the
//! forward axis of a car with heading 0.

use std::f64::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Error type for loading track definitions.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("invalid track JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("track has no checkpoints")]
    NoCheckpoints,
    #[error("checkpoint {index} has invalid radius {radius}")]
    InvalidRadius { index: usize, radius: f32 },
    #[error("track contains a non-finite coordinate")]
    NonFinite,
}

/// Circular gate that must be visited in order to complete a lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub x: f32,
    pub z: f32,
    #[serde(rename = "r", alias = "radius")]
    pub radius: f32,
}

impl Checkpoint {
    pub const fn new(x: f32, z: f32, radius: f32) -> Self {
        Self { x, z, radius }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.distance(self.center()) < self.radius
    }
}

/// AI steering target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub z: f32,
}

impl Waypoint {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// Grid slot a vehicle spawns on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StartSlot {
    pub x: f32,
    pub z: f32,
    #[serde(rename = "a", alias = "angle")]
    pub angle: f32,
}

impl StartSlot {
    pub const fn new(x: f32, z: f32, angle: f32) -> Self {
        Self { x, z, angle }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// Player slot plus the AI grid behind it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StartPositions {
    pub player: StartSlot,
    #[serde(default)]
    pub ai: Vec<StartSlot>,
}

/// Pickup that refills a car's boost timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostPad {
    pub x: f32,
    pub z: f32,
}

impl BoostPad {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// Shape family of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackLayout {
    /// Two straights at x = ±80 joined by radius-80 arcs.
    #[default]
    Oval,
    /// Two radius-80 loops around x = ±90.
    FigureEight,
}

impl TrackLayout {
    /// Soft containment only knows the oval's centerline.
    pub fn has_containment(self) -> bool {
        matches!(self, TrackLayout::Oval)
    }
}

/// Complete read-only description of a race track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub layout: TrackLayout,
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    pub start_positions: StartPositions,
    #[serde(default)]
    pub boosts: Vec<BoostPad>,
}

impl Track {
    /// Parses and validates a track definition.
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let track: Track = serde_json::from_str(json)?;
        track.validate()?;
        Ok(track)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Checks the invariants the simulation relies on.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.checkpoints.is_empty() {
            return Err(TrackError::NoCheckpoints);
        }
        for (index, cp) in self.checkpoints.iter().enumerate() {
            if !(cp.radius.is_finite() && cp.radius > 0.0) {
                return Err(TrackError::InvalidRadius {
                    index,
                    radius: cp.radius,
                });
            }
            if !(cp.x.is_finite() && cp.z.is_finite()) {
                return Err(TrackError::NonFinite);
            }
        }
        let finite = |x: f32, z: f32| x.is_finite() && z.is_finite();
        let slots_ok = std::iter::once(&self.start_positions.player)
            .chain(&self.start_positions.ai)
            .all(|s| finite(s.x, s.z) && s.angle.is_finite());
        if !slots_ok
            || !self.waypoints.iter().all(|w| finite(w.x, w.z))
            || !self.boosts.iter().all(|b| finite(b.x, b.z))
        {
            return Err(TrackError::NonFinite);
        }
        Ok(())
    }

    /// Looks up a built-in track by menu index.
    pub fn by_index(index: usize) -> Option<Track> {
        match index {
            0 => Some(Self::oval()),
            1 => Some(Self::figure_eight()),
            _ => None,
        }
    }

    pub fn checkpoint(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    /// AI grid slot, or the origin if the track defines fewer slots.
    pub fn ai_slot(&self, index: usize) -> StartSlot {
        self.start_positions
            .ai
            .get(index)
            .copied()
            .unwrap_or_default()
    }

    /// Online grid slot for the roster member at `index`.
    ///
    /// Members alternate left and right of the player slot and step back
    /// 12 units every second member.
    #[allow(clippy::cast_precision_loss)]
    pub fn grid_slot(&self, index: usize) -> StartSlot {
        let base = self.start_positions.player;
        let lateral = if index % 2 == 0 { 4.0 } else { -4.0 };
        StartSlot::new(
            base.x + lateral,
            base.z + (index / 2) as f32 * 12.0,
            base.angle,
        )
    }

    /// Closed oval with grass infield and four boost pads.
    #[allow(clippy::cast_possible_truncation)]
    pub fn oval() -> Self {
        let mut waypoints = Vec::new();
        let mut z = 0.0_f64;
        while z >= -100.0 {
            waypoints.push(Waypoint::new(-80.0, z as f32));
            z -= 25.0;
        }
        let mut a = PI;
        while a > 0.0 {
            waypoints.push(Waypoint::new(
                (80.0 * a.cos()) as f32,
                (-100.0 - 80.0 * a.sin()) as f32,
            ));
            a -= PI / 6.0;
        }
        let mut z = -100.0_f64;
        while z <= 100.0 {
            waypoints.push(Waypoint::new(80.0, z as f32));
            z += 25.0;
        }
        let mut a = 0.0_f64;
        while a > -PI {
            waypoints.push(Waypoint::new(
                (80.0 * a.cos()) as f32,
                (100.0 - 80.0 * a.sin()) as f32,
            ));
            a -= PI / 6.0;
        }

        let heading = std::f32::consts::PI;
        Self {
            name: "Grand Oval".to_string(),
            layout: TrackLayout::Oval,
            checkpoints: vec![
                Checkpoint::new(0.0, -140.0, 60.0),
                Checkpoint::new(80.0, 0.0, 60.0),
                Checkpoint::new(0.0, 140.0, 60.0),
                Checkpoint::new(-80.0, 0.0, 60.0),
            ],
            waypoints,
            start_positions: StartPositions {
                player: StartSlot::new(-80.0, 20.0, heading),
                ai: vec![
                    StartSlot::new(-72.0, 30.0, heading),
                    StartSlot::new(-80.0, 42.0, heading),
                    StartSlot::new(-72.0, 42.0, heading),
                ],
            },
            boosts: vec![
                BoostPad::new(-80.0, -50.0),
                BoostPad::new(80.0, 50.0),
                BoostPad::new(0.0, 180.0),
                BoostPad::new(0.0, -180.0),
            ],
        }
    }

    /// Desert figure-eight made of two loops joined by a crossover.
    #[allow(clippy::cast_possible_truncation)]
    pub fn figure_eight() -> Self {
        let point = |cx: f64, a: f64| {
            Waypoint::new((cx + 80.0 * a.cos()) as f32, (-80.0 * a.sin()) as f32)
        };

        let mut waypoints = Vec::new();
        let mut a = PI;
        while a > 0.0 {
            waypoints.push(point(-90.0, a));
            a -= 0.2;
        }
        let mut a = PI;
        while a < 2.0 * PI {
            waypoints.push(point(90.0, a));
            a += 0.2;
        }
        let mut a = 0.0;
        while a < PI {
            waypoints.push(point(90.0, a));
            a += 0.2;
        }
        let mut a = 2.0 * PI;
        while a > PI {
            waypoints.push(point(-90.0, a));
            a -= 0.2;
        }

        let heading = std::f32::consts::PI;
        Self {
            name: "Dune Eight".to_string(),
            layout: TrackLayout::FigureEight,
            checkpoints: vec![
                Checkpoint::new(0.0, -60.0, 60.0),
                Checkpoint::new(170.0, 0.0, 60.0),
                Checkpoint::new(0.0, 60.0, 60.0),
                Checkpoint::new(-170.0, 0.0, 60.0),
            ],
            waypoints,
            start_positions: StartPositions {
                player: StartSlot::new(-170.0, 80.0, heading),
                ai: vec![
                    StartSlot::new(-160.0, 85.0, heading),
                    StartSlot::new(-180.0, 85.0, heading),
                    StartSlot::new(-170.0, 95.0, heading),
                ],
            },
            boosts: Vec::new(),
        }
    }
}
