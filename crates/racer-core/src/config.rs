//! Car presets, AI difficulty and race-wide tuning.

use serde::{Deserialize, Serialize};

/// Simulation rate the per-tick constants are tuned for.
pub const TICK_HZ: f64 = 60.0;

/// Laps needed to finish a race.
pub const DEFAULT_MAX_LAPS: u32 = 3;

/// Countdown duration in frames (3 seconds at 60Hz).
pub const COUNTDOWN_FRAMES: u32 = 180;

/// Names given to the offline opponents, in grid order.
pub const AI_NAMES: [&str; 3] = ["Blue Comet", "Purple Phantom", "Orange Thunder"];

/// Body colors of the offline opponents, in grid order.
pub const AI_COLORS: [u32; 3] = [0x0034_98db, 0x009b_59b6, 0x00e6_7e22];

/// Immutable handling parameters of one car model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarConfig {
    pub name: String,
    pub color: u32,
    pub max_speed: f32,
    pub accel: f32,
    pub handling: f32,
}

impl CarConfig {
    pub fn new(name: &str, color: u32, max_speed: f32, accel: f32, handling: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            max_speed,
            accel,
            handling,
        }
    }

    /// Fast, twitchy starter car.
    pub fn striker() -> Self {
        Self::new("Striker", 0x00ff_4757, 2.2, 0.05, 0.035)
    }

    /// Balanced car with the best handling.
    pub fn nomad() -> Self {
        Self::new("Nomad", 0x002e_d573, 1.8, 0.04, 0.05)
    }

    /// Slow, heavy truck.
    pub fn titan() -> Self {
        Self::new("Titan", 0x00ff_a502, 1.5, 0.035, 0.04)
    }

    /// Returns every selectable car, in menu order.
    pub fn presets() -> Vec<CarConfig> {
        vec![Self::striker(), Self::nomad(), Self::titan()]
    }

    /// Looks up a preset by menu index, falling back to the first car.
    pub fn preset(index: usize) -> CarConfig {
        Self::presets()
            .into_iter()
            .nth(index)
            .unwrap_or_else(Self::striker)
    }
}

impl Default for CarConfig {
    fn default() -> Self {
        Self::new("Default", 0x00aa_aaaa, 2.0, 0.05, 0.04)
    }
}

/// Skill level of offline opponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }

    /// Base multiplier applied to an AI car's top speed and acceleration.
    pub fn speed_multiplier(self) -> f32 {
        match self {
            Difficulty::Easy => 0.70,
            Difficulty::Medium => 0.95,
            Difficulty::Hard => 1.25,
        }
    }
}

/// Race-wide tuning shared by every vehicle in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RaceConfig {
    pub max_laps: u32,
    /// Frames between session start and the green light.
    pub countdown_frames: u32,
    /// Frames between the local finish and the results screen.
    pub results_delay_frames: u32,
    /// Frames the finish banner stays visible.
    pub finish_banner_frames: u32,
    pub tick_hz: f64,
    /// Opponents spawned in offline mode.
    pub ai_opponents: usize,
    pub seed: u64,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            max_laps: DEFAULT_MAX_LAPS,
            countdown_frames: COUNTDOWN_FRAMES,
            results_delay_frames: 180,
            finish_banner_frames: 120,
            tick_hz: TICK_HZ,
            ai_opponents: AI_NAMES.len(),
            seed: 12345,
        }
    }
}

impl RaceConfig {
    /// Parses a config, rejecting a tick rate that is not a positive number.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        if !(config.tick_hz.is_finite() && config.tick_hz > 0.0) {
            return Err(serde::de::Error::custom(format!(
                "tickHz must be a positive number, got {}",
                config.tick_hz
            )));
        }
        Ok(config)
    }

    /// Tick rate in Hz, falling back to the default for unusable values.
    pub fn tick_rate(&self) -> f64 {
        if self.tick_hz.is_finite() && self.tick_hz > 0.0 {
            self.tick_hz
        } else {
            TICK_HZ
        }
    }

    /// Frames between two countdown beeps.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frames_per_second(&self) -> u32 {
        (self.tick_rate().round() as u32).max(1)
    }
}
