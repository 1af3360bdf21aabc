//! Pooled cosmetic effects: exhaust particles and skid marks.
//!
//! Both pools are fixed-capacity rings. A spawn overwrites the slot at the
//! cursor and advances it, so memory stays bounded no matter how long a
//! race runs.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PARTICLE_POOL_SIZE: usize = 60;
pub const SKID_POOL_SIZE: usize = 60;

/// Ticks between two skid-mark stamps of the same car.
pub const SKID_STAMP_INTERVAL: u8 = 3;

/// Particles spawned per emission call.
const PARTICLES_PER_EMIT: usize = 2;
/// Distance behind the car's origin where particles appear.
const EXHAUST_OFFSET: f32 = 1.2;
const PARTICLE_DECAY: f32 = 0.05;
const SKID_DECAY: f32 = 0.01;

/// Fixed-capacity ring buffer keyed by a wrapping spawn index.
#[derive(Debug, Clone)]
pub struct RingPool<T> {
    slots: Vec<T>,
    cursor: usize,
}

impl<T: Default + Clone> RingPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity.max(1)],
            cursor: 0,
        }
    }
}

impl<T> RingPool<T> {
    /// Overwrites the oldest slot and returns its index.
    pub fn spawn(&mut self, item: T) -> usize {
        let index = self.cursor;
        self.slots[index] = item;
        self.cursor = (self.cursor + 1) % self.slots.len();
        index
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }
}

/// One exhaust/nitrous puff.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// 1.0 when spawned, inactive at 0.
    pub life: f32,
    pub scale: f32,
}

impl Particle {
    pub fn active(&self) -> bool {
        self.life > 0.0
    }
}

/// A tire mark left on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkidMark {
    pub position: Vec2,
    pub heading: f32,
    /// Opacity, fades from 1.0 to 0.
    pub life: f32,
}

impl SkidMark {
    pub fn active(&self) -> bool {
        self.life > 0.0
    }
}

/// Rear wheel positions relative to the car origin, as (lateral, forward).
const REAR_WHEELS: [Vec2; 2] = [Vec2::new(-0.9, -1.1), Vec2::new(0.9, -1.1)];

/// Particle and skid-mark pools owned by one car.
#[derive(Debug, Clone)]
pub struct EffectPools {
    pub particles: RingPool<Particle>,
    pub skids: RingPool<SkidMark>,
    skid_cooldown: SkidCooldown,
}

impl Default for EffectPools {
    fn default() -> Self {
        Self {
            particles: RingPool::new(PARTICLE_POOL_SIZE),
            skids: RingPool::new(SKID_POOL_SIZE),
            skid_cooldown: SkidCooldown::default(),
        }
    }
}

impl EffectPools {
    /// Spawns a pair of particles just behind a car.
    pub fn emit_exhaust(&mut self, position: Vec2, heading: f32, rng: &mut impl Rng) {
        let forward = Vec2::new(heading.sin(), heading.cos());
        let origin = position - forward * EXHAUST_OFFSET;
        for _ in 0..PARTICLES_PER_EMIT {
            let velocity = Vec3::new(
                (rng.random::<f32>() - 0.5) * 0.1,
                rng.random::<f32>() * 0.1,
                (rng.random::<f32>() - 0.5) * 0.1,
            );
            let jitter = Vec3::new(
                (rng.random::<f32>() - 0.5) * 0.5,
                (rng.random::<f32>() - 0.5) * 0.3,
                (rng.random::<f32>() - 0.5) * 0.5,
            );
            self.particles.spawn(Particle {
                position: Vec3::new(origin.x, 0.5, origin.y) + jitter,
                velocity,
                life: 1.0,
                scale: 0.8,
            });
        }
    }

    /// Stamps a pair of marks under the rear wheels, rate limited per car.
    ///
    /// Returns `true` when marks were stamped this tick.
    pub fn stamp_skid(&mut self, position: Vec2, heading: f32) -> bool {
        if !self.skid_cooldown.tick() {
            return false;
        }
        let forward = Vec2::new(heading.sin(), heading.cos());
        let right = Vec2::new(-forward.y, forward.x);
        for wheel in REAR_WHEELS {
            self.skids.spawn(SkidMark {
                position: position + right * wheel.x + forward * wheel.y,
                heading,
                life: 1.0,
            });
        }
        true
    }

    /// Ages every live effect by one tick.
    pub fn update(&mut self) {
        for p in self.particles.slots_mut().iter_mut().filter(|p| p.active()) {
            p.position += p.velocity;
            p.life = (p.life - PARTICLE_DECAY).max(0.0);
            p.scale = 1.0 + (1.0 - p.life) * 2.0;
        }
        for s in self.skids.slots_mut().iter_mut().filter(|s| s.active()) {
            s.life = (s.life - SKID_DECAY).max(0.0);
        }
    }

    pub fn active_particles(&self) -> usize {
        self.particles.slots().iter().filter(|p| p.active()).count()
    }

    pub fn active_skids(&self) -> usize {
        self.skids.slots().iter().filter(|s| s.active()).count()
    }

    /// Deactivates everything, used when a session stops.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Per-car countdown that lets a skid mark through every few ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkidCooldown(u8);

impl SkidCooldown {
    /// Returns `true` when a mark should be stamped this tick.
    pub fn tick(&mut self) -> bool {
        if self.0 == 0 {
            self.0 = SKID_STAMP_INTERVAL;
            true
        } else {
            self.0 -= 1;
            false
        }
    }
}
