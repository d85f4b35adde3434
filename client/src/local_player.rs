//! Locally predicted player pose and the pose-update throttle

use crate::input::FrameInput;
use shared::{HeightField, Vec3, PLAYER_HEIGHT, PLAYER_SPEED, SPAWN_POSITION, WORLD_SIZE};

/// Turn rate for Q/E, radians per second
pub const TURN_SPEED: f32 = 2.0;

/// The local player's pose, simulated every frame without waiting on the
/// server. Only the throttled samples taken by [`PoseClock`] leave the client.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPlayer {
    position: Vec3,
    /// Rotation about the vertical axis; 0 faces -z
    yaw: f32,
}

impl LocalPlayer {
    pub fn new(spawn: Vec3) -> Self {
        Self {
            position: spawn,
            yaw: 0.0,
        }
    }

    pub fn reset(&mut self, spawn: Vec3) {
        self.position = spawn;
        self.yaw = 0.0;
    }

    /// Advances the pose by `dt` seconds. Horizontal position is clamped to
    /// the world and the eye stays `PLAYER_HEIGHT` above the terrain.
    pub fn step<H: HeightField + ?Sized>(&mut self, input: &FrameInput, dt: f32, terrain: &H) {
        self.yaw += input.turn * TURN_SPEED * dt;

        let (sin, cos) = self.yaw.sin_cos();
        let forward = (-sin, -cos);
        let right = (cos, -sin);

        let mut dx = forward.0 * input.forward + right.0 * input.strafe;
        let mut dz = forward.1 * input.forward + right.1 * input.strafe;

        // Diagonals are no faster than straight lines
        let length = (dx * dx + dz * dz).sqrt();
        if length > 1.0 {
            dx /= length;
            dz /= length;
        }

        let half = WORLD_SIZE / 2.0;
        let x = (self.position.x + dx * PLAYER_SPEED * dt).clamp(-half, half);
        let z = (self.position.z + dz * PLAYER_SPEED * dt).clamp(-half, half);
        let y = terrain.height_at(x, z) + PLAYER_HEIGHT;

        self.position = Vec3::new(x, y, z);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Euler angles sent on the wire (pitch, yaw, roll)
    pub fn orientation(&self) -> Vec3 {
        Vec3::new(0.0, self.yaw, 0.0)
    }
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self::new(SPAWN_POSITION)
    }
}

/// Rate limiter for outbound pose updates.
#[derive(Debug, Clone)]
pub struct PoseClock {
    interval_ms: u64,
    last_sent: Option<u64>,
}

impl PoseClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sent: None,
        }
    }

    /// True at most once per interval; the first call always fires.
    pub fn ready(&mut self, now_ms: u64) -> bool {
        let due = match self.last_sent {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => true,
        };
        if due {
            self.last_sent = Some(now_ms);
        }
        due
    }
}
