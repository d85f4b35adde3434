//! Client keyboard sampling with change detection

use macroquad::prelude::*;

/// One frame's worth of player intent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// +1 forward, -1 back
    pub forward: f32,
    /// +1 right, -1 left
    pub strafe: f32,
    /// +1 turns left (Q), -1 turns right (E)
    pub turn: f32,
    /// Leaderboard key went down this frame
    pub leaderboard: bool,
}

/// Turns raw key state into [`FrameInput`]s
pub struct InputManager {
    // Previous frame key state for edge detection
    prev_key_l: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self { prev_key_l: false }
    }

    /// Samples the keyboard for the current frame
    pub fn update(&mut self) -> FrameInput {
        // Support both WASD and arrow keys
        let up = is_key_down(KeyCode::W) || is_key_down(KeyCode::Up);
        let down = is_key_down(KeyCode::S) || is_key_down(KeyCode::Down);
        let left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let turn_left = is_key_down(KeyCode::Q);
        let turn_right = is_key_down(KeyCode::E);
        let key_l = is_key_down(KeyCode::L);

        FrameInput {
            forward: axis(up, down),
            strafe: axis(right, left),
            turn: axis(turn_left, turn_right),
            leaderboard: self.pressed_l(key_l),
        }
    }

    /// True only on the frame the key goes down (current && !previous)
    fn pressed_l(&mut self, key_l: bool) -> bool {
        let pressed = key_l && !self.prev_key_l;
        self.prev_key_l = key_l;
        pressed
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}
