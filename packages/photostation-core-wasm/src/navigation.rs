//! First-person movement state.
//!
//! The host page owns pointer lock and the camera object; this module only
//! integrates velocity once per animation frame and tells the host how far
//! to move.

use nalgebra::Vector3;
use serde::Serialize;

use crate::config::NavigationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

impl MoveKey {
    /// Map a `KeyboardEvent.code`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(MoveKey::Forward),
            "ArrowDown" | "KeyS" => Some(MoveKey::Backward),
            "ArrowLeft" | "KeyA" => Some(MoveKey::Left),
            "ArrowRight" | "KeyD" => Some(MoveKey::Right),
            "Space" => Some(MoveKey::Jump),
            _ => None,
        }
    }
}

/// What the host applies to its controls after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMotion {
    pub move_right: f64,
    pub move_forward: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    config: NavigationConfig,
    locked: bool,
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    can_jump: bool,
    velocity: Vector3<f64>,
    height: f64,
    prev_time: Option<f64>,
}

impl NavigationState {
    pub fn new(config: NavigationConfig, start_height: f64) -> Self {
        Self {
            config,
            locked: false,
            forward: false,
            backward: false,
            left: false,
            right: false,
            can_jump: false,
            velocity: Vector3::zeros(),
            height: start_height,
            prev_time: None,
        }
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// Returns false for codes that do not drive movement.
    pub fn key_down(&mut self, code: &str) -> bool {
        match MoveKey::from_code(code) {
            Some(MoveKey::Forward) => self.forward = true,
            Some(MoveKey::Backward) => self.backward = true,
            Some(MoveKey::Left) => self.left = true,
            Some(MoveKey::Right) => self.right = true,
            Some(MoveKey::Jump) => {
                if self.can_jump {
                    self.velocity.y += self.config.jump_impulse;
                }
                self.can_jump = false;
            }
            None => return false,
        }
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        match MoveKey::from_code(code) {
            Some(MoveKey::Forward) => self.forward = false,
            Some(MoveKey::Backward) => self.backward = false,
            Some(MoveKey::Left) => self.left = false,
            Some(MoveKey::Right) => self.right = false,
            Some(MoveKey::Jump) => {}
            None => return false,
        }
        true
    }

    /// Advance one animation frame; `now_ms` is the host's
    /// `performance.now()`.
    pub fn update(&mut self, now_ms: f64) -> FrameMotion {
        let delta = self
            .prev_time
            .map(|prev| ((now_ms - prev) / 1000.0).max(0.0))
            .unwrap_or(0.0);
        self.prev_time = Some(now_ms);

        if !self.locked {
            return FrameMotion {
                move_right: 0.0,
                move_forward: 0.0,
                height: self.height,
            };
        }

        let cfg = &self.config;
        self.velocity.x -= self.velocity.x * cfg.damping * delta;
        self.velocity.z -= self.velocity.z * cfg.damping * delta;
        self.velocity.y -= cfg.gravity * delta;

        let mut direction = Vector3::new(
            f64::from(u8::from(self.right)) - f64::from(u8::from(self.left)),
            0.0,
            f64::from(u8::from(self.forward)) - f64::from(u8::from(self.backward)),
        );
        // consistent speed on diagonals
        if direction.norm_squared() > 0.0 {
            direction.normalize_mut();
        }

        if self.forward || self.backward {
            self.velocity.z -= direction.z * cfg.move_acceleration * delta;
        }
        if self.left || self.right {
            self.velocity.x -= direction.x * cfg.move_acceleration * delta;
        }

        let motion_right = -self.velocity.x * delta;
        let motion_forward = -self.velocity.z * delta;
        self.height += self.velocity.y * delta;

        if self.height < cfg.min_height {
            self.velocity.y = 0.0;
            self.height = cfg.min_height;
            self.can_jump = true;
        }

        FrameMotion {
            move_right: motion_right,
            move_forward: motion_forward,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked_state() -> NavigationState {
        let mut nav = NavigationState::new(NavigationConfig::default(), 10.0);
        nav.lock();
        nav.update(0.0);
        nav
    }

    #[test]
    fn unlocked_state_does_not_move() {
        let mut nav = NavigationState::new(NavigationConfig::default(), 10.0);
        nav.key_down("KeyW");
        nav.update(0.0);
        let motion = nav.update(100.0);
        assert_eq!(motion.move_forward, 0.0);
        assert_eq!(motion.height, 10.0);
    }

    #[test]
    fn first_frame_has_no_elapsed_time() {
        let mut nav = NavigationState::new(NavigationConfig::default(), 10.0);
        nav.lock();
        nav.key_down("KeyW");
        let motion = nav.update(5000.0);
        assert_eq!(motion.move_forward, 0.0);
    }

    #[test]
    fn forward_key_moves_forward() {
        let mut nav = locked_state();
        assert!(nav.key_down("ArrowUp"));
        let motion = nav.update(16.0);
        assert!(motion.move_forward > 0.0);
        assert_eq!(motion.move_right, 0.0);
        assert!(nav.key_up("ArrowUp"));
        assert!(!nav.key_down("KeyQ"));
    }

    #[test]
    fn diagonal_is_normalised() {
        let mut straight = locked_state();
        straight.key_down("KeyW");
        straight.update(16.0);

        let mut diagonal = locked_state();
        diagonal.key_down("KeyW");
        diagonal.key_down("KeyD");
        diagonal.update(16.0);

        let v = diagonal.velocity();
        let speed = (v.x * v.x + v.z * v.z).sqrt();
        assert!((speed - straight.velocity().z.abs()).abs() < 1e-9);
    }

    #[test]
    fn gravity_is_clamped_at_floor() {
        let mut nav = locked_state();
        let motion = nav.update(500.0);
        assert_eq!(motion.height, 10.0);
        assert_eq!(nav.velocity().y, 0.0);
    }

    #[test]
    fn jump_only_when_grounded() {
        let mut nav = NavigationState::new(NavigationConfig::default(), 10.0);
        nav.lock();
        nav.key_down("Space");
        assert_eq!(nav.velocity().y, 0.0);

        // landing re-enables the jump
        nav.update(0.0);
        nav.update(16.0);
        nav.key_down("Space");
        assert_eq!(nav.velocity().y, 350.0);

        let motion = nav.update(32.0);
        assert!(motion.height > 10.0);

        // no double jump in the air
        nav.key_down("Space");
        assert!(nav.velocity().y < 350.0);
    }

    #[test]
    fn velocity_decays_after_release() {
        let mut nav = locked_state();
        nav.key_down("KeyA");
        nav.update(16.0);
        nav.key_up("KeyA");
        let before = nav.velocity().x.abs();
        nav.update(32.0);
        assert!(nav.velocity().x.abs() < before);
    }
}
