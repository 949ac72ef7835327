use compute_shader_harness::winit::{
    event::KeyEvent,
    keyboard::{KeyCode, PhysicalKey},
};
use glam::{vec3, Vec3};
use std::collections::HashSet;

/// Units per second.
const SPEED: f32 = 3.0;

/// Free-flying camera driven by WASD (horizontal) and QE (vertical).
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pressed: HashSet<KeyCode>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: vec3(0.0, 1.0, -4.0),
            target: Vec3::ZERO,
            pressed: HashSet::new(),
        }
    }
}

impl Camera {
    pub fn keyboard_input(&mut self, key: &KeyEvent) {
        let PhysicalKey::Code(code) = key.physical_key else {
            return;
        };
        self.set_pressed(code, key.state.is_pressed());
    }

    fn set_pressed(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(code);
        } else {
            self.pressed.remove(&code);
        }
    }

    /// Movement direction from the held keys, in camera space
    /// (x right, y up, z forward).
    fn direction(&self) -> Vec3 {
        let axis = |positive: KeyCode, negative: KeyCode| {
            f32::from(self.pressed.contains(&positive)) - f32::from(self.pressed.contains(&negative))
        };
        vec3(
            axis(KeyCode::KeyD, KeyCode::KeyA),
            axis(KeyCode::KeyE, KeyCode::KeyQ),
            axis(KeyCode::KeyW, KeyCode::KeyS),
        )
    }

    /// Move position and target together so the view direction is kept.
    pub fn update(&mut self, dt: f32) {
        let direction = self.direction();
        if direction == Vec3::ZERO {
            return;
        }
        let forward = (self.target - self.position).normalize_or(Vec3::Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let delta =
            (right * direction.x + Vec3::Y * direction.y + forward * direction.z) * SPEED * dt;
        self.position += delta;
        self.target += delta;
    }
}
