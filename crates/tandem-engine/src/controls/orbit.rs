use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::input::{InputFrame, InputState, MouseButton};
use crate::scene::PerspectiveCamera;

const EPS: f32 = 1e-6;
/// Smallest camera displacement reported as movement.
const MOVE_EPS: f32 = 1e-5;

/// Spherical coordinates around a target, y up. `theta` is measured from +z
/// towards +x, `phi` from +y.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius < EPS {
            return Self { radius: 0.0, theta: 0.0, phi: 0.0 };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }
}

/// Orbits a camera around `target`.
///
/// Left-drag rotates, the wheel dollies. With damping enabled, rotation keeps
/// easing out over the following frames; call [`update`](Self::update) once
/// per frame even without input.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    viewport_height: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            viewport_height: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max.max(min);
        self
    }

    /// Height in logical pixels; a full-height drag rotates one turn.
    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Moves the camera towards the target by `factor` (< 1 is closer).
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.scale *= factor;
        }
    }

    /// Consumes this frame's pointer drag and wheel.
    pub fn handle_input(&mut self, frame: &InputFrame, state: &InputState) {
        if frame.is_quiet() {
            return;
        }
        if state.button_down(MouseButton::Left) {
            let (dx, dy) = frame.pointer_delta;
            self.rotate_left(TAU * dx / self.viewport_height * self.rotate_speed);
            self.rotate_up(TAU * dy / self.viewport_height * self.rotate_speed);
        }

        let lines = frame.wheel.1;
        if lines != 0.0 {
            self.dolly(0.95f32.powf(lines * self.zoom_speed));
        }
    }

    /// Applies pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut s = Spherical::from_offset(camera.position - self.target);

        if self.enable_damping {
            s.theta += self.delta_theta * self.damping_factor;
            s.phi += self.delta_phi * self.damping_factor;
        } else {
            s.theta += self.delta_theta;
            s.phi += self.delta_phi;
        }
        s.phi = s.phi.clamp(EPS, PI - EPS);
        s.radius = (s.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + s.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > MOVE_EPS * MOVE_EPS
    }
}
