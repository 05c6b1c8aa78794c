use glam::Vec3;

use crate::paint::Color;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }

    /// Linear radiance contributed to every surface.
    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(Color::WHITE, 0.0)
    }
}

/// Light arriving along parallel rays from `position` toward `target`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::Y,
            target: Vec3::ZERO,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn look_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Unit vector from surfaces toward the light.
    pub fn direction_to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or(Vec3::Y)
    }

    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_points_toward_light() {
        let light = DirectionalLight::new(Color::WHITE, 1.0)
            .with_position(Vec3::new(20.0, 2.0, 5.0))
            .look_at(Vec3::ZERO);
        let dir = light.direction_to_light();
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.x > 0.9);
    }

    #[test]
    fn degenerate_direction_falls_back_to_up() {
        let light = DirectionalLight::new(Color::WHITE, 1.0).with_position(Vec3::ZERO);
        assert_eq!(light.direction_to_light(), Vec3::Y);
    }

    #[test]
    fn radiance_scales_color() {
        let ambient = AmbientLight::new(Color::WHITE, 0.2);
        assert!((ambient.radiance().g - 0.2).abs() < 1e-6);
    }
}
