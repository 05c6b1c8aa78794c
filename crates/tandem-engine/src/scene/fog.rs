use crate::paint::Color;

/// Linear-range fog: no fog before `near`, full fog color at `far`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn new(color: Color, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }

    /// Fog weight at view distance `d`, smoothstepped between near and far.
    /// The mesh shader evaluates the same expression.
    pub fn factor(&self, d: f32) -> f32 {
        if self.far <= self.near {
            return if d >= self.far { 1.0 } else { 0.0 };
        }
        let t = ((d - self.near) / (self.far - self.near)).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_is_zero_before_near_and_one_after_far() {
        let fog = Fog::new(Color::BLACK, 1.0, 10.0);
        assert_eq!(fog.factor(0.5), 0.0);
        assert_eq!(fog.factor(1.0), 0.0);
        assert_eq!(fog.factor(10.0), 1.0);
        assert_eq!(fog.factor(50.0), 1.0);
        assert!((fog.factor(5.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_range_is_a_step() {
        let fog = Fog::new(Color::BLACK, 5.0, 5.0);
        assert_eq!(fog.factor(4.9), 0.0);
        assert_eq!(fog.factor(5.0), 1.0);
    }
}
