use crate::paint::Color;

/// Lit surface with a procedural running-bond brick pattern.
///
/// The pattern tiles `repeat` times across each UV unit; each tile holds
/// `bricks` bricks (columns, rows) with every other row offset by half a brick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BrickMaterial {
    pub brick: Color,
    pub mortar: Color,
    pub repeat: [f32; 2],
    pub bricks: [f32; 2],
    /// Mortar thickness as a fraction of a brick cell.
    pub mortar_width: f32,
}

impl Default for BrickMaterial {
    fn default() -> Self {
        Self {
            brick: Color::from_hex(0x8a4b3a),
            mortar: Color::from_hex(0xb8b0a0),
            repeat: [1.0, 1.0],
            bricks: [2.0, 4.0],
            mortar_width: 0.06,
        }
    }
}

impl BrickMaterial {
    pub fn with_repeat(mut self, u: f32, v: f32) -> Self {
        self.repeat = [u, v];
        self
    }

    /// CPU evaluation of the pattern at `uv`: `true` for brick, `false` for mortar.
    /// The mesh shader implements the same rule.
    pub fn is_brick(&self, uv: [f32; 2]) -> bool {
        let x = uv[0] * self.repeat[0] * self.bricks[0];
        let y = uv[1] * self.repeat[1] * self.bricks[1];
        let row = y.floor();
        let x = if row.rem_euclid(2.0) >= 1.0 { x + 0.5 } else { x };
        let (fx, fy) = (x - x.floor(), y - row);
        let m = self.mortar_width / 2.0;
        fx > m && fx < 1.0 - m && fy > m && fy < 1.0 - m
    }
}
