use std::collections::HashSet;

use super::types::MouseButton;

/// Input accumulated since the last frame. The runtime clears it after
/// every `on_frame`.
#[derive(Debug, Default)]
pub struct InputFrame {
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,
    /// Logical pixels.
    pub pointer_delta: (f32, f32),
    /// Lines.
    pub wheel: (f32, f32),
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel = (0.0, 0.0);
    }

    /// Nothing moved or changed this frame.
    pub fn is_quiet(&self) -> bool {
        self.buttons_pressed.is_empty()
            && self.buttons_released.is_empty()
            && self.pointer_delta == (0.0, 0.0)
            && self.wheel == (0.0, 0.0)
    }
}
