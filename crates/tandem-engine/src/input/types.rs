#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Wheel motion as reported by the platform: notched wheels report lines,
/// trackpads report logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

impl MouseWheelDelta {
    pub const PIXELS_PER_LINE: f32 = 40.0;

    pub fn lines(self) -> (f32, f32) {
        match self {
            MouseWheelDelta::Line { x, y } => (x, y),
            MouseWheelDelta::Pixel { x, y } => (x / Self::PIXELS_PER_LINE, y / Self::PIXELS_PER_LINE),
        }
    }
}

/// Pointer position in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerMoveEvent {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerButtonEvent {
    pub button: MouseButton,
    pub state: MouseButtonState,
}

/// Input the camera controls consume, independent of the windowing backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMoved(PointerMoveEvent),
    PointerButton(PointerButtonEvent),
    MouseWheel { delta: MouseWheelDelta },
    PointerLeft,
    Focused(bool),
}
