use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};

/// What is held down and where the pointer is. Transitions for the current
/// frame go to an [`InputFrame`].
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Avoids stuck buttons when focus changes mid-drag.
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((x, y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::PointerButton(PointerButtonEvent { button, state }) => {
                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(button) {
                            frame.buttons_pressed.insert(button);
                        }
                    }
                    MouseButtonState::Released => {
                        if self.buttons_down.remove(&button) {
                            frame.buttons_released.insert(button);
                        }
                    }
                }
            }

            InputEvent::MouseWheel { delta } => {
                let (x, y) = delta.lines();
                frame.wheel.0 += x;
                frame.wheel.1 += y;
            }
        }
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseWheelDelta;

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved(PointerMoveEvent { x, y })
    }

    fn button(state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent { button: MouseButton::Left, state })
    }

    // ── pointer ─────────────────────────────────────────────────────────

    #[test]
    fn first_move_has_no_delta() {
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        state.apply_event(&mut frame, moved(10.0, 10.0));
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
        assert_eq!(state.pointer_pos, Some((10.0, 10.0)));
    }

    #[test]
    fn moves_accumulate_within_frame() {
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        state.apply_event(&mut frame, moved(0.0, 0.0));
        state.apply_event(&mut frame, moved(5.0, 1.0));
        state.apply_event(&mut frame, moved(7.0, -2.0));
        assert_eq!(frame.pointer_delta, (7.0, -2.0));
        frame.clear();
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
        assert!(frame.is_quiet());
    }

    // ── buttons ─────────────────────────────────────────────────────────

    #[test]
    fn press_release_transitions() {
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        state.apply_event(&mut frame, button(MouseButtonState::Pressed));
        assert!(state.button_down(MouseButton::Left));
        assert!(frame.buttons_pressed.contains(&MouseButton::Left));

        state.apply_event(&mut frame, button(MouseButtonState::Released));
        assert!(!state.button_down(MouseButton::Left));
        assert!(frame.buttons_released.contains(&MouseButton::Left));
    }

    #[test]
    fn focus_loss_releases_buttons() {
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        state.apply_event(&mut frame, button(MouseButtonState::Pressed));
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.button_down(MouseButton::Left));
    }

    // ── wheel ───────────────────────────────────────────────────────────

    #[test]
    fn wheel_pixels_convert_to_lines() {
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        state.apply_event(&mut frame, InputEvent::MouseWheel { delta: MouseWheelDelta::Line { x: 0.0, y: 1.0 } });
        state.apply_event(&mut frame, InputEvent::MouseWheel { delta: MouseWheelDelta::Pixel { x: 0.0, y: 80.0 } });
        assert_eq!(frame.wheel, (0.0, 3.0));
    }
}
