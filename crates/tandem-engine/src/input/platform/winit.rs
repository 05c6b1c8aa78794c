use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitButton, MouseScrollDelta, WindowEvent};

use crate::input::{
    InputEvent, MouseButton, MouseButtonState, MouseWheelDelta, PointerButtonEvent, PointerMoveEvent,
};

/// Maps the winit events the controls care about; everything else is `None`.
///
/// Positions are converted to logical pixels with `scale_factor`.
pub fn translate_window_event(scale_factor: f64, event: &WindowEvent) -> Option<InputEvent> {
    let event = match event {
        WindowEvent::Focused(focused) => InputEvent::Focused(*focused),
        WindowEvent::CursorLeft { .. } => InputEvent::PointerLeft,
        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = logical(scale_factor, *position);
            InputEvent::PointerMoved(PointerMoveEvent { x, y })
        }
        WindowEvent::MouseInput { state, button, .. } => InputEvent::PointerButton(PointerButtonEvent {
            button: button_of(*button),
            state: match state {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            },
        }),
        WindowEvent::MouseWheel { delta, .. } => InputEvent::MouseWheel {
            delta: match delta {
                MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                MouseScrollDelta::PixelDelta(p) => {
                    let (x, y) = logical(scale_factor, *p);
                    MouseWheelDelta::Pixel { x, y }
                }
            },
        },
        _ => return None,
    };
    Some(event)
}

fn logical(scale_factor: f64, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let pos = pos.to_logical::<f64>(scale_factor);
    (pos.x as f32, pos.y as f32)
}

fn button_of(button: WinitButton) -> MouseButton {
    match button {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Middle => MouseButton::Middle,
        WinitButton::Back => MouseButton::Other(3),
        WinitButton::Forward => MouseButton::Other(4),
        WinitButton::Other(v) => MouseButton::Other(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_positions_become_logical() {
        let event = WindowEvent::CursorMoved {
            // SAFETY: the id is only compared, never passed back to the platform.
            device_id: unsafe { winit::event::DeviceId::dummy() },
            position: PhysicalPosition::new(200.0, 100.0),
        };
        assert_eq!(
            translate_window_event(2.0, &event),
            Some(InputEvent::PointerMoved(PointerMoveEvent { x: 100.0, y: 50.0 }))
        );
    }

    #[test]
    fn unrelated_events_are_dropped() {
        assert_eq!(translate_window_event(1.0, &WindowEvent::CloseRequested), None);
    }
}
