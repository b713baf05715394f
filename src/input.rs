use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pointer and scroll-wheel state, accumulated from window events.
///
/// Deltas accumulate across all events of a frame and are cleared by
/// [`end_frame`](Self::end_frame) after the frame callback has consumed them.
pub struct Input {
    buttons_down: HashSet<MouseButton>,
    cursor_position: Vec2,
    cursor_delta: Vec2,
    scroll_delta: Vec2,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            buttons_down: HashSet::new(),
            cursor_position: Vec2::ZERO,
            cursor_delta: Vec2::ZERO,
            scroll_delta: Vec2::ZERO,
        }
    }
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a window event into the current state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let next = Vec2::new(position.x as f32, position.y as f32);
                self.cursor_delta += next - self.cursor_position;
                self.cursor_position = next;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
            }
            _ => {}
        }
    }

    /// Clear the per-frame deltas. Call once per frame, after the frame
    /// callback has run.
    pub fn end_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// True while the given mouse button is held.
    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Cursor position in window coordinates.
    pub fn cursor_position(&self) -> Vec2 {
        self.cursor_position
    }

    /// Cursor movement accumulated this frame.
    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    /// Scroll wheel movement accumulated this frame, in lines.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    fn cursor_moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: DeviceId::dummy(),
            position: PhysicalPosition::new(x, y),
        }
    }

    #[test]
    fn cursor_delta_accumulates_within_a_frame() {
        let mut input = Input::new();
        input.handle_event(&cursor_moved(10.0, 10.0));
        input.handle_event(&cursor_moved(15.0, 12.0));
        assert_eq!(input.cursor_delta(), Vec2::new(15.0, 12.0));
        assert_eq!(input.cursor_position(), Vec2::new(15.0, 12.0));
    }

    #[test]
    fn end_frame_clears_deltas_but_not_position() {
        let mut input = Input::new();
        input.handle_event(&cursor_moved(10.0, 10.0));
        input.handle_event(&WindowEvent::MouseWheel {
            device_id: DeviceId::dummy(),
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: winit::event::TouchPhase::Moved,
        });
        input.end_frame();
        assert_eq!(input.cursor_delta(), Vec2::ZERO);
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
        assert_eq!(input.cursor_position(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn buttons_track_press_and_release() {
        let mut input = Input::new();
        input.handle_event(&WindowEvent::MouseInput {
            device_id: DeviceId::dummy(),
            state: ElementState::Pressed,
            button: MouseButton::Left,
        });
        assert!(input.button_down(MouseButton::Left));
        input.handle_event(&WindowEvent::MouseInput {
            device_id: DeviceId::dummy(),
            state: ElementState::Released,
            button: MouseButton::Left,
        });
        assert!(!input.button_down(MouseButton::Left));
    }
}
