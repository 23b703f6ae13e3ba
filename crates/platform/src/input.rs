//! winit events → `InputEvent`, plus a once-per-second FPS counter.

use std::time::{Duration, Instant};

use corelib::Vec2;
use corelib::orbit::InputEvent;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Tracks the last cursor position so button presses carry coordinates.
#[derive(Debug, Default)]
pub struct InputTranslator {
    cursor: Vec2,
}

impl InputTranslator {
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> InputEvent {
        self.cursor = Vec2::new(x as f32, y as f32);
        InputEvent::PointerMove {
            x: self.cursor.x,
            y: self.cursor.y,
        }
    }

    /// Only the left button drives rotation.
    pub fn mouse_button(&self, state: ElementState, button: MouseButton) -> Option<InputEvent> {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => Some(InputEvent::PointerDown {
                x: self.cursor.x,
                y: self.cursor.y,
            }),
            (MouseButton::Left, ElementState::Released) => Some(InputEvent::PointerUp),
            _ => None,
        }
    }

    pub fn key(&self, code: KeyCode, state: ElementState) -> Option<InputEvent> {
        match (code, state) {
            (KeyCode::Escape, ElementState::Pressed) => Some(InputEvent::Quit),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            window_start: now,
        }
    }

    /// Count a frame; returns the rate once a full window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_uses_last_cursor_position() {
        let mut t = InputTranslator::default();
        assert_eq!(
            t.cursor_moved(100.0, 100.0),
            InputEvent::PointerMove { x: 100.0, y: 100.0 }
        );
        assert_eq!(
            t.mouse_button(ElementState::Pressed, MouseButton::Left),
            Some(InputEvent::PointerDown { x: 100.0, y: 100.0 })
        );
        assert_eq!(
            t.mouse_button(ElementState::Released, MouseButton::Left),
            Some(InputEvent::PointerUp)
        );
    }

    #[test]
    fn other_buttons_and_keys_are_ignored() {
        let t = InputTranslator::default();
        assert_eq!(t.mouse_button(ElementState::Pressed, MouseButton::Right), None);
        assert_eq!(t.key(KeyCode::KeyA, ElementState::Pressed), None);
        assert_eq!(t.key(KeyCode::Escape, ElementState::Released), None);
        assert_eq!(t.key(KeyCode::Escape, ElementState::Pressed), Some(InputEvent::Quit));
    }

    #[test]
    fn fps_reported_once_per_second() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        for i in 1..60 {
            assert_eq!(fps.tick(start + Duration::from_millis(i * 16)), None);
        }
        let rate = fps.tick(start + Duration::from_secs(1)).unwrap();
        assert!((rate - 60.0).abs() < 1e-3);
        assert_eq!(fps.tick(start + Duration::from_millis(1016)), None);
    }
}
