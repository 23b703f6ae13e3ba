//! Drag-to-rotate state driven by discrete pointer events.

use crate::{Mat4, Vec2};

/// Radians of rotation per pixel of cursor travel.
pub const DEFAULT_SENSITIVITY: f32 = 0.01;

/// Input delivered to the frame driver. Cursor positions are in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerUp,
    PointerMove { x: f32, y: f32 },
    Quit,
}

/// Accumulated model rotation. Angles are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub dragging: bool,
    pub last_cursor: Vec2,
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one pointer event. `Quit` is not a rotation concern and is ignored.
    pub fn apply(&mut self, event: InputEvent, sensitivity: f32) {
        match event {
            InputEvent::PointerDown { x, y } if !self.dragging => {
                self.dragging = true;
                self.last_cursor = Vec2::new(x, y);
            }
            InputEvent::PointerMove { x, y } if self.dragging => {
                let cursor = Vec2::new(x, y);
                let delta = cursor - self.last_cursor;
                self.rotation_y += delta.x * sensitivity;
                self.rotation_x += delta.y * sensitivity;
                self.last_cursor = cursor;
            }
            InputEvent::PointerUp if self.dragging => {
                self.dragging = false;
            }
            _ => {}
        }
    }

    /// Model matrix = Ry(-rotation_y) * Rx(-rotation_x). A rightward drag
    /// swings the front of the model left; a downward drag tips it up.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(-self.rotation_y) * Mat4::from_rotation_x(-self.rotation_x)
    }
}
