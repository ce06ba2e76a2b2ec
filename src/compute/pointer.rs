//! Pointer (mouse) input shared by interactive sketches.

use serde::{Deserialize, Serialize};

/// Pointer position in normalized `[0, 1]` canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
    pub pressed: bool,
}

impl Pointer {
    pub fn new(x: f32, y: f32, pressed: bool) -> Self {
        Self { x, y, pressed }
    }

    /// Position in cell units of a `width × height` grid.
    #[inline]
    pub fn to_cells(&self, width: usize, height: usize) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    /// Packed `[x, y, pressed]` uniform layout, padded to 16 bytes.
    #[inline]
    pub fn as_uniform(&self) -> [f32; 4] {
        [self.x, self.y, if self.pressed { 1.0 } else { 0.0 }, 0.0]
    }
}
