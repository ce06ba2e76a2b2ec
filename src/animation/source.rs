//! Grid state that can be recorded as animation frames.

use crate::compute::{ReactionDiffusionState, VantWorld};

/// Multi-channel grid state readable by the recorder.
pub trait FrameSource {
    /// Grid `(width, height)` in cells.
    fn dimensions(&self) -> (usize, usize);

    /// Channel data, each `width * height` cells in row-major order.
    fn channels(&self) -> Vec<&[f32]>;
}

/// Owned multi-channel grid frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFrame {
    pub width: usize,
    pub height: usize,
    pub channels: Vec<Vec<f32>>,
}

impl GridFrame {
    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels: vec![vec![0.0; width * height]; channels],
        }
    }

    /// Single-channel frame wrapping `data`.
    pub fn single(width: usize, height: usize, data: Vec<f32>) -> Self {
        Self {
            width,
            height,
            channels: vec![data],
        }
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}

impl FrameSource for GridFrame {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn channels(&self) -> Vec<&[f32]> {
        self.channels.iter().map(Vec::as_slice).collect()
    }
}

/// Channels: A, B.
impl FrameSource for ReactionDiffusionState {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn channels(&self) -> Vec<&[f32]> {
        let field = self.current();
        vec![field.a.as_slice(), field.b.as_slice()]
    }
}

/// Channels: pheromones, render.
impl FrameSource for VantWorld {
    fn dimensions(&self) -> (usize, usize) {
        (self.grid.width, self.grid.height)
    }

    fn channels(&self) -> Vec<&[f32]> {
        vec![self.pheromones.as_slice(), self.render.as_slice()]
    }
}
