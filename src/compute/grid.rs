//! Index math between 2D grid coordinates, float positions and flat buffers.

/// Row-major mapping for a `width × height` toroidal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIndex {
    pub width: usize,
    pub height: usize,
}

impl GridIndex {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of an in-bounds cell.
    #[inline]
    pub fn flat(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Cell coordinates of a flat index.
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    /// Flat index of a possibly out-of-bounds cell, wrapping both axes.
    #[inline]
    pub fn wrap(&self, x: i64, y: i64) -> usize {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.flat(x, y)
    }

    /// Flat index of the cell under a float position.
    ///
    /// Positions are floored to cells and wrapped on both axes, so any finite
    /// position addresses a valid cell.
    #[inline]
    pub fn from_position(&self, pos: [f32; 2]) -> usize {
        self.wrap(pos[0].floor() as i64, pos[1].floor() as i64)
    }

    /// Wrap a float position into `[0, width) × [0, height)`.
    #[inline]
    pub fn wrap_position(&self, pos: [f32; 2]) -> [f32; 2] {
        [
            pos[0].rem_euclid(self.width as f32),
            pos[1].rem_euclid(self.height as f32),
        ]
    }
}

/// Workgroups needed to cover `extent` items with groups of `workgroup_size`.
#[inline]
pub fn workgroups_for(extent: u32, workgroup_size: u32) -> u32 {
    extent.div_ceil(workgroup_size)
}

/// Linear invocation index for a global invocation id.
///
/// `row_width` must be the global x extent (`dispatch.x * workgroup_size`) so
/// that distinct invocations map to distinct indices.
#[inline]
pub fn invocation_index(global_id: [u32; 3], row_width: u32) -> u32 {
    global_id[0] + global_id[1] * row_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_wrap_negative() {
        let grid = GridIndex::new(10, 5);
        assert_eq!(grid.wrap(-1, 0), 9);
        assert_eq!(grid.wrap(0, -1), 40);
        assert_eq!(grid.wrap(10, 5), 0);
    }

    #[test]
    fn test_workgroups_round_up() {
        assert_eq!(workgroups_for(64, 8), 8);
        assert_eq!(workgroups_for(65, 8), 9);
        assert_eq!(workgroups_for(1, 8), 1);
    }

    #[test]
    fn test_invocation_indices_are_distinct() {
        // dispatch [2, 1, 1] with 8x8 workgroups: 16 x 8 invocations.
        let row_width = 2 * 8;
        let mut seen = HashSet::new();
        for y in 0..8 {
            for x in 0..16 {
                assert!(seen.insert(invocation_index([x, y, 0], row_width)));
            }
        }
        assert_eq!(seen.len(), 128);
        assert_eq!(seen.iter().max(), Some(&127));
    }

    proptest! {
        #[test]
        fn prop_flat_coords_roundtrip(
            w in 1usize..200,
            h in 1usize..200,
            x in 0usize..200,
            y in 0usize..200,
        ) {
            let grid = GridIndex::new(w, h);
            let (x, y) = (x % w, y % h);
            prop_assert_eq!(grid.coords(grid.flat(x, y)), (x, y));
        }

        #[test]
        fn prop_position_always_in_bounds(
            w in 1usize..300,
            h in 1usize..300,
            px in -1e5f32..1e5f32,
            py in -1e5f32..1e5f32,
        ) {
            let grid = GridIndex::new(w, h);
            prop_assert!(grid.from_position([px, py]) < grid.len());
            let [wx, wy] = grid.wrap_position([px, py]);
            prop_assert!(wx >= 0.0 && wx <= w as f32);
            prop_assert!(wy >= 0.0 && wy <= h as f32);
        }
    }
}
