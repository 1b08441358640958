use crate::core::Vec2;
use serde::{Deserialize, Serialize};

/// Spatially indexed gaze correction.
///
/// A `res_x * res_y` lattice of offsets spans the window; the correction at
/// any point is the bilinear blend of the four surrounding nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftGrid {
    res_x: usize,
    res_y: usize,
    extent: Vec2,
    offsets: Vec<Vec2>,
}

impl DriftGrid {
    pub fn new(res_x: usize, res_y: usize, extent: Vec2) -> Self {
        let res_x = res_x.max(2);
        let res_y = res_y.max(2);
        Self {
            res_x,
            res_y,
            extent,
            offsets: vec![Vec2::ZERO; res_x * res_y],
        }
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.res_x, self.res_y)
    }

    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    /// Resize the covered area (window pixels). Offsets are kept.
    pub fn set_extent(&mut self, extent: Vec2) {
        self.extent = extent;
    }

    pub fn is_identity(&self) -> bool {
        self.offsets.iter().all(|o| *o == Vec2::ZERO)
    }

    pub fn offset_at_node(&self, ix: usize, iy: usize) -> Vec2 {
        self.offsets[iy * self.res_x + ix]
    }

    /// Lattice cell and in-cell fractions for a point
    fn locate(&self, p: Vec2) -> (usize, usize, f64, f64) {
        let u = axis(p.x, self.extent.x) * (self.res_x - 1) as f64;
        let v = axis(p.y, self.extent.y) * (self.res_y - 1) as f64;
        let ix = (u.floor() as usize).min(self.res_x - 2);
        let iy = (v.floor() as usize).min(self.res_y - 2);
        (ix, iy, u - ix as f64, v - iy as f64)
    }

    fn corners(&self, ix: usize, iy: usize, fx: f64, fy: f64) -> [(usize, f64); 4] {
        let i00 = iy * self.res_x + ix;
        [
            (i00, (1.0 - fx) * (1.0 - fy)),
            (i00 + 1, fx * (1.0 - fy)),
            (i00 + self.res_x, (1.0 - fx) * fy),
            (i00 + self.res_x + 1, fx * fy),
        ]
    }

    pub fn offset_at(&self, p: Vec2) -> Vec2 {
        let (ix, iy, fx, fy) = self.locate(p);
        self.corners(ix, iy, fx, fy)
            .iter()
            .fold(Vec2::ZERO, |acc, (i, w)| acc + self.offsets[*i] * *w)
    }

    /// Corrected position of a raw gaze point
    pub fn apply(&self, p: Vec2) -> Vec2 {
        p + self.offset_at(p)
    }

    /// Raw position that `apply` maps onto `p`. Fixed-point iteration; exact
    /// for constant offsets, close for smooth grids.
    pub fn invert(&self, p: Vec2) -> Vec2 {
        let mut q = p;
        for _ in 0..8 {
            q = p - self.offset_at(q);
        }
        q
    }

    /// Add `offset` around `p`, spread over the surrounding nodes by their
    /// bilinear weights
    pub fn accumulate(&mut self, p: Vec2, offset: Vec2) {
        let (ix, iy, fx, fy) = self.locate(p);
        for (i, w) in self.corners(ix, iy, fx, fy) {
            self.offsets[i] += offset * w;
        }
    }

    pub fn reset(&mut self) {
        self.offsets.iter_mut().for_each(|o| *o = Vec2::ZERO);
    }
}

fn axis(value: f64, extent: f64) -> f64 {
    if extent <= 0.0 {
        0.0
    } else {
        (value / extent).clamp(0.0, 1.0)
    }
}

impl Default for DriftGrid {
    fn default() -> Self {
        Self::new(5, 5, Vec2::new(1280.0, 720.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let grid = DriftGrid::default();
        let p = Vec2::new(123.0, 456.0);
        assert_eq!(grid.apply(p), p);
        assert_eq!(grid.invert(p), p);
    }

    #[test]
    fn test_accumulate_at_node_is_exact() {
        let mut grid = DriftGrid::new(3, 3, Vec2::new(200.0, 200.0));
        grid.accumulate(Vec2::new(100.0, 100.0), Vec2::new(10.0, -5.0));
        assert_eq!(grid.offset_at_node(1, 1), Vec2::new(10.0, -5.0));
        assert_eq!(grid.apply(Vec2::new(100.0, 100.0)), Vec2::new(110.0, 95.0));
        // halfway to an untouched node
        assert_eq!(grid.offset_at(Vec2::new(150.0, 100.0)), Vec2::new(5.0, -2.5));
    }

    #[test]
    fn test_invert_undoes_apply() {
        let mut grid = DriftGrid::new(4, 4, Vec2::new(300.0, 300.0));
        for ix in 0..4 {
            for iy in 0..4 {
                grid.accumulate(Vec2::new(ix as f64 * 100.0, iy as f64 * 100.0), Vec2::new(6.0, 3.0));
            }
        }
        let p = Vec2::new(140.0, 60.0);
        let back = grid.invert(grid.apply(p));
        assert!(back.distance(p) < 1e-6);
    }

    #[test]
    fn test_reset() {
        let mut grid = DriftGrid::default();
        grid.accumulate(Vec2::new(10.0, 10.0), Vec2::new(1.0, 1.0));
        assert!(!grid.is_identity());
        grid.reset();
        assert!(grid.is_identity());
    }
}
