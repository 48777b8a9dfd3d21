//! Grid snapping for note and folder positions.

use kurbo::{Point, Size};

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Round to the nearest integer, resolving exact halves towards positive infinity.
///
/// `f64::round` resolves halves away from zero, which would send `-1.5` to `-2`.
/// Grid snapping must map `-30` to `-20` on a 20 unit grid, so halves go up instead.
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Snap a single coordinate to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid size disables snapping. Negative zero is
/// normalized to positive zero so that snapped values serialize as `0`.
pub fn snap(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 || !grid_size.is_finite() || !value.is_finite() {
        return value;
    }
    let snapped = round_half_up(value / grid_size) * grid_size;
    if snapped == 0.0 { 0.0 } else { snapped }
}

/// Snap both coordinates of a point to the grid.
pub fn snap_point(point: Point, grid_size: f64) -> Point {
    Point::new(snap(point.x, grid_size), snap(point.y, grid_size))
}

/// Snap both dimensions of a size to the grid.
pub fn snap_size(size: Size, grid_size: f64) -> Size {
    Size::new(snap(size.width, grid_size), snap(size.height, grid_size))
}
