//! Note resizing from edge and corner handles.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::grid;
use crate::note::NoteId;

/// Handle a resize was started from, named by compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::NE,
        ResizeHandle::SW,
        ResizeHandle::SE,
        ResizeHandle::N,
        ResizeHandle::S,
        ResizeHandle::W,
        ResizeHandle::E,
    ];

    pub fn moves_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    pub fn moves_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    pub fn moves_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }

    pub fn moves_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    /// Handle position on a rectangle.
    pub fn position(self, bounds: Rect) -> Point {
        let center = bounds.center();
        let x = if self.moves_west() {
            bounds.x0
        } else if self.moves_east() {
            bounds.x1
        } else {
            center.x
        };
        let y = if self.moves_north() {
            bounds.y0
        } else if self.moves_south() {
            bounds.y1
        } else {
            center.y
        };
        Point::new(x, y)
    }
}

/// Resize `origin` by dragging `handle` by `delta` (world units).
///
/// Only the dragged edges move: each is snapped to `grid_size` and the
/// opposite edge stays put, even when it is off the grid. Sizes never fall
/// below `min_size`.
pub fn apply_resize(origin: Rect, handle: ResizeHandle, delta: Vec2, min_size: f64, grid_size: f64) -> Rect {
    let (x0, x1) = resize_axis(
        (origin.x0, origin.x1),
        handle.moves_west(),
        handle.moves_east(),
        delta.x,
        min_size,
        grid_size,
    );
    let (y0, y1) = resize_axis(
        (origin.y0, origin.y1),
        handle.moves_north(),
        handle.moves_south(),
        delta.y,
        min_size,
        grid_size,
    );
    Rect::new(x0, y0, x1, y1)
}

fn resize_axis(
    (lo, hi): (f64, f64),
    moves_lo: bool,
    moves_hi: bool,
    delta: f64,
    min_size: f64,
    grid_size: f64,
) -> (f64, f64) {
    if moves_lo {
        let lo = grid::snap(lo + delta, grid_size).min(hi - min_size);
        (lo, hi)
    } else if moves_hi {
        let hi = grid::snap(hi + delta, grid_size).max(lo + min_size);
        (lo, hi)
    } else {
        (lo, hi)
    }
}

/// State of an in-progress resize.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    pub id: NoteId,
    pub handle: ResizeHandle,
    /// Pointer position (world) when the resize started.
    pub start_point: Point,
    /// Note bounds when the resize started.
    pub origin: Rect,
}

impl ResizeSession {
    pub fn new(id: impl Into<NoteId>, handle: ResizeHandle, start_point: Point, origin: Rect) -> Self {
        Self {
            id: id.into(),
            handle,
            start_point,
            origin,
        }
    }

    /// Bounds for the current pointer position.
    pub fn bounds_at(&self, pointer: Point, min_size: f64, grid_size: f64) -> Rect {
        apply_resize(self.origin, self.handle, pointer - self.start_point, min_size, grid_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f64 = 160.0;
    const GRID: f64 = 20.0;

    fn origin() -> Rect {
        Rect::new(100.0, 100.0, 340.0, 340.0)
    }

    #[test]
    fn test_east_grows_width() {
        let rect = apply_resize(origin(), ResizeHandle::E, Vec2::new(38.0, 99.0), MIN, GRID);
        assert_eq!(rect, Rect::new(100.0, 100.0, 380.0, 340.0));
    }

    #[test]
    fn test_west_keeps_right_edge() {
        let rect = apply_resize(origin(), ResizeHandle::W, Vec2::new(-40.0, 0.0), MIN, GRID);
        assert_eq!(rect, Rect::new(60.0, 100.0, 340.0, 340.0));
    }

    #[test]
    fn test_north_west_corner() {
        let rect = apply_resize(origin(), ResizeHandle::NW, Vec2::new(20.0, 40.0), MIN, GRID);
        assert_eq!(rect, Rect::new(120.0, 140.0, 340.0, 340.0));
    }

    #[test]
    fn test_minimum_size_holds() {
        for handle in ResizeHandle::ALL {
            let rect = apply_resize(origin(), handle, Vec2::new(500.0, 500.0), MIN, GRID);
            assert!(rect.width() >= MIN, "{handle:?}");
            assert!(rect.height() >= MIN, "{handle:?}");
            let rect = apply_resize(origin(), handle, Vec2::new(-500.0, -500.0), MIN, GRID);
            assert!(rect.width() >= MIN, "{handle:?}");
            assert!(rect.height() >= MIN, "{handle:?}");
        }
    }

    #[test]
    fn test_west_shrink_stops_at_minimum() {
        let rect = apply_resize(origin(), ResizeHandle::W, Vec2::new(200.0, 0.0), MIN, GRID);
        assert_eq!(rect.width(), MIN);
        assert_eq!(rect.x1, 340.0);
    }

    #[test]
    fn test_minimum_off_grid_still_holds() {
        let rect = apply_resize(origin(), ResizeHandle::SE, Vec2::new(-500.0, -500.0), 165.0, GRID);
        assert_eq!(rect.width(), 165.0);
        assert_eq!(rect.height(), 165.0);
    }

    #[test]
    fn test_west_resize_of_off_grid_note_keeps_right_edge() {
        let origin = Rect::new(105.0, 95.0, 345.0, 335.0);
        let rect = apply_resize(origin, ResizeHandle::W, Vec2::new(-37.0, 0.0), MIN, GRID);
        assert_eq!(rect, Rect::new(60.0, 95.0, 345.0, 335.0));

        let rect = apply_resize(origin, ResizeHandle::NW, Vec2::new(-37.0, 12.0), MIN, GRID);
        assert_eq!(rect, Rect::new(60.0, 100.0, 345.0, 335.0));
    }

    #[test]
    fn test_east_resize_of_off_grid_note_keeps_left_edge() {
        let origin = Rect::new(105.0, 95.0, 345.0, 335.0);
        let rect = apply_resize(origin, ResizeHandle::SE, Vec2::new(20.0, 20.0), MIN, GRID);
        assert_eq!(rect, Rect::new(105.0, 95.0, 360.0, 360.0));
    }

    #[test]
    fn test_handle_positions() {
        let bounds = origin();
        assert_eq!(ResizeHandle::NW.position(bounds), Point::new(100.0, 100.0));
        assert_eq!(ResizeHandle::E.position(bounds), Point::new(340.0, 220.0));
        assert_eq!(ResizeHandle::S.position(bounds), Point::new(220.0, 340.0));
    }

    #[test]
    fn test_session_tracks_pointer() {
        let session = ResizeSession::new("a", ResizeHandle::SE, Point::new(340.0, 340.0), origin());
        let rect = session.bounds_at(Point::new(400.0, 362.0), MIN, GRID);
        assert_eq!(rect, Rect::new(100.0, 100.0, 400.0, 360.0));
    }
}
