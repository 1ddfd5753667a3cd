//! Keeps a dragged extent inside a bounding rectangle.

use serde::{Deserialize, Serialize};

use crate::contact::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConstraint {
    pub bounds: Rect,
    pub extent: Extent,
}

impl DragConstraint {
    pub fn clamp(&self, proposed: Point) -> Point {
        clamp_position(proposed, self.bounds, self.extent)
    }
}

/// Clamps the top-left corner of `extent` so its edges stay inside `bounds`.
/// An extent larger than the bounds pins to the left/top edge.
pub fn clamp_position(proposed: Point, bounds: Rect, extent: Extent) -> Point {
    let x = bounds.left.max(proposed.x.min(bounds.right - extent.width));
    let y = bounds.top.max(proposed.y.min(bounds.bottom - extent.height));
    Point::new(x, y)
}
