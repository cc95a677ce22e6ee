//! Geometry primitives shared by the placement solver and the renderers.
//!
//! All coordinates are page coordinates in abstract layout units (terminal
//! cells for the bundled TUI renderer). Values are signed: tooltip offsets
//! routinely land above or left of their reference rect.

use serde::{Deserialize, Serialize};

/// Measured extent of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A positioned region in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        top: 0,
        left: 0,
        width: 0,
        height: 0,
    };

    pub fn new(top: i32, left: i32, width: i32, height: i32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Translate by a parent offset.
    pub fn offset_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            ..*self
        }
    }
}

/// Snapshot of the visible area. Queried at placement time, never cached
/// across resizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}
