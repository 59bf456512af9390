//! Axis-aligned rectangle primitive shared by the index, the viewport and the renderer
//!
//! Map space has its y axis pointing up: `bottom = y` and `top = y + height`.

use crate::{DataError, Result};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immutable axis-aligned rectangle
///
/// All transforms return a new `Rect`. Width and height are never negative:
/// [`Rect::new`] is the trusted constructor for values the crate computes itself and
/// only checks this in debug builds, while input from outside goes through
/// [`Rect::try_new`]. Fields are public so rects can be built in const context; code
/// writing them directly takes over the same obligation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its bottom-left corner and size
    ///
    /// Use [`Rect::try_new`] for untrusted input.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        debug_assert!(
            width >= 0.0 && height >= 0.0,
            "Rect size must be non-negative, got {width}x{height}"
        );
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle, rejecting negative or non-finite dimensions
    pub fn try_new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        let finite = x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite();
        if !finite || width < 0.0 || height < 0.0 {
            return Err(DataError::InvalidGeometry(format!(
                "Malformed rect ({x}, {y}, {width}, {height})"
            )));
        }
        Ok(Self::new(x, y, width, height))
    }

    /// Smallest rectangle enclosing two points
    #[inline]
    pub fn from_corners(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when the rect has zero width or zero height
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Strict (open-interval) overlap test
    ///
    /// Rectangles that only share an edge do not collide.
    #[inline]
    pub fn collides_with(&self, other: &Rect) -> bool {
        self.right() > other.left()
            && self.left() < other.right()
            && self.top() > other.bottom()
            && self.bottom() < other.top()
    }

    /// Whether `other` lies fully inside this rect (edges may touch)
    #[inline]
    pub fn contains(&self, other: &Rect) -> bool {
        !(other.top() > self.top()
            || other.bottom() < self.bottom()
            || other.left() < self.left()
            || other.right() > self.right())
    }

    /// Scale width and height by `factor`, keeping the same center
    pub fn scaled(&self, factor: f64) -> Result<Rect> {
        // `!(factor >= 0.0)` also rejects NaN
        if !(factor >= 0.0) {
            return Err(DataError::InvalidArgument(format!(
                "The scale factor may not be negative ({factor})"
            )));
        }
        let width = self.width * factor;
        let height = self.height * factor;
        let half_dw = (self.width - width) / 2.0;
        let half_dh = (self.height - height) / 2.0;
        Ok(Rect::new(self.x + half_dw, self.y + half_dh, width, height))
    }

    /// Translate by `(dx, dy)`
    #[inline]
    pub fn shift(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow by `margin` on every side
    #[inline]
    pub fn padded(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Move the bottom-left corner to `(x, y)`
    #[inline]
    pub fn shift_to(&self, x: f64, y: f64) -> Rect {
        Rect::new(x, y, self.width, self.height)
    }

    /// The four quadrants of this rect, in NW, NE, SW, SE order
    pub(crate) fn quadrants(&self) -> [Rect; 4] {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let mid_x = self.x + half_w;
        let mid_y = self.y + half_h;
        [
            Rect::new(self.x, mid_y, half_w, half_h),
            Rect::new(mid_x, mid_y, half_w, half_h),
            Rect::new(self.x, self.y, half_w, half_h),
            Rect::new(mid_x, self.y, half_w, half_h),
        ]
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}

impl From<geo::Rect<f64>> for Rect {
    fn from(rect: geo::Rect<f64>) -> Self {
        let min = rect.min();
        Rect::new(min.x, min.y, rect.width(), rect.height())
    }
}

impl From<Rect> for geo::Rect<f64> {
    fn from(rect: Rect) -> Self {
        geo::Rect::new(
            Coord {
                x: rect.left(),
                y: rect.bottom(),
            },
            Coord {
                x: rect.right(),
                y: rect.top(),
            },
        )
    }
}
