//! Viewport - the visible map rectangle and its zoom/pan transitions
//!
//! Screen rectangles handed out as projection targets are measured from the bottom-left
//! corner of the window, matching map space. The render step flips them when it
//! produces pixel coordinates.

use crate::{DataError, Rect, Result};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// Window size in pixels, both dimensions non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DataError::InvalidArgument(format!(
                "Window size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// The whole window as a screen rect
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    #[inline]
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Draw what is in `source` (map space) into `target` (screen space)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Projection {
    pub source: Rect,
    pub target: Rect,
}

impl Projection {
    /// Nothing to draw
    pub const EMPTY: Projection = Projection {
        source: Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        },
        target: Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        },
    };

    #[inline]
    pub fn new(source: Rect, target: Rect) -> Self {
        Self { source, target }
    }

    /// True when either side has no area, so nothing would be drawn
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() || self.target.is_empty()
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P[{} -> {}]", self.source, self.target)
    }
}

/// Reveal regions produced by a pan (at most one horizontal and one vertical strip)
pub type Projections = SmallVec<[Projection; 2]>;

/// Initial viewport settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewportConfig {
    /// Fraction of the map bounds shown at start. Default: 1.0 (everything)
    pub initial_zoom: f64,
    /// Width/height ratio kept by the active rect. Default: follow the window, so map
    /// and screen always share one scale factor
    pub aspect_ratio: Option<f64>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            initial_zoom: 1.0,
            aspect_ratio: None,
        }
    }
}

/// Tracks the visible map rectangle inside fixed map bounds
///
/// The active rect may leave the bounds; queries there simply return nothing.
#[derive(Debug, Clone)]
pub struct Viewport {
    bounds: Rect,
    active: Rect,
    window: WindowSize,
    aspect_ratio: Option<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Viewport {
    /// Show `config.initial_zoom` of `bounds`, centered, in a window of `window` pixels
    pub fn new(bounds: Rect, window: WindowSize, config: &ViewportConfig) -> Result<Self> {
        if !(bounds.height > 0.0 && bounds.width > 0.0) {
            return Err(DataError::InvalidArgument(format!(
                "Viewport bounds must have a positive size, got {bounds}"
            )));
        }
        if let Some(ratio) = config.aspect_ratio
            && !(ratio.is_finite() && ratio > 0.0)
        {
            return Err(DataError::InvalidArgument(format!(
                "Aspect ratio must be positive, got {ratio}"
            )));
        }

        let mut viewport = Self {
            bounds,
            active: bounds,
            window,
            aspect_ratio: config.aspect_ratio,
        };
        viewport.refit();
        viewport.zoom_by(1.0 - config.initial_zoom)?;
        Ok(viewport)
    }

    /// The currently visible map rect
    #[inline]
    pub fn shown(&self) -> Rect {
        self.active
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[inline]
    pub fn window(&self) -> WindowSize {
        self.window
    }

    /// Width/height ratio the active rect is kept at
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.aspect_ratio.unwrap_or_else(|| self.window.ratio())
    }

    /// Map units covered by one pixel
    #[inline]
    pub fn units_per_pixel(&self) -> f64 {
        self.active.height / self.window.height as f64
    }

    /// The whole active rect drawn into the whole window
    #[inline]
    pub fn projection(&self) -> Projection {
        Projection::new(self.active, self.window.rect())
    }

    /// Restore the aspect ratio by recomputing the width, keeping the bottom-left corner
    pub fn refit(&mut self) -> Projection {
        let ratio = self.ratio();
        if self.active.width / self.active.height != ratio {
            self.active = Rect::new(
                self.active.x,
                self.active.y,
                self.active.height * ratio,
                self.active.height,
            );
        }
        self.projection()
    }

    /// Zoom relative to the current view
    ///
    /// Positive factors zoom in (`0.5` halves the shown size), negative ones zoom out.
    /// Factors at or below `-1` are rejected.
    pub fn zoom_by(&mut self, factor: f64) -> Result<Projection> {
        if !(factor > -1.0) {
            return Err(DataError::InvalidArgument(format!(
                "The zoom factor should be greater than -1, got {factor}"
            )));
        }
        self.active = self.active.scaled(1.0 - factor)?;
        Ok(self.refit())
    }

    /// Show `fraction` of the map bounds, centered on the bounds' center
    pub fn zoom_to(&mut self, fraction: f64) -> Result<Projection> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(DataError::InvalidArgument(format!(
                "Absolute zoom must be between 0 and 1, got {fraction}"
            )));
        }
        self.active = self.bounds.scaled(fraction)?;
        Ok(self.refit())
    }

    /// Pan by a pixel delta and return the newly revealed regions
    ///
    /// A positive delta moves the rendered content right (`dx`) or up (`dy`), revealing
    /// map to the left or below. Each returned projection pairs a revealed map strip
    /// with the screen strip it must be drawn into. When the pan reaches a full window
    /// dimension the whole view is revealed and a single full-window projection is
    /// returned instead.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> Result<Projections> {
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(DataError::InvalidArgument(format!(
                "Pan delta must be finite, got ({dx}, {dy})"
            )));
        }
        if dx == 0.0 && dy == 0.0 {
            return Ok(Projections::new());
        }

        let width = self.window.width as f64;
        let height = self.window.height as f64;
        let upp = self.units_per_pixel();
        let old = self.active;
        let new = old.shift(-dx * upp, -dy * upp);
        self.active = new;

        if dx.abs() >= width || dy.abs() >= height {
            tracing::trace!("Pan of ({}, {}) reveals the whole view", dx, dy);
            return Ok(smallvec![self.projection()]);
        }

        let mut projections = Projections::new();
        let strip_width = dx.abs() * upp;
        let strip_height = dy.abs() * upp;

        if dx > 0.0 {
            projections.push(Projection::new(
                Rect::new(new.x, new.y, strip_width, old.height),
                Rect::new(0.0, 0.0, dx.abs(), height),
            ));
        } else if dx < 0.0 {
            projections.push(Projection::new(
                Rect::new(old.right(), new.y, strip_width, old.height),
                Rect::new(width - dx.abs(), 0.0, dx.abs(), height),
            ));
        }

        if dy > 0.0 {
            projections.push(Projection::new(
                Rect::new(new.x, new.y, old.width, strip_height),
                Rect::new(0.0, 0.0, width, dy.abs()),
            ));
        } else if dy < 0.0 {
            projections.push(Projection::new(
                Rect::new(new.x, old.top(), old.width, strip_height),
                Rect::new(0.0, height - dy.abs(), width, dy.abs()),
            ));
        }

        Ok(projections)
    }

    /// Center the view on a map coordinate, keeping its size
    pub fn center_on(&mut self, x: f64, y: f64) {
        self.active = Rect::new(
            x - self.active.width / 2.0,
            y - self.active.height / 2.0,
            self.active.width,
            self.active.height,
        );
    }

    /// Replace the active rect, then restore the aspect ratio
    pub fn set_source(&mut self, source: Rect) -> Projection {
        self.active = source;
        self.refit()
    }

    /// Change the window size, then restore the aspect ratio
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Projection> {
        self.window = WindowSize::new(width, height)?;
        Ok(self.refit())
    }

    /// Map coordinate under a pixel (screen y grows downward)
    pub fn map_point(&self, px: f64, py: f64) -> Coord<f64> {
        let rel_x = px / self.window.width as f64;
        let rel_y = py / self.window.height as f64;
        Coord {
            x: self.active.x + self.active.width * rel_x,
            y: self.active.top() - self.active.height * rel_y,
        }
    }

    /// Map rect under a screen rect given in pixels (`y` is its top edge, growing downward)
    pub fn map_area(&self, screen: &Rect) -> Rect {
        let top_left = self.map_point(screen.x, screen.y);
        let bottom_right = self.map_point(screen.right(), screen.top());
        Rect::from_corners(top_left, bottom_right)
    }
}
