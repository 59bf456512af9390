//! Render orchestration: query, map-to-screen transform, draw-order bucketing
//!
//! The output is a flat list of integer screen-space lines in the order they must be
//! drawn. Nothing here touches a drawing surface.

use crate::quadtree::QuadIndex;
use crate::{Projection, Rect, RoadCategory, RoadSegment};

use geo::Coord;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Category to color mapping
///
/// Categories mapped to the void color (or not mapped at all) are not drawn.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderInstructions {
    mapping: HashMap<RoadCategory, Color>,
    void_color: Color,
}

impl Default for RenderInstructions {
    fn default() -> Self {
        Self::new(Color::TRANSPARENT)
            .with_mapping(RoadCategory::Highway, Color::RED)
            .with_mapping(RoadCategory::HighwayExit, Color::RED)
            .with_mapping(RoadCategory::PrimeRoute, Color::rgb(255, 170, 100))
            .with_mapping(RoadCategory::Path, Color::rgba(0, 255, 25, 200))
            .with_mapping(RoadCategory::Ferry, Color::BLUE)
            .with_mapping(RoadCategory::Other, Color::rgb(200, 200, 255))
    }
}

impl RenderInstructions {
    /// Empty mapping with the given suppression sentinel
    pub fn new(void_color: Color) -> Self {
        Self {
            mapping: HashMap::new(),
            void_color,
        }
    }

    pub fn with_mapping(mut self, category: RoadCategory, color: Color) -> Self {
        self.add_mapping(category, color);
        self
    }

    /// Map `category` to `color`, returning the previous color if any
    pub fn add_mapping(&mut self, category: RoadCategory, color: Color) -> Option<Color> {
        self.mapping.insert(category, color)
    }

    #[inline]
    pub fn void_color(&self) -> Color {
        self.void_color
    }

    /// Color for `category`, the void color when unmapped
    #[inline]
    pub fn color_for(&self, category: RoadCategory) -> Color {
        self.mapping
            .get(&category)
            .copied()
            .unwrap_or(self.void_color)
    }

    /// Categories that are actually drawn
    pub fn rendered_categories(&self) -> HashSet<RoadCategory> {
        self.mapping
            .iter()
            .filter(|(_, color)| **color != self.void_color)
            .map(|(category, _)| *category)
            .collect()
    }
}

/// A line ready for a drawing surface, in pixels with y growing downward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineDescriptor {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub color: Color,
}

/// Turns index queries into ordered screen-space lines
#[derive(Debug, Clone, Copy)]
pub struct RenderOrchestrator<'a> {
    index: &'a QuadIndex<RoadSegment>,
}

/// Uniform map-to-screen transform for one projection
struct ScreenTransform {
    map_origin: Coord<f64>,
    target_origin: Coord<f64>,
    scale: f64,
    window_height: f64,
}

impl ScreenTransform {
    fn new(map_rect: &Rect, screen_target: &Rect, window_height: f64) -> Self {
        Self {
            map_origin: Coord {
                x: map_rect.x,
                y: map_rect.y,
            },
            target_origin: Coord {
                x: screen_target.x,
                y: screen_target.y,
            },
            scale: screen_target.height / map_rect.height,
            window_height,
        }
    }

    #[inline]
    fn apply(&self, point: Coord<f64>) -> (i32, i32) {
        let x = self.target_origin.x + (point.x - self.map_origin.x) * self.scale;
        let y = self.window_height
            - (self.target_origin.y + (point.y - self.map_origin.y) * self.scale);
        (x.round() as i32, y.round() as i32)
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> RenderOrchestrator<'a> {
    /// Draw order used by the viewer: highways on top, then exits, then prime routes
    pub const DEFAULT_PRIORITY: [RoadCategory; 3] = [
        RoadCategory::Highway,
        RoadCategory::HighwayExit,
        RoadCategory::PrimeRoute,
    ];

    pub fn new(index: &'a QuadIndex<RoadSegment>) -> Self {
        Self { index }
    }

    /// Lines for every drawn segment in `map_rect`, mapped into `screen_target`
    ///
    /// # Arguments
    /// * `map_rect` - Map area to query and draw
    /// * `screen_target` - Screen area to draw into, measured from the bottom-left corner
    /// * `window_height` - Height of the whole window, used to flip the y axis
    /// * `instructions` - Colors per category
    /// * `priority` - Categories drawn on top, highest priority first
    ///
    /// Segments whose category is not in `priority` come first, in query order. Then
    /// one bucket per prioritized category follows, lowest priority first, so the
    /// highest priority is drawn last and ends up on top.
    pub fn get_lines(
        &self,
        map_rect: &Rect,
        screen_target: &Rect,
        window_height: f64,
        instructions: &RenderInstructions,
        priority: &[RoadCategory],
    ) -> Vec<LineDescriptor> {
        #[cfg(feature = "profiling")]
        profiling::scope!("render::get_lines");

        if !(map_rect.height > 0.0) {
            tracing::trace!("Skipping line generation for degenerate map rect {}", map_rect);
            return Vec::new();
        }

        let categories = instructions.rendered_categories();
        let segments = self.index.query_filtered(map_rect, &categories);
        let transform = ScreenTransform::new(map_rect, screen_target, window_height);

        let mut buckets: Vec<(RoadCategory, Vec<LineDescriptor>)> = Vec::new();
        for &category in priority {
            if !buckets.iter().any(|(c, _)| *c == category) {
                buckets.push((category, Vec::new()));
            }
        }

        let mut lines = Vec::with_capacity(segments.len());
        for segment in segments {
            let color = instructions.color_for(segment.category);
            if color == instructions.void_color() {
                continue;
            }

            let (x1, y1) = transform.apply(segment.from);
            let (x2, y2) = transform.apply(segment.to);
            let line = LineDescriptor {
                x1,
                y1,
                x2,
                y2,
                color,
            };

            match buckets.iter_mut().find(|(c, _)| *c == segment.category) {
                Some((_, bucket)) => bucket.push(line),
                None => lines.push(line),
            }
        }

        for (_, bucket) in buckets.into_iter().rev() {
            lines.extend(bucket);
        }

        tracing::trace!("Generated {} lines for {}", lines.len(), map_rect);
        lines
    }

    /// Run [`Self::get_lines`] for every non-empty projection in parallel
    ///
    /// Results are concatenated in projection order.
    pub fn lines_for_projections(
        &self,
        projections: &[Projection],
        window_height: f64,
        instructions: &RenderInstructions,
        priority: &[RoadCategory],
    ) -> Vec<LineDescriptor> {
        #[cfg(feature = "profiling")]
        profiling::scope!("render::lines_for_projections");

        let per_projection: Vec<Vec<LineDescriptor>> = projections
            .par_iter()
            .filter(|projection| !projection.is_empty())
            .map(|projection| {
                self.get_lines(
                    &projection.source,
                    &projection.target,
                    window_height,
                    instructions,
                    priority,
                )
            })
            .collect();

        per_projection.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadtree::QuadIndexBuilder;
    use crate::NodeId;

    fn segment(id: u64, from: (f64, f64), to: (f64, f64), category: RoadCategory) -> RoadSegment {
        RoadSegment::new(
            NodeId(id),
            NodeId(id + 1000),
            Coord {
                x: from.0,
                y: from.1,
            },
            Coord { x: to.0, y: to.1 },
            category,
            format!("road {id}"),
        )
    }

    fn index(segments: Vec<RoadSegment>) -> QuadIndex<RoadSegment> {
        let mut builder = QuadIndexBuilder::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2, 4).unwrap();
        for segment in segments {
            builder.insert(segment);
        }
        builder.freeze()
    }

    /// Highways and paths interleaved over the whole map
    fn mixed_index() -> QuadIndex<RoadSegment> {
        let segments = (0..20)
            .map(|i| {
                let y = 2.0 + i as f64 * 4.5;
                let category = if i % 2 == 0 {
                    RoadCategory::Highway
                } else {
                    RoadCategory::Path
                };
                segment(i, (1.0 + i as f64, y), (60.0 + i as f64, y + 1.0), category)
            })
            .collect();
        index(segments)
    }

    const MAP: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    #[test]
    fn test_default_instructions() {
        let instructions = RenderInstructions::default();
        assert_eq!(instructions.color_for(RoadCategory::Highway), Color::RED);
        assert_eq!(instructions.color_for(RoadCategory::Ferry), Color::BLUE);
        assert_eq!(instructions.rendered_categories().len(), RoadCategory::ALL.len());
        assert_eq!(instructions.void_color(), Color::TRANSPARENT);
    }

    #[test]
    fn test_void_color_suppresses_category() {
        let mut instructions = RenderInstructions::default();
        instructions.add_mapping(RoadCategory::Path, Color::TRANSPARENT);
        assert!(!instructions.rendered_categories().contains(&RoadCategory::Path));

        let index = mixed_index();
        let lines = RenderOrchestrator::new(&index).get_lines(&MAP, &MAP, 100.0, &instructions, &[]);
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.color == Color::RED));
    }

    #[test]
    fn test_transform_flips_y_and_scales() {
        let index = index(vec![segment(1, (10.0, 20.0), (30.0, 40.0), RoadCategory::Other)]);
        let target = Rect::new(0.0, 0.0, 200.0, 200.0);

        let lines = RenderOrchestrator::new(&index).get_lines(
            &MAP,
            &target,
            200.0,
            &RenderInstructions::default(),
            &[],
        );
        assert_eq!(lines.len(), 1);
        let line = lines[0];
        assert_eq!((line.x1, line.y1), (20, 160));
        assert_eq!((line.x2, line.y2), (60, 120));
        assert_eq!(line.color, Color::rgb(200, 200, 255));
    }

    #[test]
    fn test_transform_with_offset_target_rounds() {
        let index = index(vec![segment(1, (10.0, 10.0), (10.5, 10.25), RoadCategory::Ferry)]);
        let map_rect = Rect::new(10.0, 10.0, 4.0, 4.0);
        let target = Rect::new(100.0, 50.0, 10.0, 10.0);

        let lines = RenderOrchestrator::new(&index).get_lines(
            &map_rect,
            &target,
            200.0,
            &RenderInstructions::default(),
            &[],
        );
        assert_eq!(lines.len(), 1);
        // scale 2.5: (10.5, 10.25) -> (101.25, 200 - 50.625)
        assert_eq!(
            lines[0],
            LineDescriptor {
                x1: 100,
                y1: 150,
                x2: 101,
                y2: 149,
                color: Color::BLUE
            }
        );
    }

    #[test]
    fn test_priority_category_drawn_last() {
        let index = mixed_index();
        let lines = RenderOrchestrator::new(&index).get_lines(
            &MAP,
            &MAP,
            100.0,
            &RenderInstructions::default(),
            &[RoadCategory::Highway],
        );
        assert_eq!(lines.len(), 20);

        let path_color = Color::rgba(0, 255, 25, 200);
        let first_highway = lines
            .iter()
            .position(|l| l.color == Color::RED)
            .expect("highways should be drawn");
        assert!(
            lines[..first_highway].iter().all(|l| l.color == path_color),
            "all paths must come before the first highway"
        );
        assert!(lines[first_highway..].iter().all(|l| l.color == Color::RED));
    }

    #[test]
    fn test_buckets_follow_reverse_priority() {
        let index = index(vec![
            segment(1, (10.0, 10.0), (20.0, 20.0), RoadCategory::Highway),
            segment(2, (30.0, 30.0), (40.0, 40.0), RoadCategory::PrimeRoute),
            segment(3, (50.0, 50.0), (60.0, 60.0), RoadCategory::Ferry),
            segment(4, (70.0, 70.0), (80.0, 80.0), RoadCategory::Highway),
        ]);
        let lines = RenderOrchestrator::new(&index).get_lines(
            &MAP,
            &MAP,
            100.0,
            &RenderInstructions::default(),
            &[RoadCategory::Highway, RoadCategory::PrimeRoute, RoadCategory::Highway],
        );

        let colors: Vec<Color> = lines.iter().map(|l| l.color).collect();
        assert_eq!(
            colors,
            vec![Color::BLUE, Color::rgb(255, 170, 100), Color::RED, Color::RED]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let index = mixed_index();
        let orchestrator = RenderOrchestrator::new(&index);
        let instructions = RenderInstructions::default();
        let first = orchestrator.get_lines(
            &MAP,
            &MAP,
            100.0,
            &instructions,
            &RenderOrchestrator::DEFAULT_PRIORITY,
        );
        let second = orchestrator.get_lines(
            &MAP,
            &MAP,
            100.0,
            &instructions,
            &RenderOrchestrator::DEFAULT_PRIORITY,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_map_rect_yields_nothing() {
        let index = mixed_index();
        let lines = RenderOrchestrator::new(&index).get_lines(
            &Rect::new(50.0, 50.0, 0.0, 0.0),
            &MAP,
            100.0,
            &RenderInstructions::default(),
            &[],
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn test_lines_for_projections_keeps_order() {
        let index = index(vec![
            segment(1, (5.0, 5.0), (6.0, 6.0), RoadCategory::Highway),
            segment(2, (95.0, 95.0), (96.0, 96.0), RoadCategory::Ferry),
        ]);
        let projections = [
            Projection::new(Rect::new(90.0, 90.0, 10.0, 10.0), Rect::new(0.0, 0.0, 10.0, 10.0)),
            Projection::EMPTY,
            Projection::new(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 10.0, 10.0)),
        ];

        let lines = RenderOrchestrator::new(&index).lines_for_projections(
            &projections,
            10.0,
            &RenderInstructions::default(),
            &[],
        );
        let colors: Vec<Color> = lines.iter().map(|l| l.color).collect();
        assert_eq!(colors, vec![Color::BLUE, Color::RED]);
    }
}
