//! Scripted viewing session over a synthetic street grid
//!
//! Stands in for an interactive window: every step performs the viewport transition a
//! user action would trigger and regenerates the lines that action makes visible.

use crate::settings::Settings;
use geo::Coord;
use roadmap_lib::{
    DataError, LoadContext, NodeId, Projection, Rect, RenderInstructions, RenderOrchestrator,
    RoadCategory, RoadNetwork, SegmentRecord, Viewport, WindowSize,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// What a session produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Full redraws
    pub frames: usize,
    /// Partial redraws after pans
    pub reveal_regions: usize,
    /// Lines handed to the drawing surface in total
    pub lines: usize,
}

/// Build a jittered grid of `size` x `size` intersections
///
/// Every tenth row is a highway with an exit ramp at each prime-route crossing, every
/// fifth column is a prime route, one diagonal ferry crosses the map and the rest are
/// paths and minor roads.
pub fn synthetic_grid(size: u64, spacing: f64) -> Result<(LoadContext, Vec<SegmentRecord>)> {
    if size < 2 {
        return Err(SessionError::InvalidSettings(format!(
            "Grid size must be at least 2, got {size}"
        )));
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(SessionError::InvalidSettings(format!(
            "Grid spacing must be positive, got {spacing}"
        )));
    }

    let id = |row: u64, col: u64| NodeId(row * size + col);
    let jitter = spacing * 0.15;
    let position = |row: u64, col: u64| Coord {
        x: col as f64 * spacing + ((row * 7 + col * 13) % 17) as f64 / 17.0 * jitter,
        y: row as f64 * spacing + ((row * 11 + col * 5) % 19) as f64 / 19.0 * jitter,
    };

    let mut context = LoadContext::new();
    let mut records = Vec::new();

    for row in 0..size {
        let nodes: Vec<_> = (0..size)
            .map(|col| (id(row, col), position(row, col)))
            .collect();
        let (category, name) = if row % 10 == 0 {
            (RoadCategory::Highway, format!("Highway {}", row / 10 + 1))
        } else {
            (RoadCategory::Path, format!("Path {row}"))
        };
        records.extend(context.intern_polyline(&nodes, category, &name)?);
    }

    for col in 0..size {
        let nodes: Vec<_> = (0..size)
            .map(|row| (id(row, col), position(row, col)))
            .collect();
        let (category, name) = if col % 5 == 0 {
            (RoadCategory::PrimeRoute, format!("Route {col}"))
        } else {
            (RoadCategory::Other, format!("Street {col}"))
        };
        records.extend(context.intern_polyline(&nodes, category, &name)?);
    }

    // Exit ramps from highways onto the next intersection of each prime route
    for row in (0..size - 1).step_by(10) {
        for col in (0..size - 1).step_by(5) {
            records.push(SegmentRecord {
                source: id(row, col),
                target: id(row + 1, col + 1),
                category: RoadCategory::HighwayExit,
                name: format!("Exit {row}/{col}"),
            });
        }
    }

    records.push(SegmentRecord {
        source: id(0, 0),
        target: id(size - 1, size - 1),
        category: RoadCategory::Ferry,
        name: "Ferry".to_string(),
    });

    Ok((context, records))
}

/// Replays a fixed script of viewport actions
pub struct Session<'a> {
    network: &'a RoadNetwork,
    viewport: Viewport,
    instructions: RenderInstructions,
    report: SessionReport,
}

impl<'a> Session<'a> {
    pub fn new(network: &'a RoadNetwork, settings: &Settings) -> Result<Self> {
        let window = WindowSize::new(settings.width, settings.height)?;
        let viewport = Viewport::new(network.bounds(), window, &settings.viewport_config())?;
        Ok(Self {
            network,
            viewport,
            instructions: RenderInstructions::default(),
            report: SessionReport::default(),
        })
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    fn orchestrator(&self) -> RenderOrchestrator<'a> {
        RenderOrchestrator::new(self.network.index())
    }

    fn window_height(&self) -> f64 {
        self.viewport.window().height as f64
    }

    /// Regenerate every line of the current view
    pub fn redraw(&mut self, projection: Projection) -> usize {
        let lines = self.orchestrator().get_lines(
            &projection.source,
            &projection.target,
            self.window_height(),
            &self.instructions,
            &RenderOrchestrator::DEFAULT_PRIORITY,
        );
        self.report.frames += 1;
        self.report.lines += lines.len();
        tracing::debug!("Redraw of {} produced {} lines", projection.source, lines.len());
        lines.len()
    }

    /// Pan and regenerate only the revealed strips
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<usize> {
        let projections = self.viewport.move_by(dx, dy)?;
        let lines = self.orchestrator().lines_for_projections(
            &projections,
            self.window_height(),
            &self.instructions,
            &RenderOrchestrator::DEFAULT_PRIORITY,
        );
        self.report.reveal_regions += projections.len();
        self.report.lines += lines.len();
        tracing::debug!(
            "Pan by ({}, {}) revealed {} regions with {} lines",
            dx,
            dy,
            projections.len(),
            lines.len()
        );
        Ok(lines.len())
    }

    /// Run the whole script
    pub fn run(mut self, settings: &Settings) -> Result<SessionReport> {
        let projection = self.viewport.refit();
        let lines = self.redraw(projection);
        tracing::info!("Initial view {} shows {} lines", self.viewport.shown(), lines);

        let projection = self.viewport.zoom_by(0.5)?;
        self.redraw(projection);

        for step in 0..settings.pan_steps {
            // Alternate horizontal and diagonal pans so both strip kinds get exercised
            let (dx, dy) = if step % 2 == 0 {
                (-settings.pan_step, 0.0)
            } else {
                (-settings.pan_step, settings.pan_step / 2.0)
            };
            self.pan(dx, dy)?;
        }

        let projection = self
            .viewport
            .resize(settings.width / 2 + 1, settings.height)?;
        self.redraw(projection);

        let center = self.network.bounds().center();
        self.viewport.center_on(center.x, center.y);
        let projection = self.viewport.projection();
        self.redraw(projection);

        // Inspect what lies under a marker in the middle of the window
        let window = self.viewport.window();
        let marker = Rect::new(
            window.width as f64 / 2.0 - 8.0,
            window.height as f64 / 2.0 - 8.0,
            16.0,
            16.0,
        );
        let area = self.viewport.map_area(&marker);
        let under_marker = self.network.query(&area);
        if let Some(segment) = under_marker.first() {
            tracing::info!(
                "Marker at {} covers {} segments, e.g. '{}' ({})",
                area,
                under_marker.len(),
                segment.name,
                segment.category
            );
        } else {
            tracing::info!("Marker at {} covers no segments", area);
        }

        let projection = self.viewport.zoom_to(1.0)?;
        self.redraw(projection);

        Ok(self.report)
    }
}

/// Build the synthetic network and replay the session described by `settings`
pub fn run(settings: &Settings) -> Result<SessionReport> {
    let (context, records) = synthetic_grid(settings.grid_size, settings.spacing)?;
    let network = RoadNetwork::build(&context, records, &settings.network_config())?;

    let info = network.info();
    tracing::info!(
        "Loaded {} segments over {} nodes; index has {} nodes ({} leaves, depth {})",
        info.segment_count,
        info.node_count,
        info.index.node_count,
        info.index.leaf_count,
        info.index.deepest_level
    );

    Session::new(&network, settings)?.run(settings)
}
