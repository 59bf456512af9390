//! RoadNetwork - Top-level manager that builds the spatial index from segment records
//!
//! Loading happens in two steps. Intersections are registered in a [`LoadContext`],
//! which deduplicates them by id, then [`RoadNetwork::build`] resolves every
//! [`SegmentRecord`] against that context and indexes the resulting segments.

use crate::quadtree::{IndexInfo, QuadIndex, QuadIndexBuilder};
use crate::{DataError, NodeId, Rect, Result, RoadCategory, RoadSegment};

use geo::Coord;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Margin around derived bounds, as a fraction of the larger extent
const BOUNDS_MARGIN: f64 = 0.01;
/// Smallest margin, for networks collapsed onto a point or a line
const MIN_BOUNDS_MARGIN: f64 = 1.0;

/// Configuration for building a road network
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Items a leaf holds before it splits. Default: 400
    pub capacity: usize,
    /// Number of tree levels, counting the root. Default: 15
    pub max_depth: u32,
    /// Root area of the index. Default: [`LoadContext::index_bounds`]
    pub bounds: Option<Rect>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 400,
            max_depth: 15,
            bounds: None,
        }
    }
}

/// A road edge as delivered by the record source: endpoint ids but no coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub category: RoadCategory,
    pub name: String,
}

/// Registry of intersection positions shared by all records of one load
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    nodes: HashMap<NodeId, Coord<f64>>,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intersection
    ///
    /// The first registration of an id wins. Returns `false` if `id` was already known.
    /// Fails with [`DataError::InvalidGeometry`] for non-finite coordinates.
    pub fn add_node(&mut self, id: NodeId, position: Coord<f64>) -> Result<bool> {
        check_position(id, position)?;
        Ok(match self.nodes.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(position);
                true
            }
        })
    }

    #[inline]
    pub fn position(&self, id: NodeId) -> Option<Coord<f64>> {
        self.nodes.get(&id).copied()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Split a multi-node road into one record per edge, registering its nodes
    ///
    /// Nodes already present keep their first position, so roads sharing an
    /// intersection end up sharing one endpoint.
    pub fn intern_polyline(
        &mut self,
        nodes: &[(NodeId, Coord<f64>)],
        category: RoadCategory,
        name: &str,
    ) -> Result<Vec<SegmentRecord>> {
        if nodes.len() < 2 {
            return Err(DataError::InvalidGeometry(format!(
                "Road '{name}' needs at least two nodes, got {}",
                nodes.len()
            )));
        }

        // Validate everything first so a bad road registers nothing
        for &(id, position) in nodes {
            check_position(id, position)?;
        }
        for &(id, position) in nodes {
            self.add_node(id, position)?;
        }

        Ok(nodes
            .windows(2)
            .map(|pair| SegmentRecord {
                source: pair[0].0,
                target: pair[1].0,
                category,
                name: name.to_string(),
            })
            .collect())
    }

    /// Smallest rect enclosing every registered node, `None` when empty
    pub fn bounds(&self) -> Option<Rect> {
        let mut positions = self.nodes.values();
        let first = *positions.next()?;
        let (min, max) = positions.fold((first, first), |(min, max), p| {
            (
                Coord {
                    x: min.x.min(p.x),
                    y: min.y.min(p.y),
                },
                Coord {
                    x: max.x.max(p.x),
                    y: max.y.max(p.y),
                },
            )
        });
        Some(Rect::from_corners(min, max))
    }

    /// [`LoadContext::bounds`] grown by a small margin
    ///
    /// Roads along the outermost rows or columns have flat bounding boxes; the margin
    /// keeps them strictly inside the root area so a query over it returns them. It
    /// also gives point and line networks a non-degenerate area.
    pub fn index_bounds(&self) -> Option<Rect> {
        let bounds = self.bounds()?;
        let margin = (bounds.width.max(bounds.height) * BOUNDS_MARGIN).max(MIN_BOUNDS_MARGIN);
        Some(bounds.padded(margin))
    }
}

fn check_position(id: NodeId, position: Coord<f64>) -> Result<()> {
    if position.x.is_finite() && position.y.is_finite() {
        Ok(())
    } else {
        Err(DataError::InvalidGeometry(format!(
            "Node {id} has a non-finite position ({}, {})",
            position.x, position.y
        )))
    }
}

/// Information about a built network
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInfo {
    pub segment_count: usize,
    pub node_count: usize,
    pub bounds: Rect,
    pub index: IndexInfo,
}

/// Indexed, read-only road network
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    index: QuadIndex<RoadSegment>,
    node_count: usize,
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RoadNetwork {
    /// Resolve `records` against `context` and build the frozen index
    ///
    /// Endpoint resolution runs in parallel; insertion is single-writer. Fails with
    /// [`DataError::UnknownNode`] when a record names an unregistered endpoint, and with
    /// [`DataError::InvalidState`] when no bounds are available or when more than half
    /// of the segments fall outside them.
    pub fn build(
        context: &LoadContext,
        records: Vec<SegmentRecord>,
        config: &Config,
    ) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("network::build");

        let bounds = config.bounds.or_else(|| context.index_bounds()).ok_or_else(|| {
            DataError::InvalidState(
                "Cannot build a road network without nodes or explicit bounds".to_string(),
            )
        })?;

        let segments: Result<Vec<RoadSegment>> = records
            .into_par_iter()
            .map(|record| {
                let from = context
                    .position(record.source)
                    .ok_or(DataError::UnknownNode(record.source))?;
                let to = context
                    .position(record.target)
                    .ok_or(DataError::UnknownNode(record.target))?;
                Ok(RoadSegment::new(
                    record.source,
                    record.target,
                    from,
                    to,
                    record.category,
                    record.name,
                ))
            })
            .collect();
        let segments = segments?;

        let outside = segments
            .iter()
            .filter(|segment| !bounds.contains(&segment.bounds()))
            .count();
        if outside * 2 > segments.len() {
            return Err(DataError::InvalidState(format!(
                "{outside} of {} segments fall outside the network bounds {bounds}",
                segments.len()
            )));
        }

        let mut builder = QuadIndexBuilder::new(bounds, config.capacity, config.max_depth)?;
        for segment in segments {
            builder.insert(segment);
        }
        let index = builder.freeze();

        tracing::debug!(
            "Built road network with {} segments over {} nodes in {}",
            index.len(),
            context.node_count(),
            bounds
        );

        Ok(Self {
            index,
            node_count: context.node_count(),
            config: config.clone(),
        })
    }

    /// Segments in `rect` whose category is in `categories`
    #[inline]
    pub fn query_visible(
        &self,
        rect: &Rect,
        categories: &HashSet<RoadCategory>,
    ) -> Vec<&RoadSegment> {
        #[cfg(feature = "profiling")]
        profiling::scope!("network::query_visible");

        self.index.query_filtered(rect, categories)
    }

    /// Every segment in `rect`
    #[inline]
    pub fn query(&self, rect: &Rect) -> Vec<&RoadSegment> {
        self.index.query(rect)
    }

    /// Root area of the index
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.index.area()
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn index(&self) -> &QuadIndex<RoadSegment> {
        &self.index
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn info(&self) -> NetworkInfo {
        NetworkInfo {
            segment_count: self.segment_count(),
            node_count: self.node_count,
            bounds: self.bounds(),
            index: self.index.info(),
        }
    }
}
