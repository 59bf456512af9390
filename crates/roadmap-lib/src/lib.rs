//! Roadmap Library - Core Data Structures for Interactive Road Network Viewing
//!
//! This library answers "which road segments are visible in this rectangle?" fast enough
//! for interactive frame rates over country-scale networks, and turns the answer into
//! screen-space lines in a visually correct draw order (major roads over minor roads).
//!
//! # Architecture
//!
//! - **[`Rect`]**: Immutable axis-aligned rectangle with strict collision semantics
//! - **[`QuadIndexBuilder`] / [`QuadIndex`]**: Two-phase quad-tree spatial index
//! - **[`RoadNetwork`]**: High-level manager that builds the index from segment records
//! - **[`Viewport`]**: Visible map rectangle, zoom/pan transitions and reveal regions
//! - **[`RenderOrchestrator`]**: Query + map-to-screen transform + draw-order bucketing
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) for N segments, single writer
//! - **Query Time**: proportional to the number of nodes overlapping the query rect
//! - **Concurrency**: a frozen [`QuadIndex`] is immutable and safe for parallel readers

mod network;
mod quadtree;
mod rect;
mod render;
mod segment;
mod viewport;

// Public API exports
pub use network::{Config, LoadContext, NetworkInfo, RoadNetwork, SegmentRecord};
pub use quadtree::{
    Categorized, HasBoundingRect, IndexInfo, MAX_DEPTH_LIMIT, NodeInfo, QuadIndex, QuadIndexBuilder,
    QuadTree,
};
pub use rect::Rect;
pub use render::{Color, LineDescriptor, RenderInstructions, RenderOrchestrator};
pub use segment::{NodeId, RoadCategory, RoadSegment};
pub use viewport::{Projection, Projections, Viewport, ViewportConfig, WindowSize};

/// Error types for the roadmap engine
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown node id {0}")]
    UnknownNode(NodeId),
}

pub type Result<T> = std::result::Result<T, DataError>;
