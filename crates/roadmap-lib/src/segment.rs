//! Road segment items stored in the spatial index

use crate::quadtree::{Categorized, HasBoundingRect};
use crate::Rect;
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of an intersection (segment endpoint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Road class, used both for filtered queries and for draw order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoadCategory {
    Highway,
    HighwayExit,
    PrimeRoute,
    Path,
    Ferry,
    Other,
}

impl RoadCategory {
    pub const ALL: [RoadCategory; 6] = [
        RoadCategory::Highway,
        RoadCategory::HighwayExit,
        RoadCategory::PrimeRoute,
        RoadCategory::Path,
        RoadCategory::Ferry,
        RoadCategory::Other,
    ];
}

impl std::fmt::Display for RoadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoadCategory::Highway => "highway",
            RoadCategory::HighwayExit => "highway_exit",
            RoadCategory::PrimeRoute => "prime_route",
            RoadCategory::Path => "path",
            RoadCategory::Ferry => "ferry",
            RoadCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// A single straight road edge between two intersections
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub source: NodeId,
    pub target: NodeId,
    /// Map position of `source`
    pub from: Coord<f64>,
    /// Map position of `target`
    pub to: Coord<f64>,
    pub category: RoadCategory,
    pub name: String,
    /// Bounding rect of the two endpoints
    bounds: Rect,
}

impl RoadSegment {
    pub fn new(
        source: NodeId,
        target: NodeId,
        from: Coord<f64>,
        to: Coord<f64>,
        category: RoadCategory,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            from,
            to,
            category,
            name: name.into(),
            bounds: Rect::from_corners(from, to),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Euclidean length in map units
    pub fn length(&self) -> f64 {
        (self.to.x - self.from.x).hypot(self.to.y - self.from.y)
    }
}

impl HasBoundingRect for RoadSegment {
    #[inline]
    fn bounding_rect(&self) -> Rect {
        self.bounds
    }
}

impl Categorized for RoadSegment {
    type Category = RoadCategory;

    #[inline]
    fn category(&self) -> RoadCategory {
        self.category
    }
}
