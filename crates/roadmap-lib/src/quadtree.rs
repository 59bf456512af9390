//! Quad-tree spatial index over anything with a bounding rectangle
//!
//! The index has two phases. A [`QuadIndexBuilder`] accepts inserts from a single writer;
//! [`QuadIndexBuilder::freeze`] consumes it and produces an immutable [`QuadIndex`] that
//! only answers range queries and can be shared between threads. [`QuadTree`] wraps both
//! phases behind one value for callers that need the freeze to happen at runtime.
//!
//! Items are stored at the deepest node whose area fully contains their bounding rect.
//! Items straddling the center lines of an internal node stay at that node.

use crate::{DataError, Rect, Result};
use std::collections::HashSet;
use std::hash::Hash;

/// Depth of the root node
const ROOT_DEPTH: u32 = 1;

/// Deepest `max_depth` accepted; insert and split recurse once per level
pub const MAX_DEPTH_LIMIT: u32 = 32;

/// Anything that can be placed in the index
pub trait HasBoundingRect {
    /// Smallest axis-aligned rect enclosing the item's geometry
    fn bounding_rect(&self) -> Rect;
}

/// Items carrying a category tag usable for filtered queries
pub trait Categorized {
    type Category: Copy + Eq + Hash;

    fn category(&self) -> Self::Category;
}

/// Summary statistics of a frozen index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexInfo {
    /// Number of stored items
    pub item_count: usize,
    /// Total number of nodes (leaves and internal)
    pub node_count: usize,
    /// Number of leaf nodes
    pub leaf_count: usize,
    /// Deepest node level (the root is level 1)
    pub deepest_level: u32,
    /// Items whose rect was not contained by the root area (kept at the root)
    pub outside_root: usize,
}

/// Description of a single node, for inspection and tests
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub area: Rect,
    pub depth: u32,
    pub is_leaf: bool,
    /// Items stored directly at this node
    pub item_count: usize,
}

/// A node of the tree during the build phase
#[derive(Debug, Clone)]
struct BuildNode<T> {
    area: Rect,
    depth: u32,
    kind: BuildKind<T>,
}

#[derive(Debug, Clone)]
enum BuildKind<T> {
    Leaf {
        items: Vec<T>,
    },
    Internal {
        /// NW, NE, SW, SE
        children: Box<[BuildNode<T>; 4]>,
        /// Items overlapping more than one child
        straddling: Vec<T>,
    },
}

/// Write side of the index
#[derive(Debug, Clone)]
pub struct QuadIndexBuilder<T> {
    root: BuildNode<T>,
    capacity: usize,
    max_depth: u32,
    len: usize,
    outside_root: usize,
}

/// A node of the frozen tree, with items compacted into boxed slices
#[derive(Debug, Clone)]
struct Node<T> {
    area: Rect,
    depth: u32,
    kind: NodeKind<T>,
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf {
        items: Box<[T]>,
    },
    Internal {
        children: Box<[Node<T>; 4]>,
        straddling: Box<[T]>,
    },
}

/// Read side of the index
///
/// Immutable once built, so any number of threads can query it concurrently.
#[derive(Debug, Clone)]
pub struct QuadIndex<T> {
    root: Node<T>,
    capacity: usize,
    max_depth: u32,
    len: usize,
    outside_root: usize,
}

impl<T: HasBoundingRect> BuildNode<T> {
    fn leaf(area: Rect, depth: u32) -> Self {
        Self {
            area,
            depth,
            kind: BuildKind::Leaf { items: Vec::new() },
        }
    }

    /// Insert an item whose bounding rect is `rect`
    fn insert(&mut self, item: T, rect: Rect, capacity: usize, max_depth: u32) {
        let overflow = match &mut self.kind {
            BuildKind::Internal {
                children,
                straddling,
            } => {
                match children.iter_mut().find(|child| child.area.contains(&rect)) {
                    Some(child) => child.insert(item, rect, capacity, max_depth),
                    None => straddling.push(item),
                }
                false
            }
            BuildKind::Leaf { items } => {
                items.push(item);
                items.len() > capacity
            }
        };

        if overflow && self.depth < max_depth {
            self.split(capacity, max_depth);
        }
    }

    /// Turn this leaf into an internal node and redistribute its items
    fn split(&mut self, capacity: usize, max_depth: u32) {
        let child_depth = self.depth + 1;
        let children = self
            .area
            .quadrants()
            .map(|area| BuildNode::leaf(area, child_depth));

        let previous = std::mem::replace(
            &mut self.kind,
            BuildKind::Internal {
                children: Box::new(children),
                straddling: Vec::new(),
            },
        );

        if let BuildKind::Leaf { items } = previous {
            for item in items {
                let rect = item.bounding_rect();
                self.insert(item, rect, capacity, max_depth);
            }
        }
    }
}

impl<T> From<BuildNode<T>> for Node<T> {
    fn from(node: BuildNode<T>) -> Self {
        let kind = match node.kind {
            BuildKind::Leaf { items } => NodeKind::Leaf {
                items: items.into_boxed_slice(),
            },
            BuildKind::Internal {
                children,
                straddling,
            } => NodeKind::Internal {
                children: Box::new((*children).map(Node::from)),
                straddling: straddling.into_boxed_slice(),
            },
        };
        Self {
            area: node.area,
            depth: node.depth,
            kind,
        }
    }
}

impl<T: HasBoundingRect> QuadIndexBuilder<T> {
    /// Create an empty index covering `area`
    ///
    /// # Arguments
    /// * `area` - Root area; must have a positive width and height
    /// * `capacity` - Items a leaf holds before it splits (at least 1)
    /// * `max_depth` - Number of tree levels, counting the root (1 to [`MAX_DEPTH_LIMIT`])
    pub fn new(area: Rect, capacity: usize, max_depth: u32) -> Result<Self> {
        let finite = [area.x, area.y, area.width, area.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || area.width <= 0.0 || area.height <= 0.0 {
            return Err(DataError::InvalidArgument(format!(
                "Index area must be non-degenerate, got {area}"
            )));
        }
        if capacity < 1 {
            return Err(DataError::InvalidArgument(
                "Index capacity must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_DEPTH_LIMIT).contains(&max_depth) {
            return Err(DataError::InvalidArgument(format!(
                "Index max depth must be between 1 and {MAX_DEPTH_LIMIT}, got {max_depth}"
            )));
        }

        Ok(Self {
            root: BuildNode::leaf(area, ROOT_DEPTH),
            capacity,
            max_depth,
            len: 0,
            outside_root: 0,
        })
    }

    /// An empty builder with the same area and limits
    fn empty_like(&self) -> Self {
        Self {
            root: BuildNode::leaf(self.root.area, ROOT_DEPTH),
            capacity: self.capacity,
            max_depth: self.max_depth,
            len: 0,
            outside_root: 0,
        }
    }

    /// Insert an item
    ///
    /// Items outside the root area are kept at the root so they are never lost, but
    /// every query then has to test them.
    pub fn insert(&mut self, item: T) {
        let rect = item.bounding_rect();
        if !self.root.area.contains(&rect) {
            self.outside_root += 1;
            tracing::trace!("Item {} lies outside the index area {}", rect, self.root.area);
        }
        self.root.insert(item, rect, self.capacity, self.max_depth);
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn area(&self) -> Rect {
        self.root.area
    }

    /// Finish the build phase
    pub fn freeze(self) -> QuadIndex<T> {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::freeze");

        let index = QuadIndex {
            root: Node::from(self.root),
            capacity: self.capacity,
            max_depth: self.max_depth,
            len: self.len,
            outside_root: self.outside_root,
        };

        let info = index.info();
        tracing::debug!(
            items = info.item_count,
            nodes = info.node_count,
            leaves = info.leaf_count,
            deepest = info.deepest_level,
            "Froze quad index"
        );
        if info.outside_root > 0 {
            tracing::warn!(
                "{} of {} items lie outside the index area and are stored at the root",
                info.outside_root,
                info.item_count
            );
        }

        index
    }
}

impl<T: HasBoundingRect> Node<T> {
    fn local_items(&self) -> &[T] {
        match &self.kind {
            NodeKind::Leaf { items } => &items[..],
            NodeKind::Internal { straddling, .. } => &straddling[..],
        }
    }

    fn children(&self) -> Option<&[Node<T>; 4]> {
        match &self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Internal { children, .. } => Some(&**children),
        }
    }

    /// Collect matching items from this node, descending only into children whose
    /// area collides with `rect`
    fn query<'a, F>(&'a self, rect: &Rect, predicate: &F, results: &mut Vec<&'a T>)
    where
        F: Fn(&T) -> bool,
    {
        results.extend(
            self.local_items()
                .iter()
                .filter(|item| item.bounding_rect().collides_with(rect) && predicate(*item)),
        );

        if let Some(children) = self.children() {
            for child in children.iter() {
                if child.area.collides_with(rect) {
                    child.query(rect, predicate, results);
                }
            }
        }
    }
}

impl<T: HasBoundingRect> QuadIndex<T> {
    /// Root area of the index
    #[inline]
    pub fn area(&self) -> Rect {
        self.root.area
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// All items whose bounding rect collides with `rect`
    ///
    /// No ordering is guaranteed across items from different nodes.
    pub fn query(&self, rect: &Rect) -> Vec<&T> {
        self.query_with(rect, |_| true)
    }

    /// Items colliding with `rect` that also satisfy `predicate`
    pub fn query_with<F>(&self, rect: &Rect, predicate: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::query");

        let mut results = Vec::new();
        self.root.query(rect, &predicate, &mut results);
        results
    }

    /// Summary statistics
    pub fn info(&self) -> IndexInfo {
        let mut info = IndexInfo {
            item_count: self.len,
            outside_root: self.outside_root,
            ..IndexInfo::default()
        };
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            info.node_count += 1;
            info.deepest_level = info.deepest_level.max(node.depth);
            match node.children() {
                Some(children) => stack.extend(children.iter()),
                None => info.leaf_count += 1,
            }
        }
        info
    }

    /// Per-node summaries in depth-first order, root first
    pub fn nodes(&self) -> Vec<NodeInfo> {
        let mut nodes = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            nodes.push(NodeInfo {
                area: node.area,
                depth: node.depth,
                is_leaf: node.children().is_none(),
                item_count: node.local_items().len(),
            });
            if let Some(children) = node.children() {
                stack.extend(children.iter().rev());
            }
        }
        nodes
    }
}

impl<T: HasBoundingRect + Categorized> QuadIndex<T> {
    /// Items colliding with `rect` whose category is in `categories`
    pub fn query_filtered(&self, rect: &Rect, categories: &HashSet<T::Category>) -> Vec<&T> {
        self.query_with(rect, |item| categories.contains(&item.category()))
    }
}

/// Index with a runtime build/query lifecycle
///
/// Inserting after [`QuadTree::freeze`] fails with [`DataError::InvalidState`], and the
/// first query freezes the tree if nobody did so explicitly.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    builder: QuadIndexBuilder<T>,
    frozen: Option<QuadIndex<T>>,
}

impl<T: HasBoundingRect> QuadTree<T> {
    pub fn new(area: Rect, capacity: usize, max_depth: u32) -> Result<Self> {
        Ok(Self {
            builder: QuadIndexBuilder::new(area, capacity, max_depth)?,
            frozen: None,
        })
    }

    pub fn insert(&mut self, item: T) -> Result<()> {
        if self.frozen.is_some() {
            return Err(DataError::InvalidState(
                "Cannot insert into a frozen index".to_string(),
            ));
        }
        self.builder.insert(item);
        Ok(())
    }

    /// Freeze the tree (idempotent) and return the read-only index
    pub fn freeze(&mut self) -> &QuadIndex<T> {
        let builder = &mut self.builder;
        self.frozen.get_or_insert_with(|| {
            let empty = builder.empty_like();
            std::mem::replace(builder, empty).freeze()
        })
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// The read-only index, if the tree has been frozen
    #[inline]
    pub fn index(&self) -> Option<&QuadIndex<T>> {
        self.frozen.as_ref()
    }

    pub fn len(&self) -> usize {
        match &self.frozen {
            Some(index) => index.len(),
            None => self.builder.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query, freezing first if needed
    pub fn query(&mut self, rect: &Rect) -> Vec<&T> {
        self.freeze().query(rect)
    }

    /// Consume the tree, freezing it if needed
    pub fn into_index(self) -> QuadIndex<T> {
        match self.frozen {
            Some(index) => index,
            None => self.builder.freeze(),
        }
    }
}

impl<T: HasBoundingRect + Categorized> QuadTree<T> {
    /// Filtered query, freezing first if needed
    pub fn query_filtered(&mut self, rect: &Rect, categories: &HashSet<T::Category>) -> Vec<&T> {
        self.freeze().query_filtered(rect, categories)
    }
}
