use std::fmt;

use tracing::{debug, trace};

use crate::bounds::BoundingBox;
use crate::error::{KdTreeError, Result};
use crate::kdtree::builder::{build_subtree, validate_point};
use crate::kdtree::{KDTreeBuilder, Node, SplitPolicy};
use crate::point::KdPoint;

/// A k-d tree over points of type `P`, each carrying a payload of type `T`.
///
/// Usually this will be created from scratch via [`KDTreeBuilder`]. The tree can grow through
/// [`insert`][KDTree::insert], which does not rebalance; call [`rebuild`][KDTree::rebuild] to
/// restore the logarithmic depth bound after many insertions.
pub struct KDTree<P: KdPoint, T = u32> {
    pub(crate) root: Option<Box<Node<P, T>>>,
    pub(crate) dim: usize,
    pub(crate) num_items: usize,
    pub(crate) policy: SplitPolicy,
}

impl<P: KdPoint, T> KDTree<P, T> {
    /// Create an empty tree for points of dimension `dim`.
    pub fn new(dim: usize) -> Result<Self> {
        KDTreeBuilder::new(dim).finish()
    }

    /// Bulk-build a balanced tree from `(point, payload)` pairs.
    pub fn from_items<I>(dim: usize, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, T)>,
    {
        let items = items.into_iter();
        let mut builder = KDTreeBuilder::with_capacity(dim, items.size_hint().0);
        builder.extend(items)?;
        builder.finish()
    }

    /// The dimension of every point in this tree.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The number of points in this tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// Returns `true` if the tree holds no point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The policy used to choose split axes when (re)building.
    #[inline]
    pub fn split_policy(&self) -> SplitPolicy {
        self.policy
    }

    /// Access the root node of the KDTree for manual traversal.
    #[inline]
    pub fn root(&self) -> Option<&Node<P, T>> {
        self.root.as_deref()
    }

    /// The bounding box of every point in the tree, or `None` when empty.
    pub fn bounds(&self) -> Option<&BoundingBox<P::Num>> {
        self.root().map(Node::bounds)
    }

    /// Insert one point, descending to an empty slot and attaching a new leaf there.
    ///
    /// No rebalancing happens: coordinates strictly lower than a node's split value go left and
    /// all others right, so sorted input degrades the tree towards a list.
    pub fn insert(&mut self, point: P, data: T) -> Result<()> {
        validate_point(self.dim, &point)?;

        let dim = self.dim;
        let mut axis = 0;
        let mut depth = 0;
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            node.bounds.extend(&point);
            axis = (node.axis + 1) % dim;
            depth += 1;
            slot = if point.coord(node.axis) < node.split_value() {
                &mut node.left
            } else {
                &mut node.right
            };
        }
        *slot = Some(Box::new(Node::leaf(point, data, axis)));
        self.num_items += 1;

        trace!(depth, num_items = self.num_items, "inserted point");
        Ok(())
    }

    /// Reconstruct a balanced tree from an in-order traversal of all points.
    pub fn rebuild(&mut self) {
        let depth_before = self.depth();
        let items = drain_in_order(self.root.take(), self.num_items);
        self.root = build_subtree(items, 0, self.dim, self.policy);
        debug!(
            num_items = self.num_items,
            depth_before,
            depth_after = self.depth(),
            "rebuilt kd-tree"
        );
    }

    /// Consume the tree, returning every `(point, payload)` pair in in-order sequence.
    pub fn into_items(mut self) -> Vec<(P, T)> {
        drain_in_order(self.root.take(), self.num_items)
    }

    /// Check that a query point matches the tree's dimension and can be ordered.
    pub(crate) fn check_query<Q>(&self, query: &Q) -> Result<()>
    where
        Q: KdPoint<Num = P::Num> + ?Sized,
    {
        validate_point(self.dim, query).map_err(|err| match err {
            KdTreeError::InvalidArgument(_) => {
                KdTreeError::InvalidArgument("Query point has a NaN coordinate.".to_string())
            }
            err => err,
        })
    }
}

/// Move every item out of a subtree in in-order sequence without recursing.
pub(crate) fn drain_in_order<P: KdPoint, T>(
    root: Option<Box<Node<P, T>>>,
    capacity: usize,
) -> Vec<(P, T)> {
    let mut items = Vec::with_capacity(capacity);
    let mut stack: Vec<Box<Node<P, T>>> = Vec::new();
    let mut current = root;
    loop {
        while let Some(mut node) = current {
            current = node.left.take();
            stack.push(node);
        }
        let Some(mut node) = stack.pop() else {
            break;
        };
        current = node.right.take();
        let Node { point, data, .. } = *node;
        items.push((point, data));
    }
    items
}

/// Copy a subtree node by node without recursing.
///
/// Detached copies are collected in pre-order, then reassembled from the back: by the time a
/// node is reached, its left and right subtrees are the two most recent results.
fn clone_subtree<P, T>(root: Option<&Node<P, T>>) -> Option<Box<Node<P, T>>>
where
    P: KdPoint + Clone,
    T: Clone,
{
    let mut detached = Vec::new();
    let mut stack: Vec<&Node<P, T>> = root.into_iter().collect();
    while let Some(node) = stack.pop() {
        detached.push((node.detached(), node.left.is_some(), node.right.is_some()));
        stack.extend(node.right());
        stack.extend(node.left());
    }

    let mut built: Vec<Box<Node<P, T>>> = Vec::new();
    while let Some((mut node, has_left, has_right)) = detached.pop() {
        if has_left {
            node.left = built.pop();
        }
        if has_right {
            node.right = built.pop();
        }
        built.push(Box::new(node));
    }
    built.pop()
}

impl<P: KdPoint + Clone, T: Clone> Clone for KDTree<P, T> {
    fn clone(&self) -> Self {
        Self {
            root: clone_subtree(self.root()),
            dim: self.dim,
            num_items: self.num_items,
            policy: self.policy,
        }
    }
}

impl<P: KdPoint, T> fmt::Debug for KDTree<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KDTree")
            .field("dim", &self.dim)
            .field("num_items", &self.num_items)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<P: KdPoint, T> Drop for KDTree<P, T> {
    fn drop(&mut self) {
        // Tear down iteratively; a degenerate tree would overflow the stack through `Box` drops.
        let mut stack: Vec<Box<Node<P, T>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}
