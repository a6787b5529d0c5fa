use std::cmp;
use std::ops::Range;

use tracing::debug;

use crate::bounds::BoundingBox;
use crate::error::{check_dim, KdTreeError, Result};
use crate::kdtree::{KDTree, Node};
use crate::point::{is_comparable, KdPoint};
use crate::r#type::IndexableNum;

/// How the splitting axis of each node is chosen during bulk construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SplitPolicy {
    /// Cycle through the axes: a node at depth `d` splits on axis `d mod K`.
    #[default]
    RoundRobin,
    /// Split on the axis along which the node's points are spread the widest. Prunes better on
    /// skewed data at the cost of computing the extent of every subset.
    MaxSpread,
}

/// A builder to create a [`KDTree`].
///
/// Points are validated as they are added; the balanced tree is only produced by
/// [`finish`][KDTreeBuilder::finish].
///
/// ```
/// use kd_index::kdtree::KDTreeBuilder;
///
/// let mut builder = KDTreeBuilder::<[f64; 2], u32>::new(2);
/// builder.add([0., 0.]).unwrap();
/// builder.add([1., 1.]).unwrap();
/// builder.add([5., 5.]).unwrap();
/// let tree = builder.finish().unwrap();
///
/// let nearest = tree.nearest(&[4., 4.], 1).unwrap();
/// assert_eq!(*nearest[0].data, 2);
/// ```
#[derive(Debug, Clone)]
pub struct KDTreeBuilder<P: KdPoint, T = u32> {
    dim: usize,
    policy: SplitPolicy,
    items: Vec<(P, T)>,
}

impl<P: KdPoint, T> KDTreeBuilder<P, T> {
    /// Create a new builder for points of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self::with_capacity(dim, 0)
    }

    /// Create a new builder with room for `capacity` points.
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            policy: SplitPolicy::default(),
            items: Vec::with_capacity(capacity),
        }
    }

    /// Set the policy used to choose split axes, both now and on later rebuilds.
    pub fn split_policy(mut self, policy: SplitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The number of points added so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no point has been added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a point with its payload.
    pub fn push(&mut self, point: P, data: T) -> Result<()> {
        validate_point(self.dim, &point)?;
        self.items.push((point, data));
        Ok(())
    }

    /// Add every `(point, payload)` pair of `items`, stopping at the first invalid point.
    pub fn extend<I: IntoIterator<Item = (P, T)>>(&mut self, items: I) -> Result<()> {
        for (point, data) in items {
            self.push(point, data)?;
        }
        Ok(())
    }

    /// Consume this builder, selecting medians recursively to generate a balanced KDTree ready
    /// for queries.
    pub fn finish(self) -> Result<KDTree<P, T>> {
        if self.dim == 0 {
            return Err(KdTreeError::InvalidArgument(
                "KDTree dimension must be at least 1.".to_string(),
            ));
        }

        let num_items = self.items.len();
        let root = build_subtree(self.items, 0, self.dim, self.policy);
        let tree = KDTree {
            root,
            dim: self.dim,
            num_items,
            policy: self.policy,
        };
        debug!(
            num_items,
            dim = tree.dim,
            depth = tree.depth(),
            policy = ?tree.policy,
            "built kd-tree"
        );
        Ok(tree)
    }
}

impl<P: KdPoint> KDTreeBuilder<P, u32> {
    /// Add a point to the index, using its insertion index as payload.
    pub fn add(&mut self, point: P) -> Result<u32> {
        let index = next_index(self.items.len())?;
        self.push(point, index)?;
        Ok(index)
    }
}

impl<N: IndexableNum, const K: usize> KDTreeBuilder<[N; K], u32> {
    /// Add every point of an interleaved coordinate buffer `[x0, y0, x1, y1, ...]`.
    ///
    /// Returns the range of insertion indices assigned to the new points.
    pub fn add_interleaved(&mut self, coords: &[N]) -> Result<Range<u32>> {
        check_dim(self.dim, K)?;
        let points: &[[N; K]] = bytemuck::try_cast_slice(coords).map_err(|_| {
            KdTreeError::InvalidArgument(format!(
                "Buffer of {} coordinates does not hold whole points of dimension {}.",
                coords.len(),
                K
            ))
        })?;

        let start = next_index(self.items.len())?;
        next_index(self.items.len() + points.len())?;
        for point in points {
            self.add(*point)?;
        }
        Ok(start..start + points.len() as u32)
    }
}

fn next_index(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        KdTreeError::InvalidArgument(format!("Cannot index more than {} items.", u32::MAX))
    })
}

/// Check that `point` has dimension `dim` and orderable coordinates.
pub(crate) fn validate_point<P: KdPoint + ?Sized>(dim: usize, point: &P) -> Result<()> {
    check_dim(dim, point.dim())?;
    if !is_comparable(point) {
        return Err(KdTreeError::InvalidArgument(
            "Point has a NaN coordinate.".to_string(),
        ));
    }
    Ok(())
}

/// Build a balanced subtree from `items`, starting at `depth`.
///
/// The node at each level holds the median along the split axis; the lower half of the items
/// goes left and the upper half right. Items equal to the median may end up on either side.
pub(crate) fn build_subtree<P: KdPoint, T>(
    mut items: Vec<(P, T)>,
    depth: usize,
    dim: usize,
    policy: SplitPolicy,
) -> Option<Box<Node<P, T>>> {
    let bounds = bounding_box(&items)?;
    let axis = match policy {
        SplitPolicy::RoundRobin => depth % dim,
        SplitPolicy::MaxSpread => bounds.widest_axis(),
    };

    // middle index
    let right = items.len() - 1;
    let m = right >> 1;
    select(&mut items, m, 0, right, axis);

    let upper = items.split_off(m + 1);
    let (point, data) = items.pop()?;

    Some(Box::new(Node {
        point,
        data,
        axis,
        bounds,
        left: build_subtree(items, depth + 1, dim, policy),
        right: build_subtree(upper, depth + 1, dim, policy),
    }))
}

fn bounding_box<P: KdPoint, T>(items: &[(P, T)]) -> Option<BoundingBox<P::Num>> {
    let ((first, _), rest) = items.split_first()?;
    let mut bounds = BoundingBox::from_point(first);
    for (point, _) in rest {
        bounds.extend(point);
    }
    Some(bounds)
}

#[inline]
fn key<P: KdPoint, T>(items: &[(P, T)], i: usize, axis: usize) -> P::Num {
    items[i].0.coord(axis)
}

/// Custom Floyd-Rivest selection algorithm: reorder items so that [left..k-1] items are no
/// greater than the k-th item along `axis` and [k+1..right] items are no smaller.
fn select<P: KdPoint, T>(
    items: &mut [(P, T)],
    k: usize,
    mut left: usize,
    mut right: usize,
    axis: usize,
) {
    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(items, k, new_left, new_right, axis);
        }

        let t = key(items, k, axis);
        let mut i = left;
        let mut j = right;

        items.swap(left, k);
        if key(items, right, axis) > t {
            items.swap(left, right);
        }

        while i < j {
            items.swap(i, j);
            i += 1;
            j -= 1;
            while key(items, i, axis) < t {
                i += 1;
            }
            while key(items, j, axis) > t {
                j -= 1;
            }
        }

        if key(items, left, axis) == t {
            items.swap(left, j);
        } else {
            j += 1;
            items.swap(j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            if j == 0 {
                break;
            }
            right = j - 1;
        }
    }
}
