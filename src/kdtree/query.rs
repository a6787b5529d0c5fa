//! Nearest-neighbor, range and radius queries over a [`KDTree`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo_traits::{CoordTrait, RectTrait};
use tinyvec::TinyVec;

use crate::bounds::{coord_to_coords, rect_to_box, BoundingBox};
use crate::error::{check_dim, KdTreeError, Result};
use crate::kdtree::{KDTree, Node};
use crate::point::KdPoint;
use crate::r#type::IndexableNum;

/// A point found by a distance query, with its payload and squared distance to the query.
#[derive(Debug, PartialEq)]
pub struct Neighbor<'a, P, T> {
    /// The stored point.
    pub point: &'a P,
    /// The payload stored alongside the point.
    pub data: &'a T,
    /// Squared Euclidean distance from the query point.
    pub sq_dist: f64,
}

impl<P, T> Neighbor<'_, P, T> {
    /// Euclidean distance from the query point.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.sq_dist.sqrt()
    }
}

impl<P, T> Clone for Neighbor<'_, P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, T> Copy for Neighbor<'_, P, T> {}

/// A wrapper around a node and its distance for use in the bounded max-heap.
struct Candidate<'a, P: KdPoint, T> {
    node: &'a Node<P, T>,
    sq_dist: f64,
}

impl<P: KdPoint, T> PartialEq for Candidate<'_, P, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P: KdPoint, T> Eq for Candidate<'_, P, T> {}

impl<P: KdPoint, T> Ord for Candidate<'_, P, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Coordinates are never NaN, so neither are distances
        self.sq_dist.total_cmp(&other.sq_dist)
    }
}

impl<P: KdPoint, T> PartialOrd for Candidate<'_, P, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: KdPoint, T> KDTree<P, T> {
    /// Search the `m` points closest to `query`, ordered by ascending distance.
    ///
    /// Returns every point when `m` exceeds the size of the tree and nothing when `m` is zero.
    ///
    /// ```
    /// use kd_index::kdtree::KDTree;
    ///
    /// let points = [[0., 0.], [1., 1.], [5., 5.], [2., 0.]];
    /// let tree = KDTree::from_items(2, points.into_iter().zip(0u32..)).unwrap();
    ///
    /// let results = tree.nearest(&[0., 0.], 2).unwrap();
    /// assert_eq!(*results[0].point, [0., 0.]);
    /// assert_eq!(*results[1].point, [1., 1.]);
    /// assert_eq!(results[1].distance(), 2f64.sqrt());
    /// ```
    pub fn nearest<Q>(&self, query: &Q, m: usize) -> Result<Vec<Neighbor<'_, P, T>>>
    where
        Q: KdPoint<Num = P::Num> + ?Sized,
    {
        self.check_query(query)?;
        let root = match self.root() {
            Some(root) if m > 0 => root,
            _ => return Ok(vec![]),
        };

        let mut heap: BinaryHeap<Candidate<'_, P, T>> =
            BinaryHeap::with_capacity(m.min(self.num_items));

        // Each entry carries a lower bound on the squared distance from the query to its subtree.
        // Use TinyVec to avoid heap allocations
        let mut stack: TinyVec<[(Option<&Node<P, T>>, f64); 32]> = TinyVec::new();
        stack.push((Some(root), 0.0));

        while let Some((next, bound)) = stack.pop() {
            let Some(node) = next else {
                continue;
            };

            if heap.len() == m {
                let worst = heap.peek().map_or(f64::INFINITY, |c| c.sq_dist);
                if bound > worst || node.bounds.sq_exterior_distance(query) > worst {
                    continue;
                }
            }

            let sq_dist = node.point.sq_distance(query);
            if heap.len() < m {
                heap.push(Candidate { node, sq_dist });
            } else if let Some(mut worst) = heap.peek_mut() {
                if sq_dist < worst.sq_dist {
                    *worst = Candidate { node, sq_dist };
                }
            }

            // Queue the far side first so the near side is searched first
            let diff = query.coord(node.axis).as_f64() - node.split_value().as_f64();
            let (near, far) = if diff < 0.0 {
                (node.left(), node.right())
            } else {
                (node.right(), node.left())
            };
            if far.is_some() {
                stack.push((far, diff * diff));
            }
            if near.is_some() {
                stack.push((near, 0.0));
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                point: &c.node.point,
                data: &c.node.data,
                sq_dist: c.sq_dist,
            })
            .collect())
    }

    /// The single point closest to `query`, or `None` for an empty tree.
    pub fn nearest_one<Q>(&self, query: &Q) -> Result<Option<Neighbor<'_, P, T>>>
    where
        Q: KdPoint<Num = P::Num> + ?Sized,
    {
        Ok(self.nearest(query, 1)?.into_iter().next())
    }

    /// Search the `m` points closest to the given coordinate.
    pub fn nearest_coord(
        &self,
        coord: &impl CoordTrait<T = P::Num>,
        m: usize,
    ) -> Result<Vec<Neighbor<'_, P, T>>> {
        self.nearest(coord_to_coords(coord).as_slice(), m)
    }

    /// Search the index for points within the box spanned by `min` and `max`, bounds included.
    ///
    /// Results are in no particular order.
    pub fn range<Q>(&self, min: &Q, max: &Q) -> Result<Vec<(&P, &T)>>
    where
        Q: KdPoint<Num = P::Num> + ?Sized,
    {
        check_dim(self.dim, min.dim())?;
        self.range_box(&BoundingBox::from_corners(min, max)?)
    }

    /// Search the index for points within a given bounding box, bounds included.
    pub fn range_box(&self, region: &BoundingBox<P::Num>) -> Result<Vec<(&P, &T)>> {
        check_dim(self.dim, region.dim())?;

        let mut result = vec![];
        let mut stack: TinyVec<[Option<&Node<P, T>>; 32]> = TinyVec::new();
        stack.push(self.root());

        while let Some(next) = stack.pop() {
            let Some(node) = next else {
                continue;
            };
            if !node.bounds.intersects(region) {
                continue;
            }

            if region.contains(&node.point) {
                result.push((&node.point, &node.data));
            }

            // queue search in halves that intersect the query
            let value = node.split_value();
            if region.min()[node.axis] <= value {
                stack.push(node.left());
            }
            if region.max()[node.axis] >= value {
                stack.push(node.right());
            }
        }

        Ok(result)
    }

    /// Search the index for points within a given rectangle.
    pub fn range_rect(&self, rect: &impl RectTrait<T = P::Num>) -> Result<Vec<(&P, &T)>> {
        self.range_box(&rect_to_box(rect)?)
    }

    /// Search the index for points within `radius` of `query`, bounds included.
    ///
    /// Results are in no particular order.
    pub fn within<Q>(&self, query: &Q, radius: f64) -> Result<Vec<Neighbor<'_, P, T>>>
    where
        Q: KdPoint<Num = P::Num> + ?Sized,
    {
        self.check_query(query)?;
        if !(radius >= 0.0) {
            return Err(KdTreeError::InvalidArgument(format!(
                "Radius must be a non-negative number, got {}.",
                radius
            )));
        }

        let r2 = radius * radius;
        let mut result = vec![];
        let mut stack: TinyVec<[Option<&Node<P, T>>; 32]> = TinyVec::new();
        stack.push(self.root());

        while let Some(next) = stack.pop() {
            let Some(node) = next else {
                continue;
            };
            if node.bounds.sq_exterior_distance(query) > r2 {
                continue;
            }

            let sq_dist = node.point.sq_distance(query);
            if sq_dist <= r2 {
                result.push(Neighbor {
                    point: &node.point,
                    data: &node.data,
                    sq_dist,
                });
            }

            let q = query.coord(node.axis).as_f64();
            let value = node.split_value().as_f64();
            if q - radius <= value {
                stack.push(node.left());
            }
            if q + radius >= value {
                stack.push(node.right());
            }
        }

        Ok(result)
    }

    /// Search the index for points within `radius` of the given coordinate.
    pub fn within_coord(
        &self,
        coord: &impl CoordTrait<T = P::Num>,
        radius: f64,
    ) -> Result<Vec<Neighbor<'_, P, T>>> {
        self.within(coord_to_coords(coord).as_slice(), radius)
    }
}

#[cfg(feature = "rayon")]
impl<P, T> KDTree<P, T>
where
    P: KdPoint + Sync,
    T: Sync,
{
    /// Run [`nearest`][KDTree::nearest] for every query point in parallel.
    pub fn nearest_batch<Q>(
        &self,
        queries: &[Q],
        m: usize,
    ) -> Result<Vec<Vec<Neighbor<'_, P, T>>>>
    where
        Q: KdPoint<Num = P::Num> + Sync,
    {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        queries
            .par_iter()
            .map(|query| self.nearest(query, m))
            .collect()
    }

    /// Run [`range_box`][KDTree::range_box] for every region in parallel.
    pub fn range_batch(&self, regions: &[BoundingBox<P::Num>]) -> Result<Vec<Vec<(&P, &T)>>> {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        regions
            .par_iter()
            .map(|region| self.range_box(region))
            .collect()
    }
}
