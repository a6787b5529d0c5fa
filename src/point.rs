//! The point abstraction indexed by a [`KDTree`][crate::kdtree::KDTree].

use crate::r#type::IndexableNum;

/// A fixed-dimension tuple of coordinates.
///
/// Any type exposing its dimension and per-axis coordinates can be stored in or used to query a
/// tree. Implementations are provided for arrays, slices, vectors and 2- and 3-tuples.
pub trait KdPoint {
    /// The coordinate type.
    type Num: IndexableNum;

    /// The number of coordinates.
    fn dim(&self) -> usize;

    /// The coordinate along `axis`. `axis` is always less than [`dim`][KdPoint::dim].
    fn coord(&self, axis: usize) -> Self::Num;

    /// Squared Euclidean distance to `other`, over the axes both points share.
    #[inline]
    fn sq_distance<Q: KdPoint<Num = Self::Num> + ?Sized>(&self, other: &Q) -> f64 {
        let dim = self.dim().min(other.dim());
        let mut sum = 0.0;
        for axis in 0..dim {
            let d = self.coord(axis).as_f64() - other.coord(axis).as_f64();
            sum += d * d;
        }
        sum
    }

    /// Euclidean distance to `other`.
    #[inline]
    fn distance<Q: KdPoint<Num = Self::Num> + ?Sized>(&self, other: &Q) -> f64 {
        self.sq_distance(other).sqrt()
    }
}

impl<N: IndexableNum, const K: usize> KdPoint for [N; K] {
    type Num = N;

    #[inline]
    fn dim(&self) -> usize {
        K
    }

    #[inline]
    fn coord(&self, axis: usize) -> N {
        self[axis]
    }
}

impl<N: IndexableNum> KdPoint for [N] {
    type Num = N;

    #[inline]
    fn dim(&self) -> usize {
        self.len()
    }

    #[inline]
    fn coord(&self, axis: usize) -> N {
        self[axis]
    }
}

impl<N: IndexableNum> KdPoint for Vec<N> {
    type Num = N;

    #[inline]
    fn dim(&self) -> usize {
        self.len()
    }

    #[inline]
    fn coord(&self, axis: usize) -> N {
        self[axis]
    }
}

impl<N: IndexableNum> KdPoint for (N, N) {
    type Num = N;

    #[inline]
    fn dim(&self) -> usize {
        2
    }

    #[inline]
    fn coord(&self, axis: usize) -> N {
        match axis {
            0 => self.0,
            _ => self.1,
        }
    }
}

impl<N: IndexableNum> KdPoint for (N, N, N) {
    type Num = N;

    #[inline]
    fn dim(&self) -> usize {
        3
    }

    #[inline]
    fn coord(&self, axis: usize) -> N {
        match axis {
            0 => self.0,
            1 => self.1,
            _ => self.2,
        }
    }
}

/// `true` when every coordinate of `point` can be ordered.
pub(crate) fn is_comparable<P: KdPoint + ?Sized>(point: &P) -> bool {
    (0..point.dim()).all(|axis| point.coord(axis).is_comparable())
}
