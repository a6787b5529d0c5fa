//! Axis-aligned bounding boxes in k dimensions.

use geo_traits::{
    CoordTrait, Dimensions, GeometryTrait, GeometryType, RectTrait, UnimplementedGeometryCollection,
    UnimplementedLine, UnimplementedLineString, UnimplementedMultiLineString,
    UnimplementedMultiPoint, UnimplementedMultiPolygon, UnimplementedPoint, UnimplementedPolygon,
    UnimplementedTriangle,
};
use tinyvec::TinyVec;

use crate::error::{check_dim, KdTreeError, Result};
use crate::point::{is_comparable, KdPoint};
use crate::r#type::IndexableNum;

/// Coordinates stored inline for up to four dimensions.
pub(crate) type Coords<N> = TinyVec<[N; 4]>;

/// An axis-aligned box with inclusive bounds.
///
/// Used both as the region of a range query and as the cached extent of every subtree in a
/// [`KDTree`][crate::kdtree::KDTree].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox<N: IndexableNum> {
    min: Coords<N>,
    max: Coords<N>,
}

impl<N: IndexableNum> BoundingBox<N> {
    /// Create a box from its lower and upper corners.
    ///
    /// Fails with [`KdTreeError::DimensionMismatch`] if the corners have different dimensions and
    /// with [`KdTreeError::InvalidArgument`] if `min > max` on any axis.
    pub fn new(min: &[N], max: &[N]) -> Result<Self> {
        Self::from_corners(min, max)
    }

    /// Create a box from two corner points of any [`KdPoint`] type.
    pub fn from_corners<Q>(min: &Q, max: &Q) -> Result<Self>
    where
        Q: KdPoint<Num = N> + ?Sized,
    {
        check_dim(min.dim(), max.dim())?;
        if min.dim() == 0 {
            return Err(KdTreeError::InvalidArgument(
                "Bounding box must have at least one dimension.".to_string(),
            ));
        }
        if !is_comparable(min) || !is_comparable(max) {
            return Err(KdTreeError::InvalidArgument(
                "Bounding box corner has a NaN coordinate.".to_string(),
            ));
        }
        for axis in 0..min.dim() {
            if min.coord(axis) > max.coord(axis) {
                return Err(KdTreeError::InvalidArgument(format!(
                    "Bounding box min {:?} exceeds max {:?} on axis {}.",
                    min.coord(axis),
                    max.coord(axis),
                    axis
                )));
            }
        }

        Ok(Self {
            min: (0..min.dim()).map(|axis| min.coord(axis)).collect(),
            max: (0..max.dim()).map(|axis| max.coord(axis)).collect(),
        })
    }

    /// A degenerate box around a single point.
    pub(crate) fn from_point<P: KdPoint<Num = N> + ?Sized>(point: &P) -> Self {
        let coords: Coords<N> = (0..point.dim()).map(|axis| point.coord(axis)).collect();
        Self {
            min: coords.clone(),
            max: coords,
        }
    }

    /// Grow this box to include `point`.
    pub(crate) fn extend<P: KdPoint<Num = N> + ?Sized>(&mut self, point: &P) {
        for axis in 0..self.dim() {
            let value = point.coord(axis);
            if value < self.min[axis] {
                self.min[axis] = value;
            }
            if value > self.max[axis] {
                self.max[axis] = value;
            }
        }
    }

    /// The number of dimensions of this box.
    #[inline]
    pub fn dim(&self) -> usize {
        self.min.len()
    }

    /// The lower corner.
    #[inline]
    pub fn min(&self) -> &[N] {
        &self.min
    }

    /// The upper corner.
    #[inline]
    pub fn max(&self) -> &[N] {
        &self.max
    }

    /// The extent of this box along `axis`.
    #[inline]
    pub fn spread(&self, axis: usize) -> f64 {
        self.max[axis].as_f64() - self.min[axis].as_f64()
    }

    /// The axis with the largest extent. Ties resolve to the lowest axis.
    pub(crate) fn widest_axis(&self) -> usize {
        let mut best = 0;
        for axis in 1..self.dim() {
            if self.spread(axis) > self.spread(best) {
                best = axis;
            }
        }
        best
    }

    /// Returns `true` if `point` lies inside this box, bounds included.
    pub fn contains<Q: KdPoint<Num = N> + ?Sized>(&self, point: &Q) -> bool {
        (0..self.dim()).all(|axis| {
            let value = point.coord(axis);
            value >= self.min[axis] && value <= self.max[axis]
        })
    }

    /// Returns `true` if the two boxes share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        (0..self.dim())
            .all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    /// Squared distance from `point` to the nearest point of this box. Zero inside the box.
    pub fn sq_exterior_distance<Q: KdPoint<Num = N> + ?Sized>(&self, point: &Q) -> f64 {
        let mut sum = 0.0;
        for axis in 0..self.dim() {
            let d = axis_dist(
                point.coord(axis).as_f64(),
                self.min[axis].as_f64(),
                self.max[axis].as_f64(),
            );
            sum += d * d;
        }
        sum
    }
}

/// 1D distance from a value to a range.
#[inline]
fn axis_dist(k: f64, min: f64, max: f64) -> f64 {
    if k < min {
        min - k
    } else if k <= max {
        0.0
    } else {
        k - max
    }
}

/// A borrowed corner of a [`BoundingBox`].
///
/// Used in the implementation of RectTrait for BoundingBox.
pub struct Corner<'a, N: IndexableNum> {
    coords: &'a [N],
}

impl<N: IndexableNum> CoordTrait for Corner<'_, N> {
    type T = N;

    fn dim(&self) -> Dimensions {
        dimensions(self.coords.len())
    }

    fn x(&self) -> Self::T {
        self.coords[0]
    }

    fn y(&self) -> Self::T {
        self.nth_or_panic(1)
    }

    fn nth_or_panic(&self, n: usize) -> Self::T {
        match self.coords.get(n) {
            Some(value) => *value,
            None => panic!("Invalid index of coord"),
        }
    }
}

impl<N: IndexableNum> GeometryTrait for BoundingBox<N> {
    type T = N;
    type PointType<'a>
        = UnimplementedPoint<N>
    where
        Self: 'a;
    type LineStringType<'a>
        = UnimplementedLineString<N>
    where
        Self: 'a;
    type PolygonType<'a>
        = UnimplementedPolygon<N>
    where
        Self: 'a;
    type MultiPointType<'a>
        = UnimplementedMultiPoint<N>
    where
        Self: 'a;
    type MultiLineStringType<'a>
        = UnimplementedMultiLineString<N>
    where
        Self: 'a;
    type MultiPolygonType<'a>
        = UnimplementedMultiPolygon<N>
    where
        Self: 'a;
    type GeometryCollectionType<'a>
        = UnimplementedGeometryCollection<N>
    where
        Self: 'a;
    type RectType<'a>
        = Self
    where
        Self: 'a;
    type TriangleType<'a>
        = UnimplementedTriangle<N>
    where
        Self: 'a;
    type LineType<'a>
        = UnimplementedLine<N>
    where
        Self: 'a;

    fn dim(&self) -> Dimensions {
        dimensions(self.dim())
    }

    fn as_type(
        &self,
    ) -> GeometryType<
        '_,
        Self::PointType<'_>,
        Self::LineStringType<'_>,
        Self::PolygonType<'_>,
        Self::MultiPointType<'_>,
        Self::MultiLineStringType<'_>,
        Self::MultiPolygonType<'_>,
        Self::GeometryCollectionType<'_>,
        Self::RectType<'_>,
        Self::TriangleType<'_>,
        Self::LineType<'_>,
    > {
        GeometryType::Rect(self)
    }
}

impl<N: IndexableNum> RectTrait for BoundingBox<N> {
    type CoordType<'a>
        = Corner<'a, N>
    where
        Self: 'a;

    fn min(&self) -> Self::CoordType<'_> {
        Corner { coords: &self.min }
    }

    fn max(&self) -> Self::CoordType<'_> {
        Corner { coords: &self.max }
    }
}

fn dimensions(size: usize) -> Dimensions {
    match size {
        2 => Dimensions::Xy,
        3 => Dimensions::Xyz,
        4 => Dimensions::Xyzm,
        n => Dimensions::Unknown(n),
    }
}

/// Copy the coordinates of a [`CoordTrait`] into an owned buffer.
pub(crate) fn coord_to_coords<N: IndexableNum>(coord: &impl CoordTrait<T = N>) -> Coords<N> {
    (0..coord.dim().size())
        .map(|axis| coord.nth_or_panic(axis))
        .collect()
}

/// Convert a [`RectTrait`] into a [`BoundingBox`].
pub(crate) fn rect_to_box<N: IndexableNum>(
    rect: &impl RectTrait<T = N>,
) -> Result<BoundingBox<N>> {
    let min = coord_to_coords(&rect.min());
    let max = coord_to_coords(&rect.max());
    BoundingBox::new(&min, &max)
}
