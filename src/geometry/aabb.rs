use std::ops::{Add, Sub};

use nalgebra::{Point2, Scalar};

use super::{FloatType, WorldBox, WorldPoint, WorldVector};

/// Signs of the child centers relative to the parent center, in child enumeration order.
pub const OCTANT_SIGNS: [[FloatType; 3]; 8] = [
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, 1.0],
];

/// Axis aligned box given by its minimum and maximum corner.
/// `min <= max` componentwise is expected, but not enforced.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }

    pub fn with_size<S>(min: Point, size: &S) -> AABB<Point>
    where
        for<'a> &'a Point: Add<&'a S, Output = Point>,
    {
        let max = &min + size;
        AABB { min, max }
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> AABB<Point2> {
        AABB {
            min: f(&self.min),
            max: f(&self.max),
        }
    }

    pub fn zip_map<Point2, Point3, F: FnMut(&Point, &Point2) -> Point3>(
        &self,
        rhs: &AABB<Point2>,
        mut f: F,
    ) -> AABB<Point3> {
        AABB {
            min: f(&self.min, &rhs.min),
            max: f(&self.max, &rhs.max),
        }
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    pub fn size(&self) -> Point::Output {
        self.max - self.min
    }
}

impl<T: Scalar + Copy + Sub> AABB<Point2<T>> {
    pub fn width(&self) -> T::Output {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> T::Output {
        self.max[1] - self.min[1]
    }
}

impl<Point> From<[Point; 2]> for AABB<Point> {
    fn from(value: [Point; 2]) -> Self {
        let [min, max] = value;
        AABB { min, max }
    }
}

impl<Point> From<(Point, Point)> for AABB<Point> {
    fn from(value: (Point, Point)) -> Self {
        let (min, max) = value;
        AABB { min, max }
    }
}

impl WorldBox {
    /// Smallest box containing all the points, None if the iterator is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> Option<WorldBox> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(WorldBox::new(*first, *first), |b, p| {
            WorldBox::new(b.min.inf(p), b.max.sup(p))
        }))
    }

    pub fn center(&self) -> WorldPoint {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn half_extent(&self) -> WorldVector {
        self.max - self.center()
    }

    /// Strict point containment, points on the boundary are outside.
    pub fn contains_point(&self, point: &WorldPoint) -> bool {
        (0..3).all(|i| self.min[i] < point[i] && point[i] < self.max[i])
    }

    /// Inclusive box containment, `other` may touch the boundary.
    pub fn contains_box(&self, other: &WorldBox) -> bool {
        (0..3).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// Strict overlap test, boxes that only touch don't overlap.
    pub fn overlaps(&self, other: &WorldBox) -> bool {
        (0..3).all(|i| self.max[i] > other.min[i] && self.min[i] < other.max[i])
    }

    /// Overlap test where touching boxes (and zero thickness boxes lying on
    /// a face) count as overlapping.
    pub fn overlaps_inclusive(&self, other: &WorldBox) -> bool {
        (0..3).all(|i| self.max[i] >= other.min[i] && self.min[i] <= other.max[i])
    }

    pub fn union(&self, other: &WorldBox) -> WorldBox {
        WorldBox::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Grows the box by `margin` in every direction.
    pub fn padded(&self, margin: FloatType) -> WorldBox {
        let margin = WorldVector::repeat(margin);
        WorldBox::new(self.min - margin, self.max + margin)
    }

    /// Smallest cube with the same center that contains this box.
    pub fn cubified(&self) -> WorldBox {
        let center = self.center();
        let half = WorldVector::repeat(self.half_extent().max());
        WorldBox::new(center - half, center + half)
    }

    /// One of the 8 equal sub-boxes sharing this box's center, indexed according to `OCTANT_SIGNS`.
    /// Every bound is copied from the parent's min, center or max, so siblings share
    /// their split planes exactly and the octants tile the parent without gaps.
    pub fn octant(&self, index: usize) -> WorldBox {
        let center = self.center();
        let mut octant = WorldBox::new(self.min, self.max);
        for (axis, sign) in OCTANT_SIGNS[index].iter().enumerate() {
            if *sign > 0.0 {
                octant.min[axis] = center[axis];
            } else {
                octant.max[axis] = center[axis];
            }
        }
        octant
    }

    pub fn volume(&self) -> FloatType {
        self.size().product()
    }
}
