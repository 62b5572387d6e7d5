use crate::scalar::Scalar;
use crate::{Point, Vector};

/// A linear segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineSegment<S> {
    pub from: Point<S>,
    pub to: Point<S>,
}

impl<S: Scalar> LineSegment<S> {
    #[inline]
    pub fn to_vector(&self) -> Vector<S> {
        self.to - self.from
    }

    /// Computes the length of this segment.
    #[inline]
    pub fn length(&self) -> S {
        self.to_vector().length()
    }

    /// Computes the distance between `p` and the infinite line that contains this segment.
    ///
    /// The result is NaN if the segment is degenerate (both endpoints at the same position).
    pub fn distance_to_line(&self, p: Point<S>) -> S {
        let v = self.to_vector();
        S::abs(v.cross(p - self.from)) / v.length()
    }
}

#[cfg(test)]
use crate::point;

#[test]
fn distance_to_line() {
    let segment = LineSegment {
        from: point(0.0f64, 0.0),
        to: point(10.0, 0.0),
    };

    assert_eq!(segment.distance_to_line(point(5.0, 3.0)), 3.0);
    assert_eq!(segment.distance_to_line(point(20.0, -4.0)), 4.0);
}

#[test]
fn degenerate_segment_distance() {
    let segment = LineSegment {
        from: point(1.0f64, 1.0),
        to: point(1.0, 1.0),
    };

    assert!(segment.distance_to_line(point(2.0, 2.0)).is_nan());
    assert_eq!(segment.length(), 0.0);
}
