#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::many_single_char_names)]
#![no_std]

//! Simple 2D geometric primitives on top of euclid.
//!
//! This crate is reexported in `inkfit`.
//!
//! # Overview.
//!
//! This crate implements the maths needed by the curve fitting algorithms:
//!
//! - line segments and their distance to points,
//! - cubic bézier curves: evaluation, derivatives, tangents, splitting and length.
//!
//! Curve fitting produces cubic bézier segments whose endpoints lie on the
//! source points and whose control points shape the tangent at each end:
//!
//! ```text
//!   ctrl1 ___________ ctrl2
//!        /           \
//!       /             \
//!  from                to
//! ```
//!

#[cfg(any(test, feature = "std"))]
extern crate std;

// Reexport dependencies.
pub use euclid;

pub mod cubic_bezier;
mod line;

#[doc(inline)]
pub use crate::cubic_bezier::CubicBezierSegment;
#[doc(inline)]
pub use crate::line::LineSegment;

pub use crate::scalar::Scalar;

mod scalar {
    pub(crate) use num_traits::Float;

    use core::fmt::{Debug, Display};
    use core::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

    pub trait Scalar:
        Float + Sized + Display + Debug + AddAssign + SubAssign + MulAssign + DivAssign
    {
        const HALF: Self;
        const ZERO: Self;
        const ONE: Self;
        const TWO: Self;
        const THREE: Self;
        const SIX: Self;

        const EPSILON: Self;
    }

    impl Scalar for f32 {
        const HALF: Self = 0.5;
        const ZERO: Self = 0.0;
        const ONE: Self = 1.0;
        const TWO: Self = 2.0;
        const THREE: Self = 3.0;
        const SIX: Self = 6.0;

        const EPSILON: Self = 1e-4;
    }

    impl Scalar for f64 {
        const HALF: Self = 0.5;
        const ZERO: Self = 0.0;
        const ONE: Self = 1.0;
        const TWO: Self = 2.0;
        const THREE: Self = 3.0;
        const SIX: Self = 6.0;

        const EPSILON: Self = 1e-8;
    }
}

/// Alias for `euclid::default::Point2D`.
pub use euclid::default::Point2D as Point;

/// Alias for `euclid::default::Vector2D`.
pub use euclid::default::Vector2D as Vector;

/// Shorthand for `Vector::new(x, y)`.
#[inline]
pub fn vector<S>(x: S, y: S) -> Vector<S> {
    Vector::new(x, y)
}

/// Shorthand for `Point::new(x, y)`.
#[inline]
pub fn point<S>(x: S, y: S) -> Point<S> {
    Point::new(x, y)
}

/// Returns the unit vector pointing in the same direction as `v`, or `None` if `v`
/// is too short to have a meaningful direction.
#[inline]
pub fn try_normalize<S: Scalar>(v: Vector<S>) -> Option<Vector<S>> {
    let len = v.length();
    if len > S::EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Returns whether two points are within `epsilon` of each other.
#[inline]
pub fn points_are_close<S: Scalar>(a: Point<S>, b: Point<S>, epsilon: S) -> bool {
    (a - b).square_length() <= epsilon * epsilon
}

#[test]
fn normalize_degenerate_vectors() {
    assert_eq!(try_normalize(vector(0.0f64, 0.0)), None);
    assert_eq!(try_normalize(vector(3.0f64, 4.0)), Some(vector(0.6, 0.8)));
    assert_eq!(try_normalize(vector(f64::NAN, 1.0)), None);
}

#[test]
fn close_points() {
    assert!(points_are_close(point(1.0f64, 1.0), point(1.0, 1.0), 0.0));
    assert!(points_are_close(point(1.0f64, 1.0), point(1.0, 1.1), 0.2));
    assert!(!points_are_close(point(1.0f64, 1.0), point(1.0, 1.3), 0.2));
}
