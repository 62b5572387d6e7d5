use crate::scalar::Scalar;
use crate::{try_normalize, LineSegment, Point, Vector};

/// A 2d curve segment defined by four points: the beginning of the segment, two control
/// points and the end of the segment.
///
/// The curve is defined by equation:
/// ```∀ t ∈ [0..1],  P(t) = (1 - t)³ * from + 3 * (1 - t)² * t * ctrl1 + 3 * t² * (1 - t) * ctrl2 + t³ * to```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CubicBezierSegment<S> {
    pub from: Point<S>,
    pub ctrl1: Point<S>,
    pub ctrl2: Point<S>,
    pub to: Point<S>,
}

impl<S: Scalar> CubicBezierSegment<S> {
    /// Sample the curve at t (expecting t between 0 and 1).
    pub fn sample(&self, t: S) -> Point<S> {
        let t2 = t * t;
        let t3 = t2 * t;
        let one_t = S::ONE - t;
        let one_t2 = one_t * one_t;
        let one_t3 = one_t2 * one_t;

        self.from * one_t3
            + self.ctrl1.to_vector() * S::THREE * one_t2 * t
            + self.ctrl2.to_vector() * S::THREE * one_t * t2
            + self.to.to_vector() * t3
    }

    /// Sample the curve's derivative at t (expecting t between 0 and 1).
    pub fn derivative(&self, t: S) -> Vector<S> {
        let one_t = S::ONE - t;
        let d0 = self.ctrl1 - self.from;
        let d1 = self.ctrl2 - self.ctrl1;
        let d2 = self.to - self.ctrl2;

        (d0 * (one_t * one_t) + d1 * (S::TWO * one_t * t) + d2 * (t * t)) * S::THREE
    }

    /// Sample the curve's second derivative at t (expecting t between 0 and 1).
    pub fn second_derivative(&self, t: S) -> Vector<S> {
        let dd0 = self.ctrl2.to_vector() - self.ctrl1.to_vector() * S::TWO + self.from.to_vector();
        let dd1 = self.to.to_vector() - self.ctrl2.to_vector() * S::TWO + self.ctrl1.to_vector();

        (dd0 * (S::ONE - t) + dd1 * t) * S::SIX
    }

    /// Sample the unit tangent of the curve at t (expecting t between 0 and 1).
    ///
    /// Where the derivative vanishes (a control point sitting on top of its endpoint),
    /// the direction is taken from the nearest control point that differs, and from
    /// the baseline for fully degenerate curves. Returns a zero vector if the curve
    /// is a single point.
    pub fn tangent(&self, t: S) -> Vector<S> {
        if let Some(v) = try_normalize(self.derivative(t)) {
            return v;
        }

        let fallback = if t < S::HALF {
            [self.ctrl2 - self.from, self.to - self.from]
        } else {
            [self.to - self.ctrl1, self.to - self.from]
        };

        fallback
            .iter()
            .find_map(|v| try_normalize(*v))
            .unwrap_or_else(Vector::zero)
    }

    /// Split this curve into two sub-curves.
    pub fn split(&self, t: S) -> (CubicBezierSegment<S>, CubicBezierSegment<S>) {
        let ctrl1a = self.from.lerp(self.ctrl1, t);
        let ctrl2a = self.ctrl1.lerp(self.ctrl2, t);
        let ctrl3a = self.ctrl2.lerp(self.to, t);
        let ctrl1aa = ctrl1a.lerp(ctrl2a, t);
        let ctrl2aa = ctrl2a.lerp(ctrl3a, t);
        let split_point = ctrl1aa.lerp(ctrl2aa, t);

        (
            CubicBezierSegment {
                from: self.from,
                ctrl1: ctrl1a,
                ctrl2: ctrl1aa,
                to: split_point,
            },
            CubicBezierSegment {
                from: split_point,
                ctrl1: ctrl2aa,
                ctrl2: ctrl3a,
                to: self.to,
            },
        )
    }

    #[inline]
    pub fn baseline(&self) -> LineSegment<S> {
        LineSegment {
            from: self.from,
            to: self.to,
        }
    }

    /// Returns true if the curve can be approximated with a single line segment, given
    /// a tolerance threshold.
    pub fn is_linear(&self, tolerance: S) -> bool {
        let baseline = self.to - self.from;
        let baseline_len2 = baseline.square_length();
        let threshold = tolerance * tolerance;

        if baseline_len2 <= threshold {
            // The endpoints are (almost) the same point, only the handles matter.
            return (self.ctrl1 - self.from).square_length() <= threshold
                && (self.ctrl2 - self.from).square_length() <= threshold;
        }

        // The curve is contained in the convex hull of its control points, so
        // bounding the handles' distance to the baseline bounds the curve's.
        let c1 = baseline.cross(self.ctrl1 - self.from);
        let c2 = baseline.cross(self.ctrl2 - self.from);
        let d1 = (c1 * c1) / baseline_len2;
        let d2 = (c2 * c2) / baseline_len2;

        d1 <= threshold && d2 <= threshold
    }

    /// Approximates the length of the curve by recursively subdividing it until
    /// each piece is flat enough to be measured as a straight line.
    pub fn approximate_length(&self, tolerance: S) -> S {
        let tolerance = S::max(tolerance, S::EPSILON);
        let mut length = S::ZERO;
        accumulate_length(self, tolerance, 0, &mut length);

        length
    }
}

const MAX_LENGTH_SUBDIVISIONS: u32 = 16;

fn accumulate_length<S: Scalar>(
    curve: &CubicBezierSegment<S>,
    tolerance: S,
    depth: u32,
    length: &mut S,
) {
    if depth >= MAX_LENGTH_SUBDIVISIONS || curve.is_linear(tolerance) {
        *length += curve.baseline().length();
        return;
    }

    let (a, b) = curve.split(S::HALF);
    accumulate_length(&a, tolerance, depth + 1, length);
    accumulate_length(&b, tolerance, depth + 1, length);
}

#[cfg(test)]
use crate::{point, vector};

#[cfg(test)]
fn assert_close(a: Point<f64>, b: Point<f64>, epsilon: f64) {
    if (a - b).length() > epsilon {
        std::println!("{:?} != {:?}", a, b);
    }
    assert!((a - b).length() <= epsilon);
}

#[test]
fn sample_endpoints() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(1.0, 2.0),
        ctrl2: point(3.0, -1.0),
        to: point(4.0, 0.0),
    };

    assert_eq!(curve.sample(0.0), curve.from);
    assert_eq!(curve.sample(1.0), curve.to);
}

#[test]
fn derivative_matches_finite_difference() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(1.0, 2.0),
        ctrl2: point(3.0, -1.0),
        to: point(4.0, 0.0),
    };

    let h = 1e-6;
    for i in 1..10 {
        let t = i as f64 / 10.0;
        let expected = (curve.sample(t + h) - curve.sample(t - h)) / (2.0 * h);
        let d = curve.derivative(t);
        assert!((d - expected).length() < 1e-4);

        let expected2 = (curve.derivative(t + h) - curve.derivative(t - h)) / (2.0 * h);
        assert!((curve.second_derivative(t) - expected2).length() < 1e-3);
    }
}

#[test]
fn tangent_of_degenerate_handles() {
    // Both handles on top of their anchors: the derivative is zero at both ends.
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(0.0, 0.0),
        ctrl2: point(10.0, 0.0),
        to: point(10.0, 0.0),
    };

    assert_eq!(curve.tangent(0.0), vector(1.0, 0.0));
    assert_eq!(curve.tangent(1.0), vector(1.0, 0.0));
    assert_eq!(curve.tangent(0.5), vector(1.0, 0.0));

    let dot = CubicBezierSegment {
        from: point(1.0f64, 1.0),
        ctrl1: point(1.0, 1.0),
        ctrl2: point(1.0, 1.0),
        to: point(1.0, 1.0),
    };
    assert_eq!(dot.tangent(0.5), vector(0.0, 0.0));
}

#[test]
fn split_is_continuous() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(1.0, 2.0),
        ctrl2: point(3.0, -1.0),
        to: point(4.0, 0.0),
    };

    let (a, b) = curve.split(0.3);
    assert_eq!(a.from, curve.from);
    assert_eq!(a.to, b.from);
    assert_eq!(b.to, curve.to);
    assert_close(a.to, curve.sample(0.3), 1e-12);
    assert_close(a.sample(0.5), curve.sample(0.15), 1e-12);
    assert_close(b.sample(0.5), curve.sample(0.65), 1e-12);
}

#[test]
fn length_of_straight_curve() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(10.0, 0.0),
        ctrl2: point(20.0, 0.0),
        to: point(30.0, 0.0),
    };

    assert!(curve.is_linear(0.01));
    assert!((curve.approximate_length(0.01) - 30.0).abs() < 1e-9);
}

#[test]
fn length_of_quarter_circle() {
    // Classic cubic approximation of a quarter of the unit circle.
    let k = 0.5522847498f64;
    let curve = CubicBezierSegment {
        from: point(1.0f64, 0.0),
        ctrl1: point(1.0, k),
        ctrl2: point(k, 1.0),
        to: point(0.0, 1.0),
    };

    assert!(!curve.is_linear(0.01));
    let expected = core::f64::consts::FRAC_PI_2;
    assert!((curve.approximate_length(1e-4) - expected).abs() < 1e-3);
}
