//! Least-squares fitting of cubic bézier curves to sequences of points.
//!
//! # Single curve fit
//!
//! [`CurveFitter::fit_curve`] fits one cubic bézier curve to a range of points,
//! with the direction of the curve at both ends imposed by the caller. Imposing the
//! end tangents is what keeps neighboring curves smooth at their junction: the
//! curve on each side of a junction is given the same tangent, with opposite signs.
//!
//! The fit follows Philip J. Schneider's algorithm from "An Algorithm for
//! Automatically Fitting Digitized Curves" (Graphics Gems, 1990):
//!
//! 1. points are assigned a curve parameter in proportion to the distance travelled
//!    along the polyline,
//! 2. the handle lengths that minimize the summed squared distance between the points
//!    and the curve at their parameters are found by solving a 2x2 linear system,
//! 3. if a point is further than the tolerance from the curve, the parameters are
//!    refined with a Newton-Raphson step and the handles solved again, a few times.
//!
//! If the curve still does not fit, the index of the worst point is reported so that
//! the caller can split the range there.
//!
//! # Tangents
//!
//! Tangent directions are by convention pointing from an anchor towards the inside
//! of the curve: the left tangent points forward along the path and the right tangent
//! points backward. [`center_tangent`] follows the right tangent convention.
//!
//! # Whole polyline
//!
//! [`fit_curves`] fits a whole polyline at once by recursively splitting it at the
//! worst point until every piece fits.

use crate::geom::try_normalize;
use crate::math::*;
use crate::preprocess::remove_duplicates;
use crate::{FitError, DEFAULT_EPSILON};

use alloc::vec::Vec;

#[allow(unused_imports)]
use num_traits::Float;

/// Maximum number of points on each side of an anchor used to estimate an end tangent.
pub const END_TANGENT_POINTS: usize = 4;

/// Maximum number of points on each side of a split point used to estimate its tangent.
pub const MID_TANGENT_POINTS: usize = 4;

/// Number of Newton-Raphson refinements attempted before giving up on a fit.
pub const MAX_REPARAMETERIZATIONS: usize = 4;

const FIT_EPSILON: f64 = 1e-12;

/// The result of fitting a single curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FitOutcome {
    /// Every point is within the tolerance of the curve.
    Fitted(CubicBezier),
    /// Some points are too far from the best curve found.
    ///
    /// `split` is the index of the point with the largest error, never one of the
    /// endpoints of the range.
    Split { curve: CubicBezier, split: usize },
}

impl FitOutcome {
    /// The fitted curve, whether it is within the tolerance or not.
    #[inline]
    pub fn curve(&self) -> CubicBezier {
        match *self {
            FitOutcome::Fitted(curve) => curve,
            FitOutcome::Split { curve, .. } => curve,
        }
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }
}

/// Fits single curves to ranges of points.
///
/// All inputs are passed explicitly to each call. The fitter only owns a scratch
/// buffer for the curve parameters which is reused across calls to avoid
/// allocations.
///
/// `arc_lengths[i]` must hold the distance travelled along the polyline from the
/// first point to `points[i]`.
#[derive(Clone, Debug, Default)]
pub struct CurveFitter {
    params: Vec<f64>,
}

impl CurveFitter {
    pub fn new() -> Self {
        CurveFitter { params: Vec::new() }
    }

    /// Fits a cubic bézier curve to `points[first..=last]`.
    ///
    /// The curve starts at `points[first]` in the direction of `tan_left` and ends at
    /// `points[last]` arriving from the direction of `tan_right`. Both tangents are
    /// expected to be unit vectors. The fit succeeds when the squared distance of every
    /// point to the curve is below `squared_tolerance`.
    #[allow(clippy::too_many_arguments)]
    pub fn fit_curve(
        &mut self,
        points: &[Point],
        arc_lengths: &[f64],
        first: usize,
        last: usize,
        tan_left: Vector,
        tan_right: Vector,
        squared_tolerance: f64,
    ) -> FitOutcome {
        debug_assert!(first < last);
        debug_assert!(last < points.len());
        debug_assert_eq!(points.len(), arc_lengths.len());

        if last - first == 1 {
            // Only two points: use the Wu/Barsky heuristic.
            let from = points[first];
            let to = points[last];
            let alpha = (to - from).length() / 3.0;
            return FitOutcome::Fitted(CubicBezier {
                from,
                ctrl1: from + tan_left * alpha,
                ctrl2: to + tan_right * alpha,
                to,
            });
        }

        self.chord_length_parameterize(arc_lengths, first, last);

        let mut curve = self.generate_bezier(points, first, last, tan_left, tan_right);
        let (mut error, mut split) = self.max_squared_error(points, first, last, &curve);

        for _ in 0..MAX_REPARAMETERIZATIONS {
            if error < squared_tolerance {
                return FitOutcome::Fitted(curve);
            }

            self.reparameterize(points, first, &curve);
            curve = self.generate_bezier(points, first, last, tan_left, tan_right);
            let (e, s) = self.max_squared_error(points, first, last, &curve);
            error = e;
            split = s;
        }

        if error < squared_tolerance {
            return FitOutcome::Fitted(curve);
        }

        FitOutcome::Split { curve, split }
    }

    fn chord_length_parameterize(&mut self, arc_lengths: &[f64], first: usize, last: usize) {
        let start = arc_lengths[first];
        let total = arc_lengths[last] - start;
        let n = last - first;

        self.params.clear();
        if total > FIT_EPSILON {
            self.params
                .extend(arc_lengths[first..last].iter().map(|len| (len - start) / total));
        } else {
            self.params.extend((0..n).map(|i| i as f64 / n as f64));
        }
        self.params.push(1.0);
    }

    /// One Newton-Raphson step per interior point to find a better parameter.
    ///
    /// Minimizes `f(u) = (Q(u) - p) . Q'(u)`, the derivative of the squared distance.
    fn reparameterize(&mut self, points: &[Point], first: usize, curve: &CubicBezier) {
        let n = self.params.len();
        for i in 1..(n - 1) {
            let u = self.params[i];
            let diff = curve.sample(u) - points[first + i];
            let d1 = curve.derivative(u);
            let d2 = curve.second_derivative(u);

            let numerator = diff.dot(d1);
            let denominator = d1.dot(d1) + diff.dot(d2);
            if denominator.abs() > FIT_EPSILON {
                let refined = u - numerator / denominator;
                if refined.is_finite() {
                    self.params[i] = refined.max(0.0).min(1.0);
                }
            }
        }
    }

    /// Solves for the handle lengths that minimize the squared error, given the
    /// current parameters and end tangents.
    fn generate_bezier(
        &self,
        points: &[Point],
        first: usize,
        last: usize,
        tan_left: Vector,
        tan_right: Vector,
    ) -> CubicBezier {
        let from = points[first];
        let to = points[last];

        let (mut c00, mut c01, mut c11) = (0.0, 0.0, 0.0);
        let (mut x0, mut x1) = (0.0, 0.0);

        for (i, &t) in self.params.iter().enumerate() {
            let one_t = 1.0 - t;
            let b0 = one_t * one_t * one_t;
            let b1 = 3.0 * one_t * one_t * t;
            let b2 = 3.0 * one_t * t * t;
            let b3 = t * t * t;

            let a0 = tan_left * b1;
            let a1 = tan_right * b2;
            c00 += a0.dot(a0);
            c01 += a0.dot(a1);
            c11 += a1.dot(a1);

            let on_baseline = from.to_vector() * (b0 + b1) + to.to_vector() * (b2 + b3);
            let v = points[first + i].to_vector() - on_baseline;
            x0 += a0.dot(v);
            x1 += a1.dot(v);
        }

        let det_c0_c1 = c00 * c11 - c01 * c01;
        let det_c0_x = c00 * x1 - c01 * x0;
        let det_x_c1 = x0 * c11 - x1 * c01;

        let chord = (to - from).length();
        let fallback = chord / 3.0;
        let (mut alpha_left, mut alpha_right) = if det_c0_c1.abs() > FIT_EPSILON {
            (det_x_c1 / det_c0_c1, det_c0_x / det_c0_c1)
        } else {
            (fallback, fallback)
        };

        // Negative or vanishing handles produce loops or cusps: fall back to the
        // Wu/Barsky heuristic.
        let min_alpha = FIT_EPSILON * chord;
        if !(alpha_left >= min_alpha && alpha_right >= min_alpha) {
            alpha_left = fallback;
            alpha_right = fallback;
        }

        CubicBezier {
            from,
            ctrl1: from + tan_left * alpha_left,
            ctrl2: to + tan_right * alpha_right,
            to,
        }
    }

    /// Returns the largest squared distance between an interior point and the curve
    /// at the point's parameter, and the index of that point.
    fn max_squared_error(
        &self,
        points: &[Point],
        first: usize,
        last: usize,
        curve: &CubicBezier,
    ) -> (f64, usize) {
        let mut max = 0.0;
        let mut split = (first + last + 1) / 2;
        for i in (first + 1)..last {
            let d = (curve.sample(self.params[i - first]) - points[i]).square_length();
            if d > max {
                max = d;
                split = i;
            }
        }

        (max, split.max(first + 1).min(last - 1))
    }
}

/// Estimates the direction of the path at `points[first]`, looking at up to
/// `END_TANGENT_POINTS` points of the range `first..=last`.
///
/// Directions towards nearer points weigh more, which smooths out sampling noise
/// near the start of a curve without letting the rest of the curve dominate.
pub fn left_tangent(points: &[Point], arc_lengths: &[f64], first: usize, last: usize) -> Vector {
    debug_assert!(first < last);

    let anchor = points[first];
    let start = arc_lengths[first];
    let total = arc_lengths[last] - start;
    let end = usize::min(first + END_TANGENT_POINTS, last);

    let mut sum = vector(0.0, 0.0);
    for i in (first + 1)..=end {
        let weight = if i == first + 1 || total <= FIT_EPSILON {
            1.0
        } else {
            let s = 1.0 - (arc_lengths[i] - start) / total;
            s * s * s
        };

        if let Some(direction) = try_normalize(points[i] - anchor) {
            sum += direction * weight;
        }
    }

    // The directions can cancel each other out if the points go back and forth.
    try_normalize(sum)
        .or_else(|| try_normalize(points[last] - anchor))
        .unwrap_or_else(|| vector(1.0, 0.0))
}

/// Estimates the direction of the path at `points[last]`, pointing backward along
/// the path, looking at up to `END_TANGENT_POINTS` points of the range `first..=last`.
pub fn right_tangent(points: &[Point], arc_lengths: &[f64], first: usize, last: usize) -> Vector {
    debug_assert!(first < last);

    let anchor = points[last];
    let start = arc_lengths[first];
    let total = arc_lengths[last] - start;
    let end = usize::max(last.saturating_sub(END_TANGENT_POINTS), first);

    let mut sum = vector(0.0, 0.0);
    for i in (end..last).rev() {
        let weight = if i + 1 == last || total <= FIT_EPSILON {
            1.0
        } else {
            let s = (arc_lengths[i] - start) / total;
            s * s * s
        };

        if let Some(direction) = try_normalize(points[i] - anchor) {
            sum += direction * weight;
        }
    }

    try_normalize(sum)
        .or_else(|| try_normalize(points[first] - anchor))
        .unwrap_or_else(|| vector(-1.0, 0.0))
}

/// Estimates the direction of the path at an interior split point, using up to
/// `MID_TANGENT_POINTS` points on each side within `first..=last`.
///
/// The returned direction points backward along the path. It is the right tangent
/// of the curve ending at the split point, and its negation is the left tangent of
/// the curve starting there.
pub fn center_tangent(points: &[Point], first: usize, last: usize, split: usize) -> Vector {
    debug_assert!(first < split && split < last);

    let anchor = points[split];
    let mut before = vector(0.0, 0.0);
    let mut after = vector(0.0, 0.0);

    for k in 1..=MID_TANGENT_POINTS {
        let weight = (MID_TANGENT_POINTS + 1 - k) as f64 / MID_TANGENT_POINTS as f64;

        if split >= first + k {
            if let Some(direction) = try_normalize(points[split - k] - anchor) {
                before += direction * weight;
            }
        }

        if split + k <= last {
            if let Some(direction) = try_normalize(points[split + k] - anchor) {
                after += direction * weight;
            }
        }
    }

    // At a cusp both sides point the same way and cancel out: there is no smooth
    // tangent, so keep the incoming direction.
    try_normalize(before - after)
        .or_else(|| try_normalize(before))
        .or_else(|| try_normalize(-after))
        .unwrap_or_else(|| vector(-1.0, 0.0))
}

/// Computes the distance travelled along a polyline up to each of its points.
pub fn cumulative_lengths(points: &[Point]) -> Vec<f64> {
    let mut result = Vec::with_capacity(points.len());
    let mut length = 0.0;
    let mut prev = match points.first() {
        Some(p) => *p,
        None => return result,
    };

    for &p in points {
        length += (p - prev).length();
        result.push(length);
        prev = p;
    }

    result
}

/// Fits a whole polyline with as few connected cubic bézier curves as possible, such
/// that no point is further than `max_error` from the curves.
///
/// Consecutive duplicate points are removed before fitting. Consecutive curves share
/// their endpoints and their tangent directions at the junction.
pub fn fit_curves(points: &[Point], max_error: f64) -> Result<Vec<CubicBezier>, FitError> {
    if !(max_error >= DEFAULT_EPSILON) {
        return Err(FitError::InvalidTolerance(max_error));
    }

    let points = remove_duplicates(points, DEFAULT_EPSILON);
    if points.len() < 2 {
        return Err(FitError::NotEnoughPoints(points.len()));
    }

    let arc_lengths = cumulative_lengths(&points);
    let last = points.len() - 1;
    let tan_left = left_tangent(&points, &arc_lengths, 0, last);
    let tan_right = right_tangent(&points, &arc_lengths, 0, last);

    let mut fit = RecursiveFit {
        fitter: CurveFitter::new(),
        points: &points,
        arc_lengths: &arc_lengths,
        squared_error: max_error * max_error,
        curves: Vec::new(),
    };
    fit.fit_range(0, last, tan_left, tan_right);

    log::debug!(
        "fitted {} points with {} curves (max error: {})",
        points.len(),
        fit.curves.len(),
        max_error
    );

    Ok(fit.curves)
}

struct RecursiveFit<'l> {
    fitter: CurveFitter,
    points: &'l [Point],
    arc_lengths: &'l [f64],
    squared_error: f64,
    curves: Vec<CubicBezier>,
}

impl<'l> RecursiveFit<'l> {
    fn fit_range(&mut self, first: usize, last: usize, tan_left: Vector, tan_right: Vector) {
        let outcome = self.fitter.fit_curve(
            self.points,
            self.arc_lengths,
            first,
            last,
            tan_left,
            tan_right,
            self.squared_error,
        );

        let split = match outcome {
            FitOutcome::Fitted(curve) => {
                self.curves.push(curve);
                return;
            }
            FitOutcome::Split { split, .. } => split,
        };

        let tan_center = center_tangent(self.points, first, last, split);

        // The end tangents of the whole polyline may have been estimated with points that
        // are no longer part of the sub-range near the ends. The tangent at the split must
        // stay as is to keep both halves smooth.
        let mut tan_left = tan_left;
        let mut tan_right = tan_right;
        let end = self.points.len() - 1;
        if first == 0 && split < END_TANGENT_POINTS {
            tan_left = left_tangent(self.points, self.arc_lengths, first, split);
        }
        if last == end && split + END_TANGENT_POINTS > end {
            tan_right = right_tangent(self.points, self.arc_lengths, split, last);
        }

        self.fit_range(first, split, tan_left, tan_center);
        self.fit_range(split, last, -tan_center, tan_right);
    }
}

#[cfg(test)]
fn assert_continuous(curves: &[CubicBezier]) {
    for pair in curves.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
}

#[cfg(test)]
fn fit_all(points: &[Point], tolerance: f64) -> FitOutcome {
    let arc_lengths = cumulative_lengths(points);
    let last = points.len() - 1;
    let tan_left = left_tangent(points, &arc_lengths, 0, last);
    let tan_right = right_tangent(points, &arc_lengths, 0, last);

    CurveFitter::new().fit_curve(
        points,
        &arc_lengths,
        0,
        last,
        tan_left,
        tan_right,
        tolerance * tolerance,
    )
}

#[test]
fn fit_two_points() {
    let points = [point(0.0, 0.0), point(9.0, 0.0)];
    let outcome = fit_all(&points, 0.1);
    assert_eq!(
        outcome,
        FitOutcome::Fitted(CubicBezier {
            from: point(0.0, 0.0),
            ctrl1: point(3.0, 0.0),
            ctrl2: point(6.0, 0.0),
            to: point(9.0, 0.0),
        })
    );
}

#[test]
fn fit_straight_line() {
    let points: Vec<Point> = (0..=20).map(|i| point(i as f64 * 5.0, 0.0)).collect();
    let outcome = fit_all(&points, 0.01);
    assert!(outcome.is_fitted());

    let curve = outcome.curve();
    assert_eq!(curve.from, point(0.0, 0.0));
    assert_eq!(curve.to, point(100.0, 0.0));
    for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
        assert!(curve.sample(t).y.abs() < 1e-9);
    }
}

#[test]
fn fit_reproduces_a_cubic() {
    let source = CubicBezier {
        from: point(0.0, 0.0),
        ctrl1: point(30.0, 60.0),
        ctrl2: point(70.0, 60.0),
        to: point(100.0, 0.0),
    };
    let points: Vec<Point> = (0..=50).map(|i| source.sample(i as f64 / 50.0)).collect();

    let outcome = fit_all(&points, 2.0);
    assert!(outcome.is_fitted(), "{:?}", outcome);
    let curve = outcome.curve();
    for p in &points {
        let closest = (0..=200)
            .map(|i| (curve.sample(i as f64 / 200.0) - *p).length())
            .fold(f64::MAX, f64::min);
        assert!(closest < 2.0);
    }
}

#[test]
fn fit_reports_worst_point() {
    // A right angle cannot be fitted with a single curve within a tight tolerance.
    let mut points: Vec<Point> = (0..=10).map(|i| point(i as f64 * 5.0, 0.0)).collect();
    points.extend((1..=10).map(|i| point(50.0, i as f64 * 5.0)));

    match fit_all(&points, 0.5) {
        FitOutcome::Split { split, .. } => {
            assert!(split > 0 && split < points.len() - 1);
            // The corner is the furthest point from any smooth approximation.
            assert!((8..=12).contains(&split), "split: {}", split);
        }
        outcome => panic!("expected a split, got {:?}", outcome),
    }
}

#[test]
fn end_tangents() {
    let points = [
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(2.0, 0.0),
        point(3.0, 0.0),
        point(4.0, 0.0),
        point(5.0, 0.0),
    ];
    let arc_lengths = cumulative_lengths(&points);

    assert_eq!(left_tangent(&points, &arc_lengths, 0, 5), vector(1.0, 0.0));
    assert_eq!(right_tangent(&points, &arc_lengths, 0, 5), vector(-1.0, 0.0));
    assert_eq!(left_tangent(&points, &arc_lengths, 2, 3), vector(1.0, 0.0));
    assert_eq!(right_tangent(&points, &arc_lengths, 2, 3), vector(-1.0, 0.0));
}

#[test]
fn end_tangents_of_duplicate_points() {
    let points = [point(1.0, 1.0), point(1.0, 1.0), point(1.0, 1.0)];
    let arc_lengths = cumulative_lengths(&points);

    let left = left_tangent(&points, &arc_lengths, 0, 2);
    let right = right_tangent(&points, &arc_lengths, 0, 2);
    approx::assert_abs_diff_eq!(left.length(), 1.0);
    approx::assert_abs_diff_eq!(right.length(), 1.0);
}

#[test]
fn center_tangent_points_backward() {
    let points: Vec<Point> = (0..=10).map(|i| point(i as f64, 0.0)).collect();
    assert_eq!(center_tangent(&points, 0, 10, 5), vector(-1.0, 0.0));

    // Symmetric corner: the tangent bisects the two directions.
    let corner = [
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(2.0, 0.0),
        point(2.0, 1.0),
        point(2.0, 2.0),
    ];
    let tangent = center_tangent(&corner, 0, 4, 2);
    let expected = vector(-1.0, -1.0) / 2.0f64.sqrt();
    assert!((tangent - expected).length() < 1e-12);
}

#[test]
fn cumulative_lengths_of_polyline() {
    let points = [point(0.0, 0.0), point(3.0, 4.0), point(3.0, 10.0)];
    assert_eq!(cumulative_lengths(&points), [0.0, 5.0, 11.0]);
    assert_eq!(cumulative_lengths(&[]), Vec::<f64>::new());
}

#[test]
fn fit_curves_splits_corners() {
    let mut points: Vec<Point> = (0..=20).map(|i| point(i as f64 * 5.0, 0.0)).collect();
    points.extend((1..=20).map(|i| point(100.0, i as f64 * 5.0)));

    let curves = fit_curves(&points, 1.0).unwrap();
    assert!(curves.len() >= 2);
    assert_continuous(&curves);
    assert_eq!(curves.first().unwrap().from, point(0.0, 0.0));
    assert_eq!(curves.last().unwrap().to, point(100.0, 100.0));
}

#[test]
fn fit_curves_single_curve() {
    let points: Vec<Point> = (0..=10).map(|i| point(i as f64, 2.0)).collect();
    let curves = fit_curves(&points, 0.1).unwrap();
    assert_eq!(curves.len(), 1);
}

#[test]
fn fit_curves_invalid_input() {
    assert_eq!(
        fit_curves(&[point(0.0, 0.0)], 1.0),
        Err(FitError::NotEnoughPoints(1))
    );
    assert_eq!(
        fit_curves(&[point(0.0, 0.0), point(0.0, 0.0)], 1.0),
        Err(FitError::NotEnoughPoints(1))
    );
    assert_eq!(
        fit_curves(&[point(0.0, 0.0), point(1.0, 0.0)], 0.0),
        Err(FitError::InvalidTolerance(0.0))
    );
    assert!(fit_curves(&[point(0.0, 0.0), point(1.0, 0.0)], f64::NAN).is_err());
}
