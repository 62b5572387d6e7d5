//! Fit curves incrementally as points are added.
//!
//! # Overview
//!
//! The `CurveBuilder` receives raw points one at a time, typically from pointer input,
//! and maintains a list of connected cubic bézier curves approximating them.
//!
//! Raw points are first resampled at a regular interval (`FitOptions::point_distance`).
//! Each resampled point extends the last curve, which is refitted over all of its
//! points. When the refitted curve no longer stays within the tolerance, it is split
//! at its worst point into two curves that share the tangent at the split point.
//!
//! Only the last curve is ever refitted, so earlier curves never change once a later
//! curve has been started. Each call to `add_point` reports which curves changed so
//! that dependent structures can be updated incrementally (see `SplineBuilder`).
//!
//! ## Example
//!
//! ```
//! use inkfit_algorithms::builder::CurveBuilder;
//! use inkfit_algorithms::math::point;
//!
//! let mut builder = CurveBuilder::new(2.0, 0.5);
//! for i in 0..50 {
//!     let t = i as f64 * 0.1;
//!     builder.add_point(point(t * 20.0, (t * 2.0).sin() * 20.0));
//! }
//!
//! for pair in builder.curves().windows(2) {
//!     assert_eq!(pair[0].to, pair[1].from);
//! }
//! ```

use crate::fit::{center_tangent, left_tangent, right_tangent, CurveFitter, FitOutcome};
use crate::fit::END_TANGENT_POINTS;
use crate::geom::try_normalize;
use crate::math::*;
use crate::{FitOptions, InvalidPackedResult, DEFAULT_EPSILON};

use core::convert::TryFrom;

use alloc::vec::Vec;

#[allow(unused_imports)]
use num_traits::Float;

/// Smallest accepted resampling distance.
const MIN_POINT_DISTANCE: f64 = 1e-6;

/// Which curves changed as a result of adding a point to a `CurveBuilder`.
///
/// `first` is the lowest index of the curves that changed. Every curve at or after
/// that index must be considered modified or new.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddPointResult {
    /// No curve was modified.
    NoChange,
    /// Curves were modified in place, none were added.
    Changed { first: usize },
    /// At least one curve was added, and curves starting at `first` may have changed.
    Added { first: usize },
}

impl AddPointResult {
    /// Index of the first curve that was modified or added.
    #[inline]
    pub fn first_changed_index(&self) -> Option<usize> {
        match *self {
            AddPointResult::NoChange => None,
            AddPointResult::Changed { first } | AddPointResult::Added { first } => Some(first),
        }
    }

    /// Whether the number of curves grew.
    #[inline]
    pub fn was_added(&self) -> bool {
        matches!(self, AddPointResult::Added { .. })
    }

    /// Whether any curve was modified or added.
    #[inline]
    pub fn was_changed(&self) -> bool {
        !matches!(self, AddPointResult::NoChange)
    }

    /// Combines the results of two consecutive operations.
    pub fn merge(self, other: Self) -> Self {
        match (self.first_changed_index(), other.first_changed_index()) {
            (None, _) => other,
            (_, None) => self,
            (Some(a), Some(b)) => {
                let first = usize::min(a, b);
                if self.was_added() || other.was_added() {
                    AddPointResult::Added { first }
                } else {
                    AddPointResult::Changed { first }
                }
            }
        }
    }

    /// Decodes the signed integer representation of a result.
    ///
    /// Zero means no change. Otherwise the magnitude is the index of the first changed
    /// curve plus one and a negative sign means that curves were added.
    pub fn from_packed(value: i64) -> Result<Self, InvalidPackedResult> {
        if value == 0 {
            return Ok(AddPointResult::NoChange);
        }

        let first = value
            .checked_abs()
            .and_then(|v| usize::try_from(v - 1).ok())
            .ok_or(InvalidPackedResult(value))?;

        Ok(if value < 0 {
            AddPointResult::Added { first }
        } else {
            AddPointResult::Changed { first }
        })
    }

    /// Encodes the result as a signed integer, see `from_packed`.
    ///
    /// Returns `None` if the index is too large to be represented.
    pub fn to_packed(&self) -> Option<i64> {
        match *self {
            AddPointResult::NoChange => Some(0),
            AddPointResult::Changed { first } => i64::try_from(first).ok()?.checked_add(1),
            AddPointResult::Added { first } => {
                i64::try_from(first).ok()?.checked_add(1).map(|v| -v)
            }
        }
    }
}

impl Default for AddPointResult {
    fn default() -> Self {
        AddPointResult::NoChange
    }
}

/// The curve that is still being extended: it starts at `points[first]` and
/// ends at the last point.
#[derive(Copy, Clone, Debug, PartialEq)]
struct OpenSegment {
    first: usize,
    /// Tangent at `points[first]`, fixed by the curve before it.
    tangent: Vector,
}

/// Incrementally fits a stream of points with connected cubic bézier curves.
///
/// See the [module documentation](index.html).
#[derive(Clone, Debug)]
pub struct CurveBuilder {
    point_distance: f64,
    squared_error: f64,
    /// Resampled points.
    points: Vec<Point>,
    /// Distance along the resampled points up to each of them.
    arc_lengths: Vec<f64>,
    curves: Vec<CubicBezier>,
    open: Option<OpenSegment>,
    fitter: CurveFitter,
}

impl CurveBuilder {
    /// Creates a builder that resamples its input every `point_distance` units and keeps
    /// the resampled points within `error` of the curves.
    pub fn new(point_distance: f64, error: f64) -> Self {
        CurveBuilder {
            point_distance: f64::max(point_distance, MIN_POINT_DISTANCE),
            squared_error: error * error,
            points: Vec::new(),
            arc_lengths: Vec::new(),
            curves: Vec::new(),
            open: None,
            fitter: CurveFitter::new(),
        }
    }

    pub fn with_options(options: &FitOptions) -> Self {
        Self::new(options.point_distance, options.tolerance)
    }

    /// Adds a raw point and refits the curves.
    ///
    /// Points closer than the resampling distance to the last resampled point are
    /// ignored. Points further away are reached by as many resampling steps as fit in
    /// the distance, each of which extends the curves. The remainder carries over to
    /// the next point, so resampled points stay exactly `point_distance` apart.
    pub fn add_point(&mut self, p: Point) -> AddPointResult {
        let prev = match self.points.last().cloned() {
            Some(prev) => prev,
            None => {
                // No curve can exist with a single point.
                self.points.push(p);
                self.arc_lengths.push(0.0);
                return AddPointResult::NoChange;
            }
        };

        let step = self.point_distance;
        let distance = (p - prev).length();
        if !(distance >= step) {
            return AddPointResult::NoChange;
        }

        let direction = (p - prev) / distance;
        let steps = ((distance + DEFAULT_EPSILON) / step).floor() as usize;

        let mut result = AddPointResult::NoChange;
        for i in 1..=steps {
            let resampled = prev + direction * (step * i as f64);
            result = result.merge(self.add_internal(resampled));
        }

        result
    }

    fn add_internal(&mut self, p: Point) -> AddPointResult {
        debug_assert!(!self.points.is_empty());

        let last = self.points.len();
        let prev_point = self.points[last - 1];
        let prev_length = self.arc_lengths[last - 1];
        self.points.push(p);
        self.arc_lengths.push(prev_length + (p - prev_point).length());

        let open = match self.open {
            Some(open) => open,
            None => return self.seed(),
        };

        let last_curve = self.curves.len() - 1;

        // The first curve has no predecessor to agree with, its start tangent can
        // keep improving as points are added.
        let tan_left = if last_curve == 0 {
            left_tangent(&self.points, &self.arc_lengths, 0, last)
        } else {
            open.tangent
        };
        let tan_right = right_tangent(&self.points, &self.arc_lengths, open.first, last);

        let outcome = self.fitter.fit_curve(
            &self.points,
            &self.arc_lengths,
            open.first,
            last,
            tan_left,
            tan_right,
            self.squared_error,
        );

        let split = match outcome {
            FitOutcome::Fitted(curve) => {
                self.curves[last_curve] = curve;
                log::trace!("refitted curve {} over {} points", last_curve, last - open.first + 1);
                return AddPointResult::Changed { first: last_curve };
            }
            FitOutcome::Split { split, .. } => split,
        };

        let tan_center = center_tangent(&self.points, open.first, last, split);

        // The start tangent may have been estimated with points that now belong to
        // the next curve.
        let tan_left = if last_curve == 0 && split < END_TANGENT_POINTS {
            left_tangent(&self.points, &self.arc_lengths, 0, split)
        } else {
            tan_left
        };

        let left = self.fitter.fit_curve(
            &self.points,
            &self.arc_lengths,
            open.first,
            split,
            tan_left,
            tan_center,
            self.squared_error,
        );
        let right = self.fitter.fit_curve(
            &self.points,
            &self.arc_lengths,
            split,
            last,
            -tan_center,
            tan_right,
            self.squared_error,
        );

        self.curves[last_curve] = left.curve();
        self.curves.push(right.curve());
        self.open = Some(OpenSegment {
            first: split,
            tangent: -tan_center,
        });

        log::debug!(
            "split curve {} at point {} ({} curves, {} points)",
            last_curve,
            split,
            self.curves.len(),
            self.points.len()
        );

        AddPointResult::Added { first: last_curve }
    }

    /// Creates the first curve: a straight line between the first two points.
    fn seed(&mut self) -> AddPointResult {
        debug_assert!(self.curves.is_empty());
        debug_assert_eq!(self.points.len(), 2);

        let from = self.points[0];
        let to = self.points[1];
        let tangent = try_normalize(to - from).unwrap_or_else(|| vector(1.0, 0.0));
        let alpha = self.point_distance / 3.0;

        self.curves.push(CubicBezier {
            from,
            ctrl1: from + tangent * alpha,
            ctrl2: to - tangent * alpha,
            to,
        });
        self.open = Some(OpenSegment { first: 0, tangent });

        log::trace!("seeded first curve from {:?} to {:?}", from, to);

        AddPointResult::Added { first: 0 }
    }

    /// Removes all points and curves.
    pub fn clear(&mut self) {
        self.points.clear();
        self.arc_lengths.clear();
        self.curves.clear();
        self.open = None;
    }

    /// The fitted curves, in order.
    #[inline]
    pub fn curves(&self) -> &[CubicBezier] {
        &self.curves
    }

    /// The resampled points the curves are fitted to.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    #[inline]
    pub fn point_distance(&self) -> f64 {
        self.point_distance
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.squared_error.sqrt()
    }

    /// The parameters this builder was created with.
    pub fn options(&self) -> FitOptions {
        FitOptions {
            point_distance: self.point_distance,
            tolerance: self.tolerance(),
        }
    }
}

#[cfg(test)]
use rand::{rngs::StdRng, Rng, SeedableRng};

#[cfg(test)]
fn assert_continuous(curves: &[CubicBezier]) {
    for pair in curves.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
}

#[test]
fn add_point_result_accessors() {
    let none = AddPointResult::default();
    assert_eq!(none, AddPointResult::NoChange);
    assert!(!none.was_changed());
    assert!(!none.was_added());
    assert_eq!(none.first_changed_index(), None);

    let changed = AddPointResult::Changed { first: 3 };
    assert!(changed.was_changed());
    assert!(!changed.was_added());
    assert_eq!(changed.first_changed_index(), Some(3));

    let added = AddPointResult::Added { first: 0 };
    assert!(added.was_changed());
    assert!(added.was_added());
    assert_eq!(added.first_changed_index(), Some(0));
}

#[test]
fn add_point_result_merge() {
    use AddPointResult::*;

    assert_eq!(NoChange.merge(NoChange), NoChange);
    assert_eq!(NoChange.merge(Changed { first: 2 }), Changed { first: 2 });
    assert_eq!(Added { first: 2 }.merge(NoChange), Added { first: 2 });
    assert_eq!(Changed { first: 2 }.merge(Changed { first: 3 }), Changed { first: 2 });
    assert_eq!(Added { first: 2 }.merge(Changed { first: 3 }), Added { first: 2 });
    assert_eq!(Changed { first: 3 }.merge(Added { first: 3 }), Added { first: 3 });
}

#[test]
fn add_point_result_packing() {
    use AddPointResult::*;

    assert_eq!(AddPointResult::from_packed(0), Ok(NoChange));
    assert_eq!(AddPointResult::from_packed(1), Ok(Changed { first: 0 }));
    assert_eq!(AddPointResult::from_packed(-1), Ok(Added { first: 0 }));
    assert_eq!(AddPointResult::from_packed(-8), Ok(Added { first: 7 }));
    assert_eq!(
        AddPointResult::from_packed(i64::MIN),
        Err(InvalidPackedResult(i64::MIN))
    );

    for result in [NoChange, Changed { first: 5 }, Added { first: 0 }, Added { first: 9 }] {
        let packed = result.to_packed().unwrap();
        assert_eq!(AddPointResult::from_packed(packed), Ok(result));
    }
    assert_eq!(NoChange.to_packed(), Some(0));
}

#[test]
fn first_point_does_not_create_curves() {
    let mut builder = CurveBuilder::new(1.0, 0.5);
    assert_eq!(builder.add_point(point(0.0, 0.0)), AddPointResult::NoChange);
    assert!(builder.is_empty());
    assert_eq!(builder.points().len(), 1);
}

#[test]
fn second_point_seeds_a_line() {
    let mut builder = CurveBuilder::new(3.0, 0.5);
    builder.add_point(point(0.0, 0.0));
    assert_eq!(builder.add_point(point(3.0, 0.0)), AddPointResult::Added { first: 0 });
    assert_eq!(
        builder.curves(),
        &[CubicBezier {
            from: point(0.0, 0.0),
            ctrl1: point(1.0, 0.0),
            ctrl2: point(2.0, 0.0),
            to: point(3.0, 0.0),
        }]
    );
}

#[test]
fn close_points_are_ignored() {
    let mut builder = CurveBuilder::new(5.0, 1.0);
    builder.add_point(point(0.0, 0.0));
    builder.add_point(point(10.0, 0.0));
    let curves = builder.curves().to_vec();
    let points = builder.points().len();

    assert_eq!(builder.add_point(point(10.0, 0.0)), AddPointResult::NoChange);
    assert_eq!(builder.add_point(point(12.0, 1.0)), AddPointResult::NoChange);
    assert_eq!(builder.curves(), &curves[..]);
    assert_eq!(builder.points().len(), points);

    // Small moves accumulate from the last point that was taken into account.
    assert!(builder.add_point(point(14.0, 3.5)).was_changed());
}

#[test]
fn large_jumps_are_resampled() {
    let mut builder = CurveBuilder::new(5.0, 1.0);
    builder.add_point(point(0.0, 0.0));
    let result = builder.add_point(point(50.0, 0.0));

    // The seed and the refits of the first curve are merged.
    assert_eq!(result, AddPointResult::Added { first: 0 });
    assert_eq!(builder.points().len(), 11);
    for (i, p) in builder.points().iter().enumerate() {
        approx::assert_abs_diff_eq!(p.x, i as f64 * 5.0, epsilon = 1e-9);
    }
    assert_eq!(builder.len(), 1);

    let result = builder.add_point(point(100.0, 0.0));
    assert_eq!(result, AddPointResult::Changed { first: 0 });
    assert_eq!(builder.len(), 1);
    assert_eq!(builder.curves()[0].to, point(100.0, 0.0));
}

#[test]
fn resampled_points_are_evenly_spaced() {
    let mut builder = CurveBuilder::new(5.0, 1.0);
    for i in 0..=20 {
        builder.add_point(point(i as f64 * 3.0, 0.0));
    }

    // 60 units of input: the remainder of each move counts towards the next step.
    let points = builder.points();
    assert_eq!(points.len(), 13);
    for (i, p) in points.iter().enumerate() {
        approx::assert_abs_diff_eq!(p.x, i as f64 * 5.0, epsilon = 1e-9);
    }

    // Moving back within a step of the last resampled point changes nothing.
    assert_eq!(builder.add_point(point(58.0, 0.0)), AddPointResult::NoChange);
    assert_eq!(builder.points().len(), 13);
}

#[test]
fn right_angle_splits() {
    let mut builder = CurveBuilder::new(2.0, 0.25);
    builder.add_point(point(0.0, 0.0));

    let mut split_happened = false;
    for i in 1..=40 {
        let result = builder.add_point(point(i as f64 * 2.0, 0.0));
        assert!(result.was_changed());
        assert_continuous(builder.curves());
    }
    for i in 1..=40 {
        let result = builder.add_point(point(80.0, i as f64 * 2.0));
        if result.was_added() {
            split_happened = true;
        }
        assert_continuous(builder.curves());
    }

    assert!(split_happened);
    assert!(builder.len() >= 2);
    assert_eq!(builder.curves()[0].from, point(0.0, 0.0));
    assert_eq!(builder.curves().last().unwrap().to, point(80.0, 80.0));
}

#[test]
fn resampling_a_long_jump_with_a_tiny_step() {
    let mut builder = CurveBuilder::new(0.01, 0.1);
    builder.add_point(point(0.0, 0.0));
    builder.add_point(point(10.0, 0.0));

    // Every step is buffered: the memory grows with the distance over the step.
    assert_eq!(builder.points().len(), 1001);
    assert_eq!(builder.len(), 1);
}

#[test]
fn clear_resets_everything() {
    let mut builder = CurveBuilder::with_options(&FitOptions::DEFAULT);
    assert_eq!(builder.options(), FitOptions::DEFAULT);
    builder.add_point(point(0.0, 0.0));
    builder.add_point(point(100.0, 0.0));
    assert!(!builder.is_empty());

    builder.clear();
    assert!(builder.is_empty());
    assert!(builder.points().is_empty());

    assert_eq!(builder.add_point(point(5.0, 5.0)), AddPointResult::NoChange);
    assert_eq!(
        builder.add_point(point(5.0, 5.0 + FitOptions::DEFAULT_POINT_DISTANCE)),
        AddPointResult::Added { first: 0 }
    );
}

#[test]
fn earlier_curves_are_never_modified() {
    let mut rng = StdRng::seed_from_u64(11);
    for &(step, error) in &[(1.0, 0.1), (2.0, 0.5), (4.0, 2.0), (0.5, 0.05)] {
        let mut builder = CurveBuilder::new(step, error);
        let mut p = point(0.0, 0.0);
        let mut angle: f64 = 0.0;

        for i in 0..400 {
            // Sharp turns every now and then to create cusps.
            if i % 37 == 0 {
                angle += core::f64::consts::PI * 0.9;
            }
            angle += rng.gen_range(-0.5..0.5);
            p += vector(angle.cos(), angle.sin()) * rng.gen_range(0.0..3.0 * step);

            let before = builder.curves().to_vec();
            let result = builder.add_point(p);
            let curves = builder.curves();

            // Everything before the last curve of the previous state is permanent.
            let frozen = before.len().saturating_sub(1);
            assert_eq!(&curves[..frozen], &before[..frozen]);
            assert!(curves.len() >= before.len());
            if let Some(first) = result.first_changed_index() {
                assert!(first >= frozen);
            }

            for curve in curves {
                for ctrl in &[curve.from, curve.ctrl1, curve.ctrl2, curve.to] {
                    assert!(ctrl.x.is_finite() && ctrl.y.is_finite());
                }
            }
        }

        assert_continuous(builder.curves());
    }
}
