//! Sample connected curves by arc length.
//!
//! # Overview
//!
//! A `Spline` is a sequence of cubic bézier curves where each curve starts where the
//! previous one ends. Alongside the curves it stores a table of cumulative lengths:
//! each curve is measured at `samples_per_curve` regularly spaced parameter values,
//! so that a fraction of the total length can be mapped back to a curve and a
//! parameter on that curve with a binary search.
//!
//! ```text
//!  curve 0                         curve 1
//!  |-----|-----|-----|-----|       |-----|-----|-----|-----|
//!      l0    l1    l2    l3            l4    l5    l6    l7     (samples_per_curve = 4)
//! ```
//!
//! `l3` is the length of the first curve and `l7` the length of the spline.
//!
//! Because the curve parameter is not proportional to the distance travelled, the
//! sampling is exact at the table entries and linearly interpolated between them.
//! More samples per curve give more uniform sampling at the cost of memory and
//! update time.
//!
//! ## Example
//!
//! ```
//! use inkfit_algorithms::math::{point, CubicBezier};
//! use inkfit_algorithms::spline::Spline;
//!
//! let mut spline = Spline::new(16).unwrap();
//! spline.add(CubicBezier {
//!     from: point(0.0, 0.0),
//!     ctrl1: point(10.0, 0.0),
//!     ctrl2: point(20.0, 0.0),
//!     to: point(30.0, 0.0),
//! }).unwrap();
//!
//! assert!((spline.length() - 30.0).abs() < 1e-9);
//! let p = spline.interpolate(0.5).unwrap();
//! assert!((p.x - 15.0).abs() < 1e-9);
//! ```

use crate::geom::points_are_close;
use crate::math::*;
use crate::{SplineError, DEFAULT_EPSILON};

use alloc::vec::Vec;

/// Smallest accepted number of samples per curve.
pub const MIN_SAMPLES_PER_CURVE: usize = 8;

/// Largest accepted number of samples per curve.
pub const MAX_SAMPLES_PER_CURVE: usize = 1024;

/// A position on a spline: the curve index and the parameter on that curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplePosition {
    /// Index of the curve.
    pub index: usize,
    /// Parameter on the curve, between 0 and 1.
    pub t: f64,
}

impl SamplePosition {
    #[inline]
    pub fn new(index: usize, t: f64) -> Self {
        SamplePosition { index, t }
    }
}

/// Connected cubic bézier curves with an arc-length lookup table.
///
/// See the [module documentation](index.html).
#[derive(Clone, Debug)]
pub struct Spline {
    samples_per_curve: usize,
    curves: Vec<CubicBezier>,
    /// `samples_per_curve` cumulative lengths per curve.
    arc_lengths: Vec<f64>,
}

impl Spline {
    /// Creates an empty spline.
    ///
    /// `samples_per_curve` must be between `MIN_SAMPLES_PER_CURVE` and
    /// `MAX_SAMPLES_PER_CURVE`.
    pub fn new(samples_per_curve: usize) -> Result<Self, SplineError> {
        if !(MIN_SAMPLES_PER_CURVE..=MAX_SAMPLES_PER_CURVE).contains(&samples_per_curve) {
            return Err(SplineError::InvalidSamplesPerCurve(samples_per_curve));
        }

        Ok(Spline {
            samples_per_curve,
            curves: Vec::new(),
            arc_lengths: Vec::new(),
        })
    }

    /// Appends a curve.
    ///
    /// The curve must start where the current last curve ends.
    pub fn add(&mut self, curve: CubicBezier) -> Result<(), SplineError> {
        let index = self.curves.len();
        if let Some(prev) = self.curves.last() {
            if !points_are_close(prev.to, curve.from, DEFAULT_EPSILON) {
                return Err(SplineError::Discontinuity { index });
            }
        }

        self.curves.push(curve);
        self.arc_lengths
            .resize(self.arc_lengths.len() + self.samples_per_curve, 0.0);
        self.update_arc_lengths(index);

        Ok(())
    }

    /// Replaces the curve at `index`.
    ///
    /// The curve must still connect with the curves before and after it. The lengths of
    /// this curve and all the following ones are measured again.
    pub fn update(&mut self, index: usize, curve: CubicBezier) -> Result<(), SplineError> {
        let len = self.curves.len();
        if index >= len {
            return Err(SplineError::IndexOutOfRange { index, len });
        }

        let connects_before = index == 0
            || points_are_close(self.curves[index - 1].to, curve.from, DEFAULT_EPSILON);
        let connects_after = index + 1 == len
            || points_are_close(self.curves[index + 1].from, curve.to, DEFAULT_EPSILON);
        if !connects_before || !connects_after {
            return Err(SplineError::Discontinuity { index });
        }

        self.curves[index] = curve;
        for i in index..len {
            self.update_arc_lengths(i);
        }

        log::debug!("measured curves {}..{} again", index, len);

        Ok(())
    }

    fn update_arc_lengths(&mut self, index: usize) {
        let n = self.samples_per_curve;
        let curve = self.curves[index];

        let (before, rest) = self.arc_lengths.split_at_mut(index * n);
        let mut length = before.last().cloned().unwrap_or(0.0);
        let mut prev = curve.from;
        for (i, entry) in rest[..n].iter_mut().enumerate() {
            let p = curve.sample((i + 1) as f64 / n as f64);
            length += (p - prev).length();
            *entry = length;
            prev = p;
        }
    }

    /// Maps a fraction of the total length to a curve and a parameter on that curve.
    ///
    /// Values below zero map to the start of the spline and values above one to its end.
    /// Fails if the spline is empty.
    pub fn sample_position(&self, t: f64) -> Result<SamplePosition, SplineError> {
        if self.curves.is_empty() {
            return Err(SplineError::Empty);
        }

        let last = self.curves.len() - 1;
        if !(t > 0.0) {
            return Ok(SamplePosition::new(0, 0.0));
        }
        if t >= 1.0 {
            return Ok(SamplePosition::new(last, 1.0));
        }

        let target = t * self.length();

        // Number of entries whose length is less than or equal to the target: the
        // bracket containing the target starts at the entry before that (or at the
        // start of the spline) and ends at this index.
        let next = self.arc_lengths.partition_point(|&len| len <= target);
        if next == self.arc_lengths.len() {
            return Ok(SamplePosition::new(last, 1.0));
        }

        let min = if next == 0 {
            0.0
        } else {
            self.arc_lengths[next - 1]
        };
        let max = self.arc_lengths[next];
        let ft = if max > min {
            (target - min) / (max - min)
        } else {
            0.0
        };

        // Entry `next` is the end of the sample that spans parameters
        // `[next % n, next % n + 1] / n` of curve `next / n`.
        let n = self.samples_per_curve;

        Ok(SamplePosition::new(
            next / n,
            ((next % n) as f64 + ft) / n as f64,
        ))
    }

    /// Position at a fraction of the total length.
    pub fn interpolate(&self, t: f64) -> Result<Point, SplineError> {
        let pos = self.sample_position(t)?;

        Ok(self.curves[pos.index].sample(pos.t))
    }

    /// Unit tangent at a fraction of the total length.
    pub fn tangent(&self, t: f64) -> Result<Vector, SplineError> {
        let pos = self.sample_position(t)?;

        Ok(self.curves[pos.index].tangent(pos.t))
    }

    /// The approximate length of the spline.
    #[inline]
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().cloned().unwrap_or(0.0)
    }

    /// Removes all curves.
    pub fn clear(&mut self) {
        self.curves.clear();
        self.arc_lengths.clear();
    }

    #[inline]
    pub fn curves(&self) -> &[CubicBezier] {
        &self.curves
    }

    #[inline]
    pub fn samples_per_curve(&self) -> usize {
        self.samples_per_curve
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

#[cfg(test)]
fn line(from: Point, to: Point) -> CubicBezier {
    CubicBezier {
        from,
        ctrl1: from.lerp(to, 1.0 / 3.0),
        ctrl2: from.lerp(to, 2.0 / 3.0),
        to,
    }
}

#[test]
fn samples_per_curve_range() {
    assert_eq!(
        Spline::new(7).unwrap_err(),
        SplineError::InvalidSamplesPerCurve(7)
    );
    assert_eq!(
        Spline::new(1025).unwrap_err(),
        SplineError::InvalidSamplesPerCurve(1025)
    );
    assert!(Spline::new(MIN_SAMPLES_PER_CURVE).is_ok());
    assert!(Spline::new(MAX_SAMPLES_PER_CURVE).is_ok());
    assert!(SplineError::InvalidSamplesPerCurve(7).is_construction_error());
}

#[test]
fn empty_spline() {
    let spline = Spline::new(8).unwrap();
    assert_eq!(spline.length(), 0.0);
    assert!(spline.is_empty());
    assert_eq!(spline.sample_position(0.5), Err(SplineError::Empty));
    assert_eq!(spline.interpolate(0.5), Err(SplineError::Empty));
    assert!(SplineError::Empty.is_precondition_error());
}

#[test]
fn add_checks_continuity() {
    let mut spline = Spline::new(8).unwrap();
    spline.add(line(point(0.0, 0.0), point(10.0, 0.0))).unwrap();

    let err = spline
        .add(line(point(11.0, 0.0), point(20.0, 0.0)))
        .unwrap_err();
    assert_eq!(err, SplineError::Discontinuity { index: 1 });
    assert!(err.is_continuity_error());
    assert_eq!(spline.len(), 1);
    approx::assert_abs_diff_eq!(spline.length(), 10.0, epsilon = 1e-9);

    spline.add(line(point(10.0, 0.0), point(10.0, 5.0))).unwrap();
    approx::assert_abs_diff_eq!(spline.length(), 15.0, epsilon = 1e-9);
}

#[test]
fn update_checks_neighbors() {
    let mut spline = Spline::new(8).unwrap();
    spline.add(line(point(0.0, 0.0), point(10.0, 0.0))).unwrap();
    spline.add(line(point(10.0, 0.0), point(20.0, 0.0))).unwrap();
    spline.add(line(point(20.0, 0.0), point(30.0, 0.0))).unwrap();

    assert_eq!(
        spline.update(3, line(point(20.0, 0.0), point(30.0, 0.0))),
        Err(SplineError::IndexOutOfRange { index: 3, len: 3 })
    );
    assert_eq!(
        spline.update(1, line(point(10.0, 1.0), point(20.0, 0.0))),
        Err(SplineError::Discontinuity { index: 1 })
    );
    assert_eq!(
        spline.update(1, line(point(10.0, 0.0), point(21.0, 0.0))),
        Err(SplineError::Discontinuity { index: 1 })
    );

    // Bend the middle curve: the total length grows and the last curve is shifted.
    let bent = CubicBezier {
        from: point(10.0, 0.0),
        ctrl1: point(10.0, 10.0),
        ctrl2: point(20.0, 10.0),
        to: point(20.0, 0.0),
    };
    spline.update(1, bent).unwrap();
    assert_eq!(spline.curves()[1], bent);
    assert!(spline.length() > 30.0);

    let n = spline.samples_per_curve();
    let first_two = spline.arc_lengths[2 * n - 1];
    approx::assert_abs_diff_eq!(spline.length() - first_two, 10.0, epsilon = 1e-9);
}

#[test]
fn arc_lengths_are_monotonic() {
    let mut spline = Spline::new(32).unwrap();
    let mut prev_length = 0.0;
    let curves = [
        CubicBezier {
            from: point(0.0, 0.0),
            ctrl1: point(0.0, 50.0),
            ctrl2: point(50.0, 50.0),
            to: point(50.0, 0.0),
        },
        CubicBezier {
            from: point(50.0, 0.0),
            ctrl1: point(50.0, -50.0),
            ctrl2: point(100.0, 0.0),
            to: point(100.0, 0.0),
        },
    ];
    for curve in &curves {
        spline.add(*curve).unwrap();
        assert!(spline.length() >= prev_length);
        prev_length = spline.length();
    }

    for pair in spline.arc_lengths.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert_eq!(spline.arc_lengths.len(), 64);
    assert_eq!(spline.length(), *spline.arc_lengths.last().unwrap());

    // The table measures chords, it slightly underestimates the curves.
    let expected: f64 = curves.iter().map(|c| c.approximate_length(1e-3)).sum();
    assert!(spline.length() <= expected + 1e-3);
    assert!(spline.length() > expected * 0.99);
}

#[test]
fn sample_position_endpoints() {
    let mut spline = Spline::new(8).unwrap();
    spline.add(line(point(0.0, 0.0), point(10.0, 0.0))).unwrap();
    spline.add(line(point(10.0, 0.0), point(10.0, 10.0))).unwrap();

    assert_eq!(spline.sample_position(0.0), Ok(SamplePosition::new(0, 0.0)));
    assert_eq!(spline.sample_position(-1.0), Ok(SamplePosition::new(0, 0.0)));
    assert_eq!(spline.sample_position(1.0), Ok(SamplePosition::new(1, 1.0)));
    assert_eq!(spline.sample_position(2.0), Ok(SamplePosition::new(1, 1.0)));

    assert_eq!(spline.interpolate(0.0), Ok(point(0.0, 0.0)));
    assert_eq!(spline.interpolate(1.0), Ok(point(10.0, 10.0)));
}

#[test]
fn sample_position_within_first_bracket() {
    let mut spline = Spline::new(8).unwrap();
    spline.add(line(point(0.0, 0.0), point(80.0, 0.0))).unwrap();

    // The first table entry is at 10 units: anything before interpolates from 0.
    let pos = spline.sample_position(0.0625).unwrap();
    assert_eq!(pos.index, 0);
    approx::assert_abs_diff_eq!(pos.t, 0.0625, epsilon = 1e-9);
}

#[test]
fn sample_position_ties() {
    let mut spline = Spline::new(8).unwrap();
    spline.add(line(point(0.0, 0.0), point(8.0, 0.0))).unwrap();
    spline.add(line(point(8.0, 0.0), point(16.0, 0.0))).unwrap();
    // Measured lengths can be off by an ulp, use exact ones.
    for (i, len) in spline.arc_lengths.iter_mut().enumerate() {
        *len = (i + 1) as f64;
    }

    // Exactly on the entry between the two curves: the largest entry that is less or
    // equal to the target is the end of the first curve, which is the start of the second.
    let pos = spline.sample_position(0.5).unwrap();
    assert_eq!(pos.index, 1);
    approx::assert_abs_diff_eq!(pos.t, 0.0, epsilon = 1e-9);

    // Exactly on an entry within a curve.
    let pos = spline.sample_position(3.0 / 16.0).unwrap();
    assert_eq!(pos.index, 0);
    approx::assert_abs_diff_eq!(pos.t, 3.0 / 8.0, epsilon = 1e-9);
}

#[test]
fn interpolate_straight_lines() {
    let mut spline = Spline::new(16).unwrap();
    spline.add(line(point(0.0, 0.0), point(10.0, 0.0))).unwrap();
    spline.add(line(point(10.0, 0.0), point(10.0, 30.0))).unwrap();

    let p = spline.interpolate(0.125).unwrap();
    assert!((p - point(5.0, 0.0)).length() < 1e-9);
    let p = spline.interpolate(0.625).unwrap();
    assert!((p - point(10.0, 15.0)).length() < 1e-9);

    assert_eq!(spline.tangent(0.1), Ok(vector(1.0, 0.0)));
    assert_eq!(spline.tangent(0.9), Ok(vector(0.0, 1.0)));
}

#[test]
fn sample_position_is_monotonic() {
    let mut spline = Spline::new(8).unwrap();
    spline
        .add(CubicBezier {
            from: point(0.0, 0.0),
            ctrl1: point(0.0, 40.0),
            ctrl2: point(40.0, 40.0),
            to: point(40.0, 0.0),
        })
        .unwrap();
    spline.add(line(point(40.0, 0.0), point(100.0, 0.0))).unwrap();

    let mut prev = SamplePosition::new(0, 0.0);
    for i in 0..=1000 {
        let pos = spline.sample_position(i as f64 / 1000.0).unwrap();
        assert!(
            pos.index > prev.index || (pos.index == prev.index && pos.t >= prev.t),
            "{:?} -> {:?}",
            prev,
            pos
        );
        assert!(pos.t >= 0.0 && pos.t <= 1.0);
        prev = pos;
    }
}

#[test]
fn clear_spline() {
    let mut spline = Spline::new(8).unwrap();
    spline.add(line(point(0.0, 0.0), point(10.0, 0.0))).unwrap();
    spline.clear();
    assert!(spline.is_empty());
    assert_eq!(spline.length(), 0.0);

    // Any curve can start a cleared spline.
    spline.add(line(point(5.0, 5.0), point(6.0, 5.0))).unwrap();
    assert_eq!(spline.len(), 1);
}
