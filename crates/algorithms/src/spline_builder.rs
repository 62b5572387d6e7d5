//! Keep an arc-length sampled spline in sync with an incremental fit.
//!
//! The `SplineBuilder` feeds raw points to a `CurveBuilder` and mirrors the curves
//! that changed into a `Spline`, so that the fitted stroke can be sampled by arc
//! length at any time.

use crate::builder::CurveBuilder;
use crate::math::*;
use crate::spline::Spline;
use crate::{SplineBuilderOptions, SplineError};

/// Fits raw points incrementally and samples the result by arc length.
///
/// ## Example
///
/// ```
/// use inkfit_algorithms::math::point;
/// use inkfit_algorithms::spline_builder::SplineBuilder;
/// use inkfit_algorithms::SplineBuilderOptions;
///
/// let options = SplineBuilderOptions::DEFAULT.with_point_distance(2.0);
/// let mut builder = SplineBuilder::with_options(&options).unwrap();
///
/// // Nothing can be sampled before the first curve exists.
/// assert!(builder.sample(0.5).is_err());
///
/// builder.add(point(0.0, 0.0)).unwrap();
/// assert!(builder.add(point(0.0, 20.0)).unwrap());
///
/// let end = builder.sample(1.0).unwrap();
/// assert!((end - point(0.0, 20.0)).length() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct SplineBuilder {
    builder: CurveBuilder,
    spline: Spline,
}

impl SplineBuilder {
    /// Creates a builder.
    ///
    /// See `CurveBuilder::new` and `Spline::new` for the meaning of the parameters.
    pub fn new(
        point_distance: f64,
        error: f64,
        samples_per_curve: usize,
    ) -> Result<Self, SplineError> {
        Ok(SplineBuilder {
            builder: CurveBuilder::new(point_distance, error),
            spline: Spline::new(samples_per_curve)?,
        })
    }

    pub fn with_options(options: &SplineBuilderOptions) -> Result<Self, SplineError> {
        Ok(SplineBuilder {
            builder: CurveBuilder::with_options(&options.fit),
            spline: Spline::new(options.samples_per_curve)?,
        })
    }

    /// Adds a raw point.
    ///
    /// Returns whether any curve changed.
    pub fn add(&mut self, p: Point) -> Result<bool, SplineError> {
        let result = self.builder.add_point(p);
        let first = match result.first_changed_index() {
            Some(first) => first,
            None => return Ok(false),
        };

        let curves = self.builder.curves();
        for (index, curve) in curves.iter().enumerate().skip(first) {
            if index < self.spline.len() {
                self.spline.update(index, *curve)?;
            } else {
                self.spline.add(*curve)?;
            }
        }

        debug_assert_eq!(self.spline.len(), curves.len());

        Ok(true)
    }

    /// Position at a fraction of the total length.
    pub fn sample(&self, t: f64) -> Result<Point, SplineError> {
        self.spline.interpolate(t)
    }

    /// Unit tangent at a fraction of the total length.
    pub fn tangent(&self, t: f64) -> Result<Vector, SplineError> {
        self.spline.tangent(t)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.spline.length()
    }

    #[inline]
    pub fn curves(&self) -> &[CubicBezier] {
        self.spline.curves()
    }

    #[inline]
    pub fn spline(&self) -> &Spline {
        &self.spline
    }

    #[inline]
    pub fn builder(&self) -> &CurveBuilder {
        &self.builder
    }

    /// Removes all points and curves, keeping the parameters.
    pub fn clear(&mut self) {
        self.builder.clear();
        self.spline.clear();
    }
}
