#![deny(bare_trait_objects)]
#![allow(clippy::float_cmp)]
#![no_std]

//! Incremental curve fitting and arc-length sampling.
//!
//! This crate is reexported in `inkfit`.
//!
//! # Overview
//!
//! The crate turns a stream of raw points (typically pointer input) into a small
//! sequence of connected cubic bézier curves and keeps an arc-length table over
//! them, so that positions and tangents can be queried at any fraction of the
//! total length.
//!
//! - [`preprocess`] cleans up or resamples polylines before an offline fit.
//! - [`fit`] fits a single curve to a range of points, and whole polylines at once.
//! - [`builder`] fits points incrementally as they arrive.
//! - [`spline`] stores connected curves and samples them by arc length.
//! - [`spline_builder`] keeps a spline in sync with an incremental fit.
//!
//! ## Example
//!
//! ```
//! use inkfit_algorithms::math::point;
//! use inkfit_algorithms::spline_builder::SplineBuilder;
//!
//! let mut builder = SplineBuilder::new(5.0, 4.0, 32).unwrap();
//! builder.add(point(0.0, 0.0)).unwrap();
//! builder.add(point(50.0, 0.0)).unwrap();
//! builder.add(point(100.0, 0.0)).unwrap();
//!
//! let mid = builder.sample(0.5).unwrap();
//! assert!((mid - point(50.0, 0.0)).length() < 1.0);
//! ```
//!
//! # Threading
//!
//! Nothing in this crate is internally synchronized. Every builder owns its buffers
//! exclusively and they grow with each added point until `clear` is called.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub extern crate inkfit_geom as geom;

pub mod builder;
mod error;
pub mod fit;
pub mod preprocess;
pub mod spline;
pub mod spline_builder;

#[cfg(test)]
mod spline_builder_tests;

pub use crate::error::*;

pub mod math {
    //! f64 version of the inkfit_geom types used everywhere in this crate.

    use crate::geom::euclid;

    /// Alias for ```euclid::default::Point2D<f64>```.
    pub type Point = euclid::default::Point2D<f64>;

    /// Alias for ```euclid::default::Vector2D<f64>```.
    pub type Vector = euclid::default::Vector2D<f64>;

    /// Alias for ```inkfit_geom::CubicBezierSegment<f64>```.
    pub type CubicBezier = crate::geom::CubicBezierSegment<f64>;

    /// Shorthand for `Vector::new(x, y)`.
    #[inline]
    pub fn vector(x: f64, y: f64) -> Vector {
        Vector::new(x, y)
    }

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }
}

/// Tolerance below which two points are considered to be at the same position.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Parameters for the incremental curve fit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitOptions {
    /// Distance between the points the input is resampled to.
    ///
    /// Raw points closer than this to the previous raw point are ignored.
    /// Smaller values follow the input more closely at the cost of more fitting work.
    ///
    /// Default value: `FitOptions::DEFAULT_POINT_DISTANCE`.
    pub point_distance: f64,

    /// Maximum allowed distance between a resampled point and the fitted curves.
    ///
    /// Default value: `FitOptions::DEFAULT_TOLERANCE`.
    pub tolerance: f64,
}

impl FitOptions {
    /// Default resampling distance.
    pub const DEFAULT_POINT_DISTANCE: f64 = 8.0;
    /// Default fitting tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 2.0;

    pub const DEFAULT: Self = FitOptions {
        point_distance: Self::DEFAULT_POINT_DISTANCE,
        tolerance: Self::DEFAULT_TOLERANCE,
    };

    #[inline]
    pub fn tolerance(tolerance: f64) -> Self {
        Self::DEFAULT.with_tolerance(tolerance)
    }

    #[inline]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[inline]
    pub const fn with_point_distance(mut self, distance: f64) -> Self {
        self.point_distance = distance;
        self
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parameters for the `SplineBuilder`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SplineBuilderOptions {
    /// Parameters of the underlying curve fit.
    pub fit: FitOptions,

    /// Number of arc-length samples stored per curve.
    ///
    /// Must be in `spline::MIN_SAMPLES_PER_CURVE..=spline::MAX_SAMPLES_PER_CURVE`.
    ///
    /// Default value: `SplineBuilderOptions::DEFAULT_SAMPLES_PER_CURVE`.
    pub samples_per_curve: usize,
}

impl SplineBuilderOptions {
    /// Default arc-length table resolution.
    pub const DEFAULT_SAMPLES_PER_CURVE: usize = 16;

    pub const DEFAULT: Self = SplineBuilderOptions {
        fit: FitOptions::DEFAULT,
        samples_per_curve: Self::DEFAULT_SAMPLES_PER_CURVE,
    };

    #[inline]
    pub const fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    #[inline]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.fit.tolerance = tolerance;
        self
    }

    #[inline]
    pub const fn with_point_distance(mut self, distance: f64) -> Self {
        self.fit.point_distance = distance;
        self
    }

    #[inline]
    pub const fn with_samples_per_curve(mut self, samples: usize) -> Self {
        self.samples_per_curve = samples;
        self
    }
}

impl Default for SplineBuilderOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[test]
fn options_builders() {
    let options = SplineBuilderOptions::DEFAULT
        .with_point_distance(3.0)
        .with_tolerance(0.5)
        .with_samples_per_curve(64);

    assert_eq!(options.fit, FitOptions::DEFAULT.with_point_distance(3.0).with_tolerance(0.5));
    assert_eq!(options.samples_per_curve, 64);
    assert_eq!(FitOptions::tolerance(1.0).point_distance, FitOptions::DEFAULT_POINT_DISTANCE);
    assert_eq!(SplineBuilderOptions::default(), SplineBuilderOptions::DEFAULT);
}
