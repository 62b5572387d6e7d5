#![deny(bare_trait_objects)]

//! Fit pointer input with cubic bézier curves and sample them by arc length.
//!
//! # Crates
//!
//! This meta-crate (`inkfit`) reexports the following sub-crates for convenience:
//!
//! * **inkfit_geom** - Points, vectors, line segments and cubic bézier curves.
//! * **inkfit_algorithms** - Point preprocessing, curve fitting, the incremental
//!   curve builder and the arc-length sampled spline.
//!
//! Each `inkfit_<name>` crate is reexported as a `<name>` module in `inkfit`. For example:
//!
//! ```ignore
//! extern crate inkfit_algorithms;
//! use inkfit_algorithms::spline_builder::SplineBuilder;
//! ```
//!
//! Is equivalent to:
//!
//! ```ignore
//! extern crate inkfit;
//! use inkfit::algorithms::spline_builder::SplineBuilder;
//! ```
//!
//! # Feature flags
//!
//! The `std` feature (enabled by default) implements `std::error::Error` for the
//! error types. Without it, both crates only depend on `core` and `alloc`.
//!
//! # Examples
//!
//! ## Following a stroke
//!
//! ```
//! use inkfit::math::point;
//! use inkfit::SplineBuilder;
//!
//! let mut stroke = SplineBuilder::new(2.0, 0.5, 32).unwrap();
//! for i in 0..100 {
//!     let x = i as f64;
//!     stroke.add(point(x, (x * 0.05).sin() * 30.0)).unwrap();
//! }
//!
//! // The curves are connected.
//! for pair in stroke.curves().windows(2) {
//!     assert_eq!(pair[0].to, pair[1].from);
//! }
//!
//! // Walk along the stroke at regular intervals.
//! for i in 0..=10 {
//!     let position = stroke.sample(i as f64 / 10.0).unwrap();
//!     let tangent = stroke.tangent(i as f64 / 10.0).unwrap();
//!     assert!(position.x >= -1.0 && position.x <= 100.0);
//!     assert!((tangent.length() - 1.0).abs() < 1e-6);
//! }
//! ```
//!
//! ## Fitting a polyline at once
//!
//! ```
//! use inkfit::math::point;
//! use inkfit::algorithms::fit::fit_curves;
//! use inkfit::algorithms::preprocess::rdp_reduce;
//!
//! let points: Vec<_> = (0..=20).map(|i| point(i as f64, 0.0)).collect();
//! assert_eq!(rdp_reduce(&points, 0.1).len(), 2);
//!
//! let curves = fit_curves(&points, 0.1).unwrap();
//! assert_eq!(curves.len(), 1);
//! assert_eq!(curves[0].to, point(20.0, 0.0));
//! ```

pub extern crate inkfit_algorithms;
pub extern crate inkfit_geom;

pub use inkfit_algorithms as algorithms;
pub use inkfit_geom as geom;

pub use algorithms::math;

pub use algorithms::builder::{AddPointResult, CurveBuilder};
pub use algorithms::spline::{SamplePosition, Spline};
pub use algorithms::spline_builder::SplineBuilder;
pub use algorithms::{FitOptions, SplineBuilderOptions};
