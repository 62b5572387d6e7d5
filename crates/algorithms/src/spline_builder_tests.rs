use crate::builder::{AddPointResult, CurveBuilder};
use crate::math::*;
use crate::preprocess::remove_duplicates;
use crate::spline_builder::SplineBuilder;
use crate::{SplineBuilderOptions, SplineError, DEFAULT_EPSILON};

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use alloc::vec::Vec;
use core::f64::consts::PI;

fn check_continuity(curves: &[CubicBezier]) {
    for (i, pair) in curves.windows(2).enumerate() {
        assert!(
            (pair[0].to - pair[1].from).length() < DEFAULT_EPSILON,
            "curves {} and {} are not connected: {:?} {:?}",
            i,
            i + 1,
            pair[0].to,
            pair[1].from,
        );
    }
}

fn check_in_sync(builder: &SplineBuilder) {
    assert_eq!(builder.curves(), builder.builder().curves());
    assert_eq!(builder.spline().len(), builder.builder().len());
    check_continuity(builder.curves());
}

#[test]
fn straight_line() {
    let mut builder = SplineBuilder::new(5.0, 4.0, 32).unwrap();
    assert_eq!(builder.add(point(0.0, 0.0)), Ok(false));
    assert_eq!(builder.add(point(50.0, 0.0)), Ok(true));
    assert_eq!(builder.add(point(100.0, 0.0)), Ok(true));

    check_in_sync(&builder);
    assert_eq!(builder.curves().len(), 1);
    assert_eq!(builder.builder().points().len(), 21);

    let mid = builder.sample(0.5).unwrap();
    assert!((mid - point(50.0, 0.0)).length() < 1.0, "{:?}", mid);
    assert_abs_diff_eq!(builder.length(), 100.0, epsilon = 1e-6);

    assert_eq!(builder.sample(0.0), Ok(point(0.0, 0.0)));
    assert_eq!(builder.sample(1.0), Ok(point(100.0, 0.0)));

    let tangent = builder.tangent(0.5).unwrap();
    assert_abs_diff_eq!(tangent.x, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(tangent.y, 0.0, epsilon = 1e-6);
}

#[test]
fn nothing_to_sample() {
    let mut builder = SplineBuilder::with_options(&SplineBuilderOptions::DEFAULT).unwrap();
    assert_eq!(builder.sample(0.5), Err(SplineError::Empty));
    assert_eq!(builder.tangent(0.5), Err(SplineError::Empty));
    assert_eq!(builder.length(), 0.0);

    // A single point, then points too close to it.
    assert_eq!(builder.add(point(10.0, 10.0)), Ok(false));
    assert_eq!(builder.add(point(10.0, 10.0)), Ok(false));
    assert_eq!(builder.add(point(11.0, 12.0)), Ok(false));
    assert_eq!(builder.sample(0.5), Err(SplineError::Empty));
    assert!(builder.curves().is_empty());
}

#[test]
fn invalid_samples_per_curve() {
    assert_eq!(
        SplineBuilder::new(1.0, 1.0, 4).unwrap_err(),
        SplineError::InvalidSamplesPerCurve(4)
    );
    let options = SplineBuilderOptions::DEFAULT.with_samples_per_curve(2048);
    assert!(SplineBuilder::with_options(&options)
        .unwrap_err()
        .is_construction_error());
}

#[test]
fn right_angle() {
    let mut builder = SplineBuilder::new(2.0, 0.25, 16).unwrap();
    for i in 0..=40 {
        builder.add(point(i as f64 * 2.0, 0.0)).unwrap();
    }
    assert_eq!(builder.curves().len(), 1);
    for i in 1..=40 {
        builder.add(point(80.0, i as f64 * 2.0)).unwrap();
        check_in_sync(&builder);
    }

    assert!(builder.curves().len() >= 2);
    assert_eq!(builder.curves()[0].from, point(0.0, 0.0));
    assert_eq!(builder.curves().last().unwrap().to, point(80.0, 80.0));

    // The path is 160 units long, a fit with a small tolerance stays close to it.
    assert!(builder.length() > 150.0 && builder.length() < 165.0);
    let start = builder.tangent(0.0).unwrap();
    assert_abs_diff_eq!(start.x, 1.0, epsilon = 1e-3);
    let end = builder.tangent(1.0).unwrap();
    assert_abs_diff_eq!(end.y, 1.0, epsilon = 1e-3);
}

#[test]
fn half_circle() {
    let radius = 100.0;
    let mut builder = SplineBuilder::new(2.0, 0.5, 32).unwrap();
    let mut prev_length = 0.0;
    for i in 0..=180 {
        let angle = i as f64 * PI / 180.0;
        builder
            .add(point(radius * angle.cos(), radius * angle.sin()))
            .unwrap();

        // Extending the stroke forward never makes it noticeably shorter.
        assert!(builder.length() >= prev_length - 1.0);
        prev_length = builder.length();
    }

    check_in_sync(&builder);

    let expected = PI * radius;
    assert!(builder.length() > 0.9 * expected && builder.length() < 1.05 * expected);

    for i in 0..=100 {
        let p = builder.sample(i as f64 / 100.0).unwrap();
        let distance = p.to_vector().length();
        assert!((distance - radius).abs() < 2.0, "{:?} at {}", p, distance);
    }
}

#[test]
fn random_walk() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut builder = SplineBuilder::new(3.0, 1.0, 16).unwrap();

    let mut p = point(0.0, 0.0);
    let mut angle: f64 = 0.0;
    for _ in 0..500 {
        angle += rng.gen_range(-1.0..1.0);
        let step = rng.gen_range(0.0..12.0);
        p += vector(angle.cos(), angle.sin()) * step;
        builder.add(p).unwrap();
    }

    check_in_sync(&builder);
    assert!(!builder.curves().is_empty());
    assert!(builder.length() > 0.0);

    let mut prev = builder.spline().sample_position(0.0).unwrap();
    for i in 0..=200 {
        let t = i as f64 / 200.0;
        let pos = builder.spline().sample_position(t).unwrap();
        assert!(pos.index > prev.index || (pos.index == prev.index && pos.t >= prev.t));
        assert!(builder.sample(t).unwrap().x.is_finite());
        prev = pos;
    }
}

#[test]
fn results_match_curve_builder() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut curve_builder = CurveBuilder::new(4.0, 0.5);
    let mut spline_builder = SplineBuilder::new(4.0, 0.5, 8).unwrap();

    let mut merged = AddPointResult::NoChange;
    for i in 0..200 {
        let p = point(i as f64 * 1.5, rng.gen_range(-3.0..3.0));
        let result = curve_builder.add_point(p);
        merged = merged.merge(result);
        assert_eq!(spline_builder.add(p), Ok(result.was_changed()));
    }

    assert!(merged.was_changed());
    assert_eq!(curve_builder.curves(), spline_builder.curves());
}

#[test]
fn clear() {
    let mut builder = SplineBuilder::new(2.0, 1.0, 8).unwrap();
    builder.add(point(0.0, 0.0)).unwrap();
    builder.add(point(20.0, 0.0)).unwrap();
    assert!(builder.length() > 0.0);

    builder.clear();
    assert!(builder.curves().is_empty());
    assert!(builder.builder().points().is_empty());
    assert_eq!(builder.sample(0.5), Err(SplineError::Empty));

    // Starts over from a different place.
    builder.add(point(-5.0, -5.0)).unwrap();
    builder.add(point(-5.0, 15.0)).unwrap();
    check_in_sync(&builder);
    assert_eq!(builder.sample(0.0), Ok(point(-5.0, -5.0)));
    assert_eq!(builder.builder().tolerance(), 1.0);
}

#[test]
fn remove_duplicates_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(3);
    let points: Vec<Point> = (0..300)
        .map(|_| point(rng.gen_range(0..4) as f64, rng.gen_range(0..4) as f64))
        .collect();

    let once = remove_duplicates(&points, DEFAULT_EPSILON).into_owned();
    let twice = remove_duplicates(&once, DEFAULT_EPSILON);
    assert_eq!(&once[..], &twice[..]);
    for pair in once.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}
