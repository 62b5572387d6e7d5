//! Clean up and resample polylines before fitting them.
//!
//! These functions are meant for offline fits (see `fit::fit_curves`). The
//! incremental `CurveBuilder` resamples its input on its own.

use crate::geom::{points_are_close, LineSegment};
use crate::math::*;
use crate::{PreprocessError, DEFAULT_EPSILON};

use alloc::borrow::Cow;
use alloc::vec::Vec;

/// Collapses runs of consecutive points that are within `epsilon` of each other,
/// keeping the first point of each run.
///
/// Returns the input unchanged, without allocating, if there is nothing to remove.
/// Repeated points that are not consecutive are preserved.
pub fn remove_duplicates(points: &[Point], epsilon: f64) -> Cow<'_, [Point]> {
    let has_duplicates = points
        .windows(2)
        .any(|pair| points_are_close(pair[0], pair[1], epsilon));

    if !has_duplicates {
        return Cow::Borrowed(points);
    }

    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        match result.last() {
            Some(&prev) if points_are_close(prev, p, epsilon) => {}
            _ => result.push(p),
        }
    }

    Cow::Owned(result)
}

/// Resamples a polyline into points spaced exactly `distance` apart along its length.
///
/// The first point is always part of the output. The last source point is appended
/// unless the resampling already landed on it (within `epsilon`).
pub fn linearize(points: &[Point], distance: f64, epsilon: f64) -> Result<Vec<Point>, PreprocessError> {
    if !(distance > epsilon) {
        return Err(PreprocessError::DistanceTooSmall { distance, epsilon });
    }

    let mut result = Vec::new();
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(result),
    };

    result.push(first);
    let mut prev = first;
    // Distance travelled along the polyline since the last emitted point.
    let mut travelled = 0.0;

    for pair in points.windows(2) {
        let segment = LineSegment {
            from: pair[0],
            to: pair[1],
        };
        let segment_length = segment.length();
        if segment_length <= 0.0 {
            continue;
        }

        let direction = segment.to_vector() / segment_length;
        let mut offset = distance - travelled;
        while offset <= segment_length + epsilon {
            prev = segment.from + direction * offset;
            result.push(prev);
            offset += distance;
        }

        travelled = segment_length - (offset - distance);
    }

    if !points_are_close(prev, last, epsilon) {
        result.push(last);
    }

    Ok(result)
}

/// Simplifies a polyline using the Ramer-Douglas-Peucker algorithm.
///
/// Points are removed as long as none of them is further than `error` from the
/// chord that replaces them. Consecutive duplicates are removed first.
pub fn rdp_reduce(points: &[Point], error: f64) -> Vec<Point> {
    let points = remove_duplicates(points, DEFAULT_EPSILON);
    if points.len() < 3 {
        return points.into_owned();
    }

    let last = points.len() - 1;
    let mut keep = Vec::with_capacity(usize::max(points.len() / 2, 16));
    keep.push(0);
    keep.push(last);
    rdp_recursive(&points, error, 0, last, &mut keep);
    keep.sort_unstable();

    keep.into_iter().map(|idx| points[idx]).collect()
}

fn rdp_recursive(points: &[Point], error: f64, first: usize, last: usize, keep: &mut Vec<usize>) {
    if last <= first + 1 {
        return;
    }

    let chord = LineSegment {
        from: points[first],
        to: points[last],
    };

    let mut max_distance = error;
    let mut split = None;
    for (idx, p) in points.iter().enumerate().take(last).skip(first + 1) {
        // NaN distances (degenerate chord) never compare greater.
        let d = chord.distance_to_line(*p);
        if d > max_distance {
            max_distance = d;
            split = Some(idx);
        }
    }

    if let Some(split) = split {
        keep.push(split);
        rdp_recursive(points, error, first, split, keep);
        rdp_recursive(points, error, split, last, keep);
    }
}

#[cfg(test)]
fn line(n: usize) -> Vec<Point> {
    (0..=n).map(|i| point(i as f64, 0.0)).collect()
}

#[test]
fn remove_duplicates_borrows_clean_input() {
    let points = line(5);
    let result = remove_duplicates(&points, DEFAULT_EPSILON);
    assert!(matches!(result, Cow::Borrowed(_)));
    assert_eq!(&result[..], &points[..]);

    let empty: Vec<Point> = Vec::new();
    assert!(matches!(remove_duplicates(&empty, DEFAULT_EPSILON), Cow::Borrowed(_)));
}

#[test]
fn remove_duplicates_collapses_runs() {
    let points = [
        point(0.0, 0.0),
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(1.0, 0.05),
        point(1.0, 0.08),
        point(2.0, 0.0),
        point(0.0, 0.0),
    ];

    let result = remove_duplicates(&points, 0.1);
    assert_eq!(
        &result[..],
        &[point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0), point(0.0, 0.0)][..]
    );

    let again = remove_duplicates(&result, 0.1);
    assert!(matches!(again, Cow::Borrowed(_)));
    assert_eq!(&again[..], &result[..]);
}

#[test]
fn linearize_spacing() {
    let result = linearize(&[point(0.0, 0.0), point(100.0, 0.0)], 10.0, DEFAULT_EPSILON).unwrap();

    assert_eq!(result.len(), 11);
    for (i, p) in result.iter().enumerate() {
        approx::assert_abs_diff_eq!(p.x, i as f64 * 10.0, epsilon = 1e-9);
        assert_eq!(p.y, 0.0);
    }
}

#[test]
fn linearize_carries_over_corners() {
    // Total length 15: points at 0, 4, 8, 12 along the path, then the end point.
    let points = [point(0.0, 0.0), point(5.0, 0.0), point(5.0, 10.0)];
    let result = linearize(&points, 4.0, DEFAULT_EPSILON).unwrap();

    let expected = [
        point(0.0, 0.0),
        point(4.0, 0.0),
        point(5.0, 3.0),
        point(5.0, 7.0),
        point(5.0, 10.0),
    ];
    assert_eq!(result.len(), expected.len());
    for (a, b) in result.iter().zip(expected.iter()) {
        assert!((*a - *b).length() < 1e-9, "{:?} != {:?}", a, b);
    }
}

#[test]
fn linearize_rejects_small_distance() {
    let points = line(3);
    assert_eq!(
        linearize(&points, 0.0, DEFAULT_EPSILON),
        Err(PreprocessError::DistanceTooSmall {
            distance: 0.0,
            epsilon: DEFAULT_EPSILON
        })
    );
    assert!(linearize(&points, DEFAULT_EPSILON, DEFAULT_EPSILON).is_err());
    assert!(linearize(&points, f64::NAN, DEFAULT_EPSILON).is_err());
    assert_eq!(linearize(&[], 1.0, DEFAULT_EPSILON), Ok(Vec::new()));
}

#[test]
fn rdp_collinear() {
    let result = rdp_reduce(&line(10), 0.5);
    assert_eq!(result, [point(0.0, 0.0), point(10.0, 0.0)]);
}

#[test]
fn rdp_keeps_corners() {
    let points = [
        point(0.0, 0.0),
        point(5.0, 0.1),
        point(10.0, 0.0),
        point(10.0, 5.0),
        point(10.1, 10.0),
        point(10.0, 20.0),
    ];
    let result = rdp_reduce(&points, 0.5);
    assert_eq!(result, [point(0.0, 0.0), point(10.0, 0.0), point(10.0, 20.0)]);
}

#[test]
fn rdp_short_inputs() {
    assert_eq!(rdp_reduce(&[], 1.0), Vec::<Point>::new());
    let two = [point(0.0, 0.0), point(0.0, 0.0), point(3.0, 0.0)];
    assert_eq!(rdp_reduce(&two, 1.0), [point(0.0, 0.0), point(3.0, 0.0)]);
}

#[test]
fn rdp_closed_loop_ignores_nan() {
    // The chord of a closed loop is degenerate: every distance is NaN and nothing is kept.
    let points = [
        point(0.0, 0.0),
        point(10.0, 0.0),
        point(10.0, 10.0),
        point(0.0, 0.0),
    ];
    assert_eq!(rdp_reduce(&points, 0.5), [point(0.0, 0.0), point(0.0, 0.0)]);
}
