/// An error produced by the `Spline` and the `SplineBuilder`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SplineError {
    /// The requested number of arc-length samples per curve is out of range.
    InvalidSamplesPerCurve(usize),
    /// A curve does not connect with its neighbor.
    ///
    /// `index` is the position at which the curve was being inserted or updated.
    Discontinuity { index: usize },
    /// A curve index is past the end of the spline.
    IndexOutOfRange { index: usize, len: usize },
    /// The spline has no curve to sample.
    Empty,
}

impl SplineError {
    /// Whether this error was caused by invalid construction parameters.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, SplineError::InvalidSamplesPerCurve(_))
    }

    /// Whether this error was caused by curves that do not connect.
    pub fn is_continuity_error(&self) -> bool {
        matches!(self, SplineError::Discontinuity { .. })
    }

    /// Whether this error was caused by an operation invoked in an invalid state.
    pub fn is_precondition_error(&self) -> bool {
        matches!(
            self,
            SplineError::IndexOutOfRange { .. } | SplineError::Empty
        )
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for SplineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SplineError::InvalidSamplesPerCurve(n) => {
                std::write!(
                    f,
                    "Invalid number of samples per curve ({}), expected a value between {} and {}",
                    n,
                    crate::spline::MIN_SAMPLES_PER_CURVE,
                    crate::spline::MAX_SAMPLES_PER_CURVE,
                )
            }
            SplineError::Discontinuity { index } => {
                std::write!(f, "The curve at index {} does not connect with its neighbors", index)
            }
            SplineError::IndexOutOfRange { index, len } => {
                std::write!(f, "Curve index {} is out of range (len: {})", index, len)
            }
            SplineError::Empty => {
                std::write!(f, "No curves have been added to the spline")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SplineError {}

/// An error produced by the point preprocessing functions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PreprocessError {
    /// The resampling distance is not larger than the epsilon.
    DistanceTooSmall { distance: f64, epsilon: f64 },
}

#[cfg(feature = "std")]
impl core::fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PreprocessError::DistanceTooSmall { distance, epsilon } => {
                std::write!(
                    f,
                    "Resampling distance {} must be larger than epsilon {}",
                    distance,
                    epsilon
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PreprocessError {}

/// An error produced when fitting a whole polyline at once.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FitError {
    /// At least two distinct points are needed to fit a curve.
    NotEnoughPoints(usize),
    /// The error tolerance is negative, zero or too small to be meaningful.
    InvalidTolerance(f64),
}

#[cfg(feature = "std")]
impl core::fmt::Display for FitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FitError::NotEnoughPoints(n) => {
                std::write!(f, "At least two distinct points are required, got {}", n)
            }
            FitError::InvalidTolerance(tolerance) => {
                std::write!(f, "Invalid fitting tolerance {}", tolerance)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FitError {}

/// A packed `AddPointResult` value that does not decode to any variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvalidPackedResult(pub i64);

#[cfg(feature = "std")]
impl core::fmt::Display for InvalidPackedResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        std::write!(f, "Invalid packed add point result: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidPackedResult {}
