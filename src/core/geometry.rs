//! Planar distance and dispersion primitives.
//!
//! Both functions are pure. Callers that need the zero-sample case to be
//! silent (the running dispersion chart) must guard before calling
//! [`population_variance`].

use crate::core::error::{Result, RideLogError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Euclidean distance between `a` and `b`.
///
/// Fails with [`RideLogError::InvalidInput`] when any coordinate is NaN or
/// infinite.
pub fn distance(a: Point, b: Point) -> Result<f64> {
    if !a.is_finite() || !b.is_finite() {
        return Err(RideLogError::InvalidInput(format!(
            "non-finite coordinate in distance({:?}, {:?})",
            a, b
        )));
    }
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    Ok((dx * dx + dy * dy).sqrt())
}

/// Population variance (divisor `n`) of `values`.
///
/// A single sample has variance `0.0`. An empty slice is
/// [`RideLogError::InsufficientData`].
pub fn population_variance(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(RideLogError::InsufficientData(
            "population variance requires at least one data point".to_string(),
        ));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(RideLogError::InvalidInput(format!(
            "non-finite sample {} in variance input",
            bad
        )));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    Ok(sum_sq / n)
}
