//! Distance report and running dispersion over ride snapshots.
//!
//! Functions here only read the slices handed to them; nothing is retained
//! between calls.

use crate::core::error::{Result, RideLogError};
use crate::core::geometry;
use crate::core::ride::{Fixed3, Ride};
use rayon::prelude::*;
use serde::Serialize;

/// One line of the distance report, in legacy column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub start_x: Fixed3,
    pub start_y: Fixed3,
    pub stop_x: Fixed3,
    pub stop_y: Fixed3,
    pub user_id: String,
    pub distance: f64,
}

/// Every ride with its distance, ascending by distance.
///
/// The sort is stable: rides at equal distance keep their input order.
pub fn distance_report(rides: &[Ride]) -> Result<Vec<ReportRow>> {
    let mut rows = rides
        .par_iter()
        .map(|ride| -> Result<ReportRow> {
            Ok(ReportRow {
                start_x: ride.start.x,
                start_y: ride.start.y,
                stop_x: ride.stop.x,
                stop_y: ride.stop.y,
                user_id: ride.user_id.clone(),
                distance: ride.distance()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    rows.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(rows)
}

/// Running population variance of ride distances, one value per prefix.
///
/// Element `i` (0-based) is the variance of the first `i + 1` distances.
/// Each element is computed from scratch over its prefix, so a clone or a
/// fresh series replays identical values.
#[derive(Debug, Clone)]
pub struct DispersionSeries {
    distances: Vec<f64>,
    next: usize,
}

impl Iterator for DispersionSeries {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.distances.len() {
            return None;
        }
        self.next += 1;
        // Prefix is non-empty and `dispersion_series` admitted only finite distances.
        let variance = geometry::population_variance(&self.distances[..self.next]);
        debug_assert!(variance.is_ok(), "prefix variance failed: {:?}", variance);
        Some(variance.unwrap_or(f64::NAN))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.distances.len() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for DispersionSeries {}

/// Dispersion series over `rides` in the order given.
///
/// Empty input yields an empty series rather than an error. Every ride
/// yields exactly one element.
pub fn dispersion_series(rides: &[Ride]) -> Result<DispersionSeries> {
    let distances = rides.iter().map(Ride::distance).collect::<Result<Vec<_>>>()?;
    if let Some(bad) = distances.iter().find(|d| !d.is_finite()) {
        return Err(RideLogError::InvalidInput(format!(
            "non-finite ride distance {}",
            bad
        )));
    }
    Ok(DispersionSeries { distances, next: 0 })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// 1-based position in the user's ride history
    pub ride_index: usize,
    pub dispersion: f64,
}

/// Data behind a user's dispersion chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub user_id: String,
    pub title: String,
    pub points: Vec<ChartPoint>,
}

pub fn dispersion_chart(user_id: &str, capacity: usize, rides: &[Ride]) -> Result<ChartData> {
    let points = dispersion_series(rides)?
        .enumerate()
        .map(|(i, dispersion)| ChartPoint {
            ride_index: i + 1,
            dispersion,
        })
        .collect();

    Ok(ChartData {
        user_id: user_id.to_string(),
        title: format!("user_id:{} total_rides:{}", user_id, capacity),
        points,
    })
}
