//! The four operations the ride store exposes to the outside.
//!
//! Transports (this crate's CLI, or anything embedding the library) call
//! these and decide how to present results and errors.

use crate::core::analytics::{self, ChartData, ReportRow};
use crate::core::error::Result;
use crate::core::output;
use crate::core::ride::RideInput;
use crate::core::store::RideStore;
use serde::Serialize;

/// Outcome of storing one ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReceipt {
    /// The stored ride's user id, as parsed.
    pub user_id: String,
    /// Echo of the accepted fields, space separated.
    pub echo: String,
    pub evicted: usize,
}

pub struct RideService {
    store: RideStore,
}

impl RideService {
    pub fn new(store: RideStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RideStore {
        &self.store
    }

    pub fn reset(&self) -> Result<&'static str> {
        self.store.reset()?;
        Ok("database init complete!")
    }

    pub fn store_ride(&self, input: &RideInput) -> Result<StoreReceipt> {
        let ride = input.parse(&self.store.policy())?;
        let evicted = self.store.insert(&ride)?;
        Ok(StoreReceipt {
            user_id: ride.user_id.clone(),
            echo: format!(
                "{} {} {} {} {} {} {}",
                ride.user_id,
                ride.start.x,
                ride.start.y,
                ride.stop.x,
                ride.stop.y,
                ride.start_time,
                ride.stop_time
            ),
            evicted,
        })
    }

    pub fn distance_report(&self) -> Result<Vec<ReportRow>> {
        analytics::distance_report(&self.store.all_rides()?)
    }

    pub fn distance_report_csv(&self) -> Result<String> {
        output::render_report_csv(&self.distance_report()?)
    }

    pub fn dispersion_chart(&self, user_id: &str) -> Result<ChartData> {
        let rides = self.store.rides_for(user_id)?;
        analytics::dispersion_chart(user_id, self.store.capacity(), &rides)
    }
}
