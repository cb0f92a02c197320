//! Contract for the remote metro service.
//!
//! The service owns all route computation, persistence, and incident
//! storage; this crate only consumes these request/response operations and
//! derives read-only views from the results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::model::{Incident, JourneyPlan, Line, LineDetail, NextArrival, Station};

/// Abstraction over the metro backend.
///
/// Implemented by [`RestMetroApi`](crate::infra::rest::RestMetroApi) for the
/// real service and by in-process mocks in tests.
#[async_trait]
pub trait MetroApi: Send + Sync {
    /// Returns every line in the network.
    async fn list_lines(&self) -> Result<Vec<Line>, ApiError>;

    /// Returns one line with its stations in travel order.
    async fn get_line_detail(&self, line_id: i64) -> Result<LineDetail, ApiError>;

    /// Searches stations by name. An empty query is allowed and returns the
    /// backend's default listing.
    async fn search_stations(&self, query: &str) -> Result<Vec<Station>, ApiError>;

    async fn get_station(&self, station_id: i64) -> Result<Station, ApiError>;

    /// Returns the lines serving a station.
    async fn get_station_lines(&self, station_id: i64) -> Result<Vec<Line>, ApiError>;

    /// Returns upcoming arrivals at a station. Ephemeral; meant to be polled.
    async fn get_next_arrivals(&self, station_id: i64) -> Result<Vec<NextArrival>, ApiError>;

    async fn list_active_incidents(&self) -> Result<Vec<Incident>, ApiError>;

    /// Requests a journey plan. `when` is sent as-is; the backend treats a
    /// missing instant as "now".
    async fn plan_journey(
        &self,
        origin_id: i64,
        destination_id: i64,
        when: Option<DateTime<Utc>>,
    ) -> Result<JourneyPlan, ApiError>;
}
