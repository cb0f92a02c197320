//! Trip planning orchestration.
//!
//! Two debounced search pipelines (origin and destination) feed station
//! selections into a small state machine. The machine only becomes ready
//! when both sides hold distinct selections; the plan request itself is a
//! one-shot mutation whose outcome lands back in the machine.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::warn;

use crate::error::ApiError;
use crate::model::{JourneyPlan, Station};
use crate::search::{QueryPipeline, SearchConfig, SearchState, StationLookup};

/// Which end of the trip an edit applies to. Selections can be made in
/// either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Origin,
    Destination,
}

/// Lifecycle of the plan request.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanPhase {
    /// No request issued yet, or selections changed since the last one.
    Editing,
    /// Exactly one request in flight.
    Planning,
    /// Response received; an empty leg list means "no route found".
    Success(JourneyPlan),
    /// Request failed; selections are preserved for retry.
    Failed(String),
}

/// What the UI should render for the plan panel.
#[derive(Debug, PartialEq)]
pub enum PlanView<'a> {
    Idle,
    Planning,
    /// Successful response with zero legs. Not an error.
    NoRoute,
    Route(&'a JourneyPlan),
    Error(&'a str),
}

/// The parameters a plan request is bound to at issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub origin_id: i64,
    pub destination_id: i64,
    pub when: Option<DateTime<Utc>>,
}

struct PlannerSide {
    text: String,
    selection: Option<Station>,
    pipeline: QueryPipeline,
}

impl PlannerSide {
    fn new(lookup: Arc<dyn StationLookup>, config: SearchConfig) -> Self {
        PlannerSide {
            text: String::new(),
            selection: None,
            pipeline: QueryPipeline::spawn(lookup, config),
        }
    }
}

pub struct TripPlanner {
    origin: PlannerSide,
    destination: PlannerSide,
    travel_date: Option<NaiveDate>,
    travel_time: Option<NaiveTime>,
    phase: PlanPhase,
}

impl TripPlanner {
    pub fn new(lookup: Arc<dyn StationLookup>, config: SearchConfig) -> Self {
        TripPlanner {
            origin: PlannerSide::new(Arc::clone(&lookup), config.clone()),
            destination: PlannerSide::new(lookup, config),
            travel_date: None,
            travel_time: None,
            phase: PlanPhase::Editing,
        }
    }

    fn side(&self, side: Side) -> &PlannerSide {
        match side {
            Side::Origin => &self.origin,
            Side::Destination => &self.destination,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut PlannerSide {
        match side {
            Side::Origin => &mut self.origin,
            Side::Destination => &mut self.destination,
        }
    }

    /// Feeds raw text for one side. Editing after a selection was made
    /// immediately clears that side's selection, forcing re-confirmation,
    /// and re-enables suggestions.
    pub fn set_text(&mut self, side: Side, text: impl Into<String>) {
        let text = text.into();
        let state = self.side_mut(side);
        state.text = text.clone();
        state.selection = None;
        state.pipeline.set_input(text);
    }

    /// Binds a suggested station to one side, replacing the raw text with
    /// its display name and closing suggestions.
    pub fn select(&mut self, side: Side, station: Station) {
        let state = self.side_mut(side);
        state.text = station.name.clone();
        state.selection = Some(station);
    }

    pub fn text(&self, side: Side) -> &str {
        &self.side(side).text
    }

    pub fn selection(&self, side: Side) -> Option<&Station> {
        self.side(side).selection.as_ref()
    }

    /// Current suggestion list for one side. Empty while a selection is
    /// bound, since the text then mirrors the chosen station.
    pub fn suggestions(&self, side: Side) -> SearchState {
        if self.side(side).selection.is_some() {
            return SearchState::default();
        }
        self.side(side).pipeline.state()
    }

    pub fn set_travel_date(&mut self, date: Option<NaiveDate>) {
        self.travel_date = date;
    }

    pub fn set_travel_time(&mut self, time: Option<NaiveTime>) {
        self.travel_time = time;
    }

    /// Combines the date and time-of-day fields into one instant, taken as
    /// UTC wall-clock. No timezone correction is performed.
    pub fn requested_datetime(&self) -> Option<DateTime<Utc>> {
        let date = self.travel_date?;
        let time = self.travel_time.unwrap_or_default();
        Some(date.and_time(time).and_utc())
    }

    /// The "Ready" condition: both sides hold a selection, the selections
    /// are distinct stations, and no request is in flight. The plan action
    /// stays disabled otherwise, so an identical origin/destination never
    /// becomes a runtime error.
    pub fn can_plan(&self) -> bool {
        let (Some(origin), Some(destination)) =
            (&self.origin.selection, &self.destination.selection)
        else {
            return false;
        };
        origin.id != destination.id && self.phase != PlanPhase::Planning
    }

    /// Issues a plan request if the machine is ready, entering `Planning`.
    /// Returns the bound request parameters, or `None` if not ready.
    pub fn start_plan(&mut self) -> Option<PlanRequest> {
        if !self.can_plan() {
            return None;
        }
        // can_plan guarantees both selections are present
        let origin_id = self.origin.selection.as_ref()?.id;
        let destination_id = self.destination.selection.as_ref()?.id;

        self.phase = PlanPhase::Planning;
        Some(PlanRequest {
            origin_id,
            destination_id,
            when: self.requested_datetime(),
        })
    }

    /// Applies the outcome of the in-flight request. Selections are kept in
    /// every case so the user can retry without re-searching.
    pub fn complete_plan(&mut self, result: Result<JourneyPlan, ApiError>) {
        if self.phase != PlanPhase::Planning {
            warn!("plan response arrived outside Planning phase, ignoring");
            return;
        }
        self.phase = match result {
            Ok(plan) => PlanPhase::Success(plan),
            Err(e) => PlanPhase::Failed(e.to_string()),
        };
    }

    /// Full round trip: issue the request through `send` and apply the
    /// outcome. Returns `false` without side effects when not ready.
    pub async fn plan_with<F, Fut>(&mut self, send: F) -> bool
    where
        F: FnOnce(PlanRequest) -> Fut,
        Fut: Future<Output = Result<JourneyPlan, ApiError>>,
    {
        let Some(request) = self.start_plan() else {
            return false;
        };
        let result = send(request).await;
        self.complete_plan(result);
        true
    }

    pub fn phase(&self) -> &PlanPhase {
        &self.phase
    }

    pub fn view(&self) -> PlanView<'_> {
        match &self.phase {
            PlanPhase::Editing => PlanView::Idle,
            PlanPhase::Planning => PlanView::Planning,
            PlanPhase::Success(plan) if plan.legs.is_empty() => PlanView::NoRoute,
            PlanPhase::Success(plan) => PlanView::Route(plan),
            PlanPhase::Failed(message) => PlanView::Error(message),
        }
    }
}
