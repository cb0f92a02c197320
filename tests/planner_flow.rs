//! End-to-end flow against an in-memory backend: load the network snapshot,
//! search for stations through the debounced pipeline, and plan a trip.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time;

use metro_core::error::ApiError;
use metro_core::model::{
    Incident, JourneyPlan, Leg, LegKind, Line, LineDetail, LineStatus, NextArrival, Station,
    StationFacilities,
};
use metro_core::network::load_network;
use metro_core::planner::{PlanView, Side, TripPlanner};
use metro_core::search::{QueryPipeline, SearchConfig, SearchStatus, StationLookup};
use metro_core::services::metro_api::MetroApi;

fn station(id: i64, name: &str) -> Station {
    Station {
        id,
        name: name.to_string(),
        lat: Some(42.22 + id as f64 * 0.005),
        lon: Some(-8.73 + id as f64 * 0.005),
        accessible: true,
        facilities: StationFacilities::default(),
        accessibility_note: None,
    }
}

/// Two-line network sharing one station:
///
///   M1: Urzaiz - Areal - Porta do Sol
///   M2: Porta do Sol - Bouzas
struct InMemoryBackend {
    details: Vec<LineDetail>,
}

impl InMemoryBackend {
    fn new() -> Self {
        let urzaiz = station(1, "Urzaiz");
        let areal = station(2, "Areal");
        let porta = station(3, "Porta do Sol");
        let bouzas = station(4, "Bouzas");

        InMemoryBackend {
            details: vec![
                LineDetail {
                    id: 1,
                    code: "M1".to_string(),
                    name: "Liña Urzaiz".to_string(),
                    color_hex: "#d62728".to_string(),
                    status: LineStatus::Ok,
                    stations: vec![urzaiz, areal, porta.clone()],
                },
                LineDetail {
                    id: 2,
                    code: "M2".to_string(),
                    name: "Liña Bouzas".to_string(),
                    color_hex: "#1f77b4".to_string(),
                    status: LineStatus::Ok,
                    stations: vec![porta, bouzas],
                },
            ],
        }
    }

    fn all_stations(&self) -> Vec<Station> {
        let mut out: Vec<Station> = Vec::new();
        for detail in &self.details {
            for station in &detail.stations {
                if !out.iter().any(|s| s.id == station.id) {
                    out.push(station.clone());
                }
            }
        }
        out
    }
}

#[async_trait]
impl MetroApi for InMemoryBackend {
    async fn list_lines(&self) -> Result<Vec<Line>, ApiError> {
        Ok(self
            .details
            .iter()
            .map(|d| Line {
                id: d.id,
                code: d.code.clone(),
                name: d.name.clone(),
                color_hex: d.color_hex.clone(),
                status: d.status.clone(),
            })
            .collect())
    }

    async fn get_line_detail(&self, line_id: i64) -> Result<LineDetail, ApiError> {
        self.details
            .iter()
            .find(|d| d.id == line_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("line {line_id}")))
    }

    async fn search_stations(&self, query: &str) -> Result<Vec<Station>, ApiError> {
        let needle = query.to_lowercase();
        Ok(self
            .all_stations()
            .into_iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn get_station(&self, station_id: i64) -> Result<Station, ApiError> {
        self.all_stations()
            .into_iter()
            .find(|s| s.id == station_id)
            .ok_or_else(|| ApiError::NotFound(format!("station {station_id}")))
    }

    async fn get_station_lines(&self, station_id: i64) -> Result<Vec<Line>, ApiError> {
        let lines = self.list_lines().await?;
        Ok(lines
            .into_iter()
            .filter(|line| {
                self.details
                    .iter()
                    .find(|d| d.id == line.id)
                    .map(|d| d.stations.iter().any(|s| s.id == station_id))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn get_next_arrivals(&self, _station_id: i64) -> Result<Vec<NextArrival>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_active_incidents(&self) -> Result<Vec<Incident>, ApiError> {
        Ok(Vec::new())
    }

    async fn plan_journey(
        &self,
        origin_id: i64,
        destination_id: i64,
        _when: Option<DateTime<Utc>>,
    ) -> Result<JourneyPlan, ApiError> {
        let origin = self.get_station(origin_id).await?;
        let destination = self.get_station(destination_id).await?;

        // One direct leg on the same line, or a transfer through the shared
        // station; anything else is "no route".
        let same_line = self.details.iter().find(|d| {
            d.stations.iter().any(|s| s.id == origin_id)
                && d.stations.iter().any(|s| s.id == destination_id)
        });

        let legs = match same_line {
            Some(line) => vec![Leg {
                kind: LegKind::Metro,
                line_code: Some(line.code.clone()),
                from_name: origin.name,
                to_name: destination.name,
                duration_min: 9,
                direction: Some(line.stations.last().map(|s| s.name.clone()).unwrap_or_default()),
            }],
            None => {
                let hub = self.get_station(3).await?;
                vec![
                    Leg {
                        kind: LegKind::Metro,
                        line_code: Some("M1".to_string()),
                        from_name: origin.name,
                        to_name: hub.name.clone(),
                        duration_min: 6,
                        direction: Some(hub.name.clone()),
                    },
                    Leg {
                        kind: LegKind::Walk,
                        line_code: None,
                        from_name: hub.name.clone(),
                        to_name: hub.name.clone(),
                        duration_min: 3,
                        direction: None,
                    },
                    Leg {
                        kind: LegKind::Metro,
                        line_code: Some("M2".to_string()),
                        from_name: hub.name,
                        to_name: destination.name,
                        duration_min: 5,
                        direction: None,
                    },
                ]
            }
        };

        let total: u32 = legs.iter().map(|l| l.duration_min).sum();
        let metro_legs = legs.iter().filter(|l| l.kind == LegKind::Metro).count() as u32;
        let transfers = metro_legs.saturating_sub(1);
        Ok(JourneyPlan {
            total_duration_min: total,
            transfers,
            legs,
        })
    }
}

#[async_trait]
impl StationLookup for InMemoryBackend {
    async fn search_stations(&self, query: &str) -> Result<Vec<Station>, ApiError> {
        MetroApi::search_stations(self, query).await
    }
}

#[tokio::test]
async fn snapshot_marks_the_shared_station_as_interchange() {
    let api: Arc<dyn MetroApi> = Arc::new(InMemoryBackend::new());
    let snapshot = load_network(api).await.unwrap();

    assert_eq!(snapshot.lines.len(), 2);
    assert_eq!(snapshot.geo.stations.features.len(), 4);
    assert_eq!(snapshot.geo.lines.features.len(), 2);

    let hub = &snapshot.interchanges[&3];
    assert!(hub.is_interchange());
    assert_eq!(hub.line_codes, vec!["M1", "M2"]);

    // terminus stations belong to one line only
    assert!(!snapshot.interchanges[&1].is_interchange());
    assert!(!snapshot.interchanges[&4].is_interchange());
}

#[tokio::test(start_paused = true)]
async fn search_then_select_then_plan_yields_a_route() {
    let backend = Arc::new(InMemoryBackend::new());

    // find the origin through the debounced pipeline, as the UI would
    let pipeline = QueryPipeline::spawn(backend.clone(), SearchConfig::default());
    pipeline.set_input("urz");
    time::sleep(Duration::from_millis(400)).await;

    let state = pipeline.state();
    assert_eq!(state.status, SearchStatus::Results);
    let origin = state.results[0].clone();
    assert_eq!(origin.name, "Urzaiz");

    let mut planner = TripPlanner::new(backend.clone(), SearchConfig::default());
    planner.select(Side::Origin, origin);
    planner.select(Side::Destination, station(4, "Bouzas"));
    assert!(planner.can_plan());

    let send_api = Arc::clone(&backend);
    let issued = planner
        .plan_with(|req| async move {
            send_api
                .plan_journey(req.origin_id, req.destination_id, req.when)
                .await
        })
        .await;
    assert!(issued);

    match planner.view() {
        PlanView::Route(plan) => {
            // Urzaiz and Bouzas are on different lines, so the route goes
            // through the hub with one transfer
            assert_eq!(plan.legs.len(), 3);
            assert_eq!(plan.transfers, 1);
            assert_eq!(plan.total_duration_min, 14);
            assert_eq!(plan.legs[1].kind, LegKind::Walk);
        }
        other => panic!("expected a route, got {other:?}"),
    }
}

#[tokio::test]
async fn same_station_on_both_sides_never_issues_a_request() {
    let backend = Arc::new(InMemoryBackend::new());
    let mut planner = TripPlanner::new(backend.clone(), SearchConfig::default());

    planner.select(Side::Origin, station(2, "Areal"));
    planner.select(Side::Destination, station(2, "Areal"));

    let issued = planner
        .plan_with(|_req| async { panic!("request must not be issued") })
        .await;
    assert!(!issued);
    assert_eq!(planner.view(), PlanView::Idle);
}

#[tokio::test]
async fn direct_trip_on_one_line_has_no_transfer() {
    let backend = Arc::new(InMemoryBackend::new());
    let mut planner = TripPlanner::new(backend.clone(), SearchConfig::default());

    planner.select(Side::Origin, station(1, "Urzaiz"));
    planner.select(Side::Destination, station(3, "Porta do Sol"));

    let send_api = Arc::clone(&backend);
    planner
        .plan_with(|req| async move {
            send_api
                .plan_journey(req.origin_id, req.destination_id, req.when)
                .await
        })
        .await;

    match planner.view() {
        PlanView::Route(plan) => {
            assert_eq!(plan.legs.len(), 1);
            assert_eq!(plan.transfers, 0);
            assert_eq!(plan.legs[0].line_code.as_deref(), Some("M1"));
        }
        other => panic!("expected a direct route, got {other:?}"),
    }
}
