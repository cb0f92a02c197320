//! Whole-network snapshot: the N-way join over per-line detail fetches and
//! the derived views built from it.
//!
//! The interchange index and the map features are only meaningful over a
//! complete set of line details, so the join waits for every fetch before
//! deriving anything. Partial results are never merged into a half-built
//! index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::geo::{NetworkGeo, build_network_geo};
use crate::interchange::{InterchangeEntry, build_interchange_index};
use crate::model::{Line, LineDetail};
use crate::services::metro_api::MetroApi;

/// A consistent read-only view of the whole network at one point in time.
#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    pub lines: Vec<Line>,
    pub details: Vec<LineDetail>,
    pub interchanges: HashMap<i64, InterchangeEntry>,
    pub geo: NetworkGeo,
}

/// Fetches the line listing, joins all detail fetches, and derives the
/// interchange index and map features. Any failed detail fails the whole
/// load; the caller keeps its previous snapshot in that case.
#[tracing::instrument(skip(api))]
pub async fn load_network(api: Arc<dyn MetroApi>) -> Result<NetworkSnapshot, ApiError> {
    let lines = api.list_lines().await?;
    load_details(api, lines).await
}

async fn load_details(
    api: Arc<dyn MetroApi>,
    lines: Vec<Line>,
) -> Result<NetworkSnapshot, ApiError> {
    let mut tasks = Vec::with_capacity(lines.len());
    for line in &lines {
        let api = Arc::clone(&api);
        let line_id = line.id;
        tasks.push(tokio::spawn(async move {
            api.get_line_detail(line_id).await
        }));
    }

    // Join over all fetches; awaiting in spawn order keeps details aligned
    // with the listing.
    let mut details = Vec::with_capacity(tasks.len());
    for task in tasks {
        let detail = task
            .await
            .map_err(|e| ApiError::Transport(format!("detail fetch aborted: {e}")))??;
        details.push(detail);
    }

    let interchanges = build_interchange_index(&details);
    let geo = build_network_geo(&details);
    info!(
        lines = lines.len(),
        stations = geo.stations.features.len(),
        interchanges = interchanges.len(),
        "network snapshot built"
    );

    Ok(NetworkSnapshot {
        lines,
        details,
        interchanges,
        geo,
    })
}

/// Wholesale cache for the network snapshot.
///
/// The key is the exact line-id list from the listing; a key change
/// invalidates the whole snapshot immediately, and within the TTL the
/// cached snapshot is reused without refetching details. There is no
/// partial or incremental invalidation.
pub struct NetworkCache {
    ttl: Duration,
    cached: Option<CachedSnapshot>,
}

struct CachedSnapshot {
    key: Vec<i64>,
    loaded_at: Instant,
    snapshot: Arc<NetworkSnapshot>,
}

impl NetworkCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

    pub fn new(ttl: Duration) -> Self {
        NetworkCache { ttl, cached: None }
    }

    pub async fn get_or_load(
        &mut self,
        api: Arc<dyn MetroApi>,
    ) -> Result<Arc<NetworkSnapshot>, ApiError> {
        // The listing is always refreshed; it is both the cache key and the
        // first half of the load.
        let lines = api.list_lines().await?;
        let key: Vec<i64> = lines.iter().map(|l| l.id).collect();

        if let Some(cached) = &self.cached {
            if cached.key == key && cached.loaded_at.elapsed() < self.ttl {
                debug!("serving cached network snapshot");
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        let snapshot = Arc::new(load_details(api, lines).await?);
        self.cached = Some(CachedSnapshot {
            key,
            loaded_at: Instant::now(),
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }
}

impl Default for NetworkCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Incident, JourneyPlan, LineStatus, NextArrival, Station, StationFacilities,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time;

    fn station(id: i64, name: &str) -> Station {
        Station {
            id,
            name: name.to_string(),
            lat: Some(42.23 + id as f64 * 0.01),
            lon: Some(-8.72 + id as f64 * 0.01),
            accessible: true,
            facilities: StationFacilities::default(),
            accessibility_note: None,
        }
    }

    struct FakeApi {
        lines: Mutex<Vec<Line>>,
        detail_calls: AtomicUsize,
        fail_detail: Option<i64>,
    }

    impl FakeApi {
        fn with_lines(ids: &[i64]) -> Self {
            FakeApi {
                lines: Mutex::new(ids.iter().map(|&id| make_line(id)).collect()),
                detail_calls: AtomicUsize::new(0),
                fail_detail: None,
            }
        }

        fn detail_calls(&self) -> usize {
            self.detail_calls.load(Ordering::SeqCst)
        }
    }

    fn make_line(id: i64) -> Line {
        Line {
            id,
            code: format!("M{id}"),
            name: format!("Line {id}"),
            color_hex: "#17becf".to_string(),
            status: LineStatus::Ok,
        }
    }

    #[async_trait]
    impl MetroApi for FakeApi {
        async fn list_lines(&self) -> Result<Vec<Line>, ApiError> {
            Ok(self.lines.lock().unwrap().clone())
        }

        async fn get_line_detail(&self, line_id: i64) -> Result<LineDetail, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_detail == Some(line_id) {
                return Err(ApiError::Http {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(LineDetail {
                id: line_id,
                code: format!("M{line_id}"),
                name: format!("Line {line_id}"),
                color_hex: "#17becf".to_string(),
                status: LineStatus::Ok,
                // every line shares station 100, so interchanges exist
                stations: vec![station(100, "Hub"), station(line_id * 10, "End")],
            })
        }

        async fn search_stations(&self, _query: &str) -> Result<Vec<Station>, ApiError> {
            unimplemented!("not used by these tests")
        }

        async fn get_station(&self, _station_id: i64) -> Result<Station, ApiError> {
            unimplemented!("not used by these tests")
        }

        async fn get_station_lines(&self, _station_id: i64) -> Result<Vec<Line>, ApiError> {
            unimplemented!("not used by these tests")
        }

        async fn get_next_arrivals(&self, _station_id: i64) -> Result<Vec<NextArrival>, ApiError> {
            unimplemented!("not used by these tests")
        }

        async fn list_active_incidents(&self) -> Result<Vec<Incident>, ApiError> {
            unimplemented!("not used by these tests")
        }

        async fn plan_journey(
            &self,
            _origin_id: i64,
            _destination_id: i64,
            _when: Option<DateTime<Utc>>,
        ) -> Result<JourneyPlan, ApiError> {
            unimplemented!("not used by these tests")
        }
    }

    #[tokio::test]
    async fn snapshot_derives_views_over_all_lines() {
        let api = Arc::new(FakeApi::with_lines(&[1, 2]));
        let snapshot = load_network(api.clone()).await.unwrap();

        assert_eq!(snapshot.details.len(), 2);
        assert_eq!(api.detail_calls(), 2);
        // hub is served by both lines
        assert_eq!(snapshot.interchanges[&100].count, 2);
        assert_eq!(snapshot.geo.stations.features.len(), 3);
    }

    #[tokio::test]
    async fn one_failed_detail_fails_the_whole_load() {
        let api = Arc::new(FakeApi {
            fail_detail: Some(2),
            ..FakeApi::with_lines(&[1, 2, 3])
        });

        let result = load_network(api).await;
        assert!(matches!(result, Err(ApiError::Http { status: 500, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn cache_serves_snapshot_within_ttl() {
        let api = Arc::new(FakeApi::with_lines(&[1, 2]));
        let mut cache = NetworkCache::new(Duration::from_secs(30));

        let first = cache.get_or_load(api.clone()).await.unwrap();
        assert_eq!(api.detail_calls(), 2);

        time::advance(Duration::from_secs(10)).await;
        let second = cache.get_or_load(api.clone()).await.unwrap();
        assert_eq!(api.detail_calls(), 2); // no refetch
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn cache_reloads_after_ttl_expiry() {
        let api = Arc::new(FakeApi::with_lines(&[1, 2]));
        let mut cache = NetworkCache::new(Duration::from_secs(30));

        cache.get_or_load(api.clone()).await.unwrap();
        time::advance(Duration::from_secs(31)).await;
        cache.get_or_load(api.clone()).await.unwrap();

        assert_eq!(api.detail_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn key_change_invalidates_wholesale() {
        let api = Arc::new(FakeApi::with_lines(&[1, 2]));
        let mut cache = NetworkCache::new(Duration::from_secs(30));

        cache.get_or_load(api.clone()).await.unwrap();
        assert_eq!(api.detail_calls(), 2);

        // a new line appears well within the TTL
        api.lines.lock().unwrap().push(make_line(3));
        let snapshot = cache.get_or_load(api.clone()).await.unwrap();

        assert_eq!(api.detail_calls(), 5); // full reload, all three lines
        assert_eq!(snapshot.details.len(), 3);
        assert_eq!(snapshot.interchanges[&100].count, 3);
    }
}
