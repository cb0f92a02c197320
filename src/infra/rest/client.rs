use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;

use crate::error::ApiError;
use crate::fetch::{BasicClient, get_json};
use crate::model::{Incident, JourneyPlan, Line, LineDetail, NextArrival, Station};
use crate::search::StationLookup;
use crate::services::metro_api::MetroApi;

/// Environment variable holding the backend base URL.
pub const BASE_URL_ENV: &str = "METRO_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// REST implementation of [`MetroApi`].
pub struct RestMetroApi {
    base_url: Url,
    http: BasicClient,
}

impl RestMetroApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Transport(format!("invalid base url {base_url}: {e}")))?;
        let http = BasicClient::with_timeouts()?;
        Ok(Self { base_url, http })
    }

    /// Reads the base URL from `METRO_API_URL`, falling back to the local
    /// development backend.
    pub fn from_env() -> Result<Self, ApiError> {
        let base = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| ApiError::Transport(format!("invalid url {raw}: {e}")))
    }
}

#[async_trait]
impl MetroApi for RestMetroApi {
    #[tracing::instrument(skip(self))]
    async fn list_lines(&self) -> Result<Vec<Line>, ApiError> {
        get_json(&self.http, self.endpoint("/api/lines")?).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_line_detail(&self, line_id: i64) -> Result<LineDetail, ApiError> {
        get_json(&self.http, self.endpoint(&format!("/api/lines/{line_id}"))?).await
    }

    #[tracing::instrument(skip(self))]
    async fn search_stations(&self, query: &str) -> Result<Vec<Station>, ApiError> {
        let mut url = self.endpoint("/api/stations")?;
        url.query_pairs_mut().append_pair("query", query);
        get_json(&self.http, url).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_station(&self, station_id: i64) -> Result<Station, ApiError> {
        get_json(
            &self.http,
            self.endpoint(&format!("/api/stations/{station_id}"))?,
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_station_lines(&self, station_id: i64) -> Result<Vec<Line>, ApiError> {
        get_json(
            &self.http,
            self.endpoint(&format!("/api/stations/{station_id}/lines"))?,
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_next_arrivals(&self, station_id: i64) -> Result<Vec<NextArrival>, ApiError> {
        get_json(
            &self.http,
            self.endpoint(&format!("/api/stations/{station_id}/arrivals"))?,
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_active_incidents(&self) -> Result<Vec<Incident>, ApiError> {
        get_json(&self.http, self.endpoint("/api/incidents/active")?).await
    }

    #[tracing::instrument(skip(self))]
    async fn plan_journey(
        &self,
        origin_id: i64,
        destination_id: i64,
        when: Option<DateTime<Utc>>,
    ) -> Result<JourneyPlan, ApiError> {
        let mut url = self.endpoint("/api/journey")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("from", &origin_id.to_string());
            pairs.append_pair("to", &destination_id.to_string());
            if let Some(when) = when {
                pairs.append_pair("datetime", &when.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
        }
        get_json(&self.http, url).await
    }
}

#[async_trait]
impl StationLookup for RestMetroApi {
    async fn search_stations(&self, query: &str) -> Result<Vec<Station>, ApiError> {
        MetroApi::search_stations(self, query).await
    }
}
