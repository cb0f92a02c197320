//! Wire data model for the metro service.
//!
//! Field names mirror the JSON the backend emits (camelCase). Open-ended
//! string enums deserialize through `From<String>` so an unrecognized value
//! degrades to a passthrough variant instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall service status of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineStatus {
    Ok,
    Delayed,
    Down,
    /// Any status string the backend may introduce later. Display-only.
    Unknown(String),
}

impl From<String> for LineStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OK" => LineStatus::Ok,
            "DELAYED" => LineStatus::Delayed,
            "DOWN" => LineStatus::Down,
            _ => LineStatus::Unknown(s),
        }
    }
}

impl From<LineStatus> for String {
    fn from(s: LineStatus) -> Self {
        s.to_string()
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineStatus::Ok => write!(f, "OK"),
            LineStatus::Delayed => write!(f, "DELAYED"),
            LineStatus::Down => write!(f, "DOWN"),
            LineStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// A named, colored metro route with an overall status.
///
/// Identity is `id`; `code` is a human-facing short label and must be
/// treated as display-only (not guaranteed unique).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub color_hex: String,
    pub status: LineStatus,
}

/// Optional station facility flags. Absence means *unknown*, not `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationFacilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_elevator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_toilets: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_info_point: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_e_bikes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_bike_parking: Option<bool>,
}

/// A physical stop, optionally geolocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub accessible: bool,
    #[serde(flatten)]
    pub facilities: StationFacilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_note: Option<String>,
}

impl Station {
    /// Returns `(lon, lat)` when both coordinates are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}

/// A line plus its stations in physical travel order.
///
/// Order is semantically meaningful (first/last are termini). Raw data may
/// list the same station twice within one line; consumers must tolerate
/// that without inflating counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDetail {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub color_hex: String,
    pub status: LineStatus,
    pub stations: Vec<Station>,
}

/// Incident severity, ordered worst to least: CRITICAL > MAJOR > MINOR > INFO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Info,
    Unknown(String),
}

impl Severity {
    /// Numeric rank for sorting: CRITICAL=0, MAJOR=1, MINOR=2, INFO=3.
    /// Unknown values rank lowest.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Major => 1,
            Severity::Minor => 2,
            Severity::Info => 3,
            Severity::Unknown(_) => 4,
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CRITICAL" => Severity::Critical,
            "MAJOR" => Severity::Major,
            "MINOR" => Severity::Minor,
            "INFO" => Severity::Info,
            _ => Severity::Unknown(s),
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Major => write!(f, "MAJOR"),
            Severity::Minor => write!(f, "MINOR"),
            Severity::Info => write!(f, "INFO"),
            Severity::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Blast radius of an incident. Missing or unrecognized scope defaults to
/// network-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    #[default]
    Network,
    Line,
    Station,
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        match s.as_str() {
            "LINE" => Scope::Line,
            "STATION" => Scope::Station,
            _ => Scope::Network,
        }
    }
}

impl From<Scope> for String {
    fn from(s: Scope) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Network => write!(f, "NETWORK"),
            Scope::Line => write!(f, "LINE"),
            Scope::Station => write!(f, "STATION"),
        }
    }
}

/// A service incident. At most one of the line/station references should be
/// populated consistent with `scope`, but the contract does not guarantee
/// it, so consumers never infer scope from the references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i64,
    pub severity: Severity,
    #[serde(default)]
    pub scope: Scope,
    pub title: String,
    pub message: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,
}

/// A polled, ephemeral arrival estimate for one line at one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextArrival {
    pub line_id: i64,
    pub line_code: String,
    pub direction: String,
    pub minutes: u32,
}

/// One segment of a journey: a walk or a ride on a specific line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LegKind {
    Walk,
    Metro,
    Unknown(String),
}

impl From<String> for LegKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "WALK" => LegKind::Walk,
            "METRO" => LegKind::Metro,
            _ => LegKind::Unknown(s),
        }
    }
}

impl From<LegKind> for String {
    fn from(k: LegKind) -> Self {
        k.to_string()
    }
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegKind::Walk => write!(f, "WALK"),
            LegKind::Metro => write!(f, "METRO"),
            LegKind::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    #[serde(rename = "type")]
    pub kind: LegKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_code: Option<String>,
    pub from_name: String,
    pub to_name: String,
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

/// A computed journey. An empty `legs` sequence means "no route found" and
/// must render distinctly from an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPlan {
    pub total_duration_min: u32,
    pub transfers: u32,
    pub legs: Vec<Leg>,
}
