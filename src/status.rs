//! Incident ranking and network health for the status view.

use std::collections::HashMap;

use crate::model::{Incident, Line, LineStatus, NextArrival, Scope};

/// Incidents partitioned by scope, each bucket sorted worst-first.
#[derive(Debug, Default, Clone)]
pub struct IncidentBoard {
    pub network: Vec<Incident>,
    pub line: Vec<Incident>,
    pub station: Vec<Incident>,
}

impl IncidentBoard {
    pub fn is_empty(&self) -> bool {
        self.network.is_empty() && self.line.is_empty() && self.station.is_empty()
    }
}

/// Partitions incidents into NETWORK/LINE/STATION buckets and sorts each
/// bucket ascending by severity rank. The sort is stable, so incidents of
/// equal severity keep their arrival order. Missing scope was already
/// defaulted to NETWORK at deserialization.
pub fn group_incidents(incidents: &[Incident]) -> IncidentBoard {
    let mut board = IncidentBoard::default();

    for incident in incidents {
        match incident.scope {
            Scope::Network => board.network.push(incident.clone()),
            Scope::Line => board.line.push(incident.clone()),
            Scope::Station => board.station.push(incident.clone()),
        }
    }

    board.network.sort_by_key(|i| i.severity.rank());
    board.line.sort_by_key(|i| i.severity.rank());
    board.station.sort_by_key(|i| i.severity.rank());

    board
}

/// The single worst incident network-wide: minimum severity rank, first one
/// wins on ties. Used for the summary banner.
pub fn worst_incident(incidents: &[Incident]) -> Option<&Incident> {
    incidents.iter().fold(None, |worst, current| match worst {
        None => Some(current),
        Some(best) if current.severity.rank() < best.severity.rank() => Some(current),
        other => other,
    })
}

/// Line tally for the status page stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub ok: usize,
    pub delayed: usize,
    pub down: usize,
}

pub fn summarize_lines(lines: &[Line]) -> StatusSummary {
    StatusSummary {
        total: lines.len(),
        ok: lines.iter().filter(|l| l.status == LineStatus::Ok).count(),
        delayed: lines
            .iter()
            .filter(|l| l.status == LineStatus::Delayed)
            .count(),
        down: lines
            .iter()
            .filter(|l| l.status == LineStatus::Down)
            .count(),
    }
}

/// Overall network health derived from line statuses alone: DOWN if any
/// line is down, else DELAYED if any is delayed, else OK. Independent of
/// the incident summary displayed next to it.
pub fn network_health(lines: &[Line]) -> LineStatus {
    if lines.iter().any(|l| l.status == LineStatus::Down) {
        LineStatus::Down
    } else if lines.iter().any(|l| l.status == LineStatus::Delayed) {
        LineStatus::Delayed
    } else {
        LineStatus::Ok
    }
}

/// Active incident count per line id, for the per-line badge.
pub fn incidents_by_line(incidents: &[Incident]) -> HashMap<i64, usize> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for incident in incidents {
        if incident.active {
            if let Some(line_id) = incident.line_id {
                *counts.entry(line_id).or_default() += 1;
            }
        }
    }
    counts
}

/// First `limit` incidents in arrival order, for the header alert strip.
pub fn alert_preview(incidents: &[Incident], limit: usize) -> &[Incident] {
    &incidents[..incidents.len().min(limit)]
}

/// Arrivals belonging to one line, capped to `limit`, in feed order. A
/// station's arrival feed mixes every line serving it; the per-line card
/// shows only its own.
pub fn line_arrivals_preview(
    arrivals: &[NextArrival],
    line_id: i64,
    limit: usize,
) -> Vec<NextArrival> {
    arrivals
        .iter()
        .filter(|a| a.line_id == line_id)
        .take(limit)
        .cloned()
        .collect()
}
