//! Interchange index: which stations are served by more than one line.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::LineDetail;

/// Per-station interchange summary. Invariant: `count == line_codes.len()`,
/// and `line_codes` is sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterchangeEntry {
    pub count: usize,
    pub line_codes: Vec<String>,
}

impl InterchangeEntry {
    /// A station served by more than one distinct line.
    pub fn is_interchange(&self) -> bool {
        self.count > 1
    }
}

/// Builds the station-id → interchange summary map from a set of line
/// listings.
///
/// Each line registers its code against a station at most once, so a line
/// visiting the same station twice in its sequence does not double-count.
/// Code lists are sorted at the end, which makes the output independent of
/// the input line order.
pub fn build_interchange_index(lines: &[LineDetail]) -> HashMap<i64, InterchangeEntry> {
    let mut index: HashMap<i64, InterchangeEntry> = HashMap::new();

    for line in lines {
        for station in &line.stations {
            let entry = index.entry(station.id).or_insert_with(|| InterchangeEntry {
                count: 0,
                line_codes: Vec::new(),
            });
            if !entry.line_codes.iter().any(|code| code == &line.code) {
                entry.line_codes.push(line.code.clone());
                entry.count += 1;
            }
        }
    }

    for entry in index.values_mut() {
        entry.line_codes.sort();
    }

    index
}

/// Number of interchange stations in an index.
pub fn interchange_count(index: &HashMap<i64, InterchangeEntry>) -> usize {
    index.values().filter(|e| e.is_interchange()).count()
}
