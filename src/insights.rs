//! Summary statistics over a filtered crash set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo_utils::coordinate_key;
use crate::{CrashRecord, GeoPoint};

/// A group of crashes at (approximately) the same location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLocation {
    /// Mean position of the group
    pub position: GeoPoint,
    pub count: u32,
    /// Address guess of the most recent record in the group
    pub sample_address: String,
    /// Id of the most recent record in the group
    pub sample_id: String,
}

/// Group records by position rounded to 4 decimals (~11 m) and return the
/// `n` largest groups.
///
/// Ties in count keep the order in which groups first appeared.
pub fn group_top_locations(records: &[CrashRecord], n: usize) -> Vec<TopLocation> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<TopLocation> = Vec::new();

    for record in records {
        let key = coordinate_key(&record.position, 4);
        match index.get(&key) {
            Some(&i) => {
                let g = &mut groups[i];
                let n = g.count as f64;
                g.position = GeoPoint::new(
                    (g.position.latitude * n + record.position.latitude) / (n + 1.0),
                    (g.position.longitude * n + record.position.longitude) / (n + 1.0),
                );
                g.count += 1;
                g.sample_address.clone_from(&record.address_guess);
                g.sample_id.clone_from(&record.id);
            }
            None => {
                index.insert(key, groups.len());
                groups.push(TopLocation {
                    position: record.position,
                    count: 1,
                    sample_address: record.address_guess.clone(),
                    sample_id: record.id.clone(),
                });
            }
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(n);
    groups
}

/// Headline numbers for the insights panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSummary {
    pub total: usize,
    pub fatal: usize,
    /// Sum of injury counts
    pub injuries: u64,
    /// Hour with the most crashes; the earliest hour wins a tie. `None` when
    /// no record has a known hour.
    pub peak_hour: Option<u32>,
    pub top_locations: Vec<TopLocation>,
}

impl InsightSummary {
    /// Peak hour as `"8:00"` or `"19:00"` (no zero padding), or `"N/A"`.
    pub fn peak_hour_label(&self) -> String {
        match self.peak_hour {
            Some(h) => format!("{}:00", h),
            None => "N/A".to_string(),
        }
    }
}

/// Crash count per hour of day. Records without an hour are not counted.
pub fn hourly_counts(records: &[CrashRecord]) -> [u32; 24] {
    let mut counts = [0u32; 24];
    for hour in records.iter().filter_map(|r| r.hour) {
        if let Some(c) = counts.get_mut(hour as usize) {
            *c += 1;
        }
    }
    counts
}

/// Summarize a record set, keeping the `top_n` largest location groups.
pub fn summarize(records: &[CrashRecord], top_n: usize) -> InsightSummary {
    let counts = hourly_counts(records);
    let max = counts.iter().copied().max().unwrap_or(0);
    let peak_hour = (max > 0)
        .then(|| counts.iter().position(|&c| c == max))
        .flatten()
        .map(|h| h as u32);

    InsightSummary {
        total: records.len(),
        fatal: records.iter().filter(|r| r.is_fatal()).count(),
        injuries: records.iter().map(|r| r.injury_count as u64).sum(),
        peak_hour,
        top_locations: group_top_locations(records, top_n),
    }
}
