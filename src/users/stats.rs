//! Status breakdown, average age and most common cities.

use crate::query::{Accumulator, GroupSpec, SortSpec, as_f64};
use bson::{Bson, Document as BsonDocument};
use serde::Serialize;

pub const DEFAULT_TOP_CITIES: usize = 5;

/// Serialized as `{status, count, avgAge}`; the group key is named, not sent as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStat {
    pub status: String,
    pub count: u64,
    pub avg_age: f64,
}

/// Serialized as `{city, count}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityStat {
    pub city: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub average_age: f64,
    pub status_stats: Vec<StatusStat>,
    pub top_cities: Vec<CityStat>,
}

/// Per-status count and mean age, ordered by status.
#[must_use]
pub fn status_groups() -> GroupSpec {
    GroupSpec::by("status")
        .with("count", Accumulator::Count)
        .with("avgAge", Accumulator::Avg("age".into()))
        .sorted(vec![SortSpec::asc("_id")])
}

/// Most populated cities, largest first; ties keep first-seen order.
#[must_use]
pub fn city_groups(top: usize) -> GroupSpec {
    GroupSpec::by("address.city")
        .with("count", Accumulator::Count)
        .sorted(vec![SortSpec::desc("count")])
        .limit(top)
}

/// Rounds to one decimal, halves away from zero.
#[must_use]
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn key_string(v: Option<&Bson>) -> String {
    match v {
        Some(Bson::String(s)) => s.clone(),
        None | Some(Bson::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

fn count_of(d: &BsonDocument) -> u64 {
    d.get("count").and_then(as_f64).map_or(0, |n| if n > 0.0 { n as u64 } else { 0 })
}

impl UserStats {
    /// Merges the two grouping results.
    ///
    /// `averageAge` is the mean of the per-status means, not the mean over all users; see
    /// [`UserStats::weighted_average_age`] for the latter.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_groups(status_rows: &[BsonDocument], city_rows: &[BsonDocument]) -> Self {
        let status_stats: Vec<StatusStat> = status_rows
            .iter()
            .map(|d| StatusStat {
                status: key_string(d.get("_id")),
                count: count_of(d),
                avg_age: d.get("avgAge").and_then(as_f64).unwrap_or(0.0),
            })
            .collect();
        let top_cities = city_rows
            .iter()
            .map(|d| CityStat { city: key_string(d.get("_id")), count: count_of(d) })
            .collect();
        let total_users = status_stats.iter().map(|s| s.count).sum();
        let average_age = if status_stats.is_empty() {
            0.0
        } else {
            round1(status_stats.iter().map(|s| s.avg_age).sum::<f64>() / status_stats.len() as f64)
        };
        Self { total_users, average_age, status_stats, top_cities }
    }

    /// Mean age over all users, rounded like `average_age`. Zero for an empty set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weighted_average_age(&self) -> f64 {
        if self.total_users == 0 {
            return 0.0;
        }
        let sum: f64 = self.status_stats.iter().map(|s| s.avg_age * s.count as f64).sum();
        round1(sum / self.total_users as f64)
    }
}
