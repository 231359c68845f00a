use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// One recorded classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionEvent {
    pub id: i64,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

/// Occurrence count per category label
pub type CategoryCounts = BTreeMap<String, i64>;

/// Raw per-day counts, holding only days that have events
pub type DailyCounts = BTreeMap<NaiveDate, CategoryCounts>;

/// A `(category, count)` entry of a top-K ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    #[serde(rename = "emotion")]
    pub category: String,
    pub count: i64,
}

impl CategoryCount {
    pub fn new(category: impl Into<String>, count: i64) -> Self {
        Self {
            category: category.into(),
            count,
        }
    }
}

/// Per-day category counts over a contiguous trailing window of UTC dates
///
/// Every date of the window is present; a category missing from a day counts
/// as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DailyMatrix(pub BTreeMap<NaiveDate, CategoryCounts>);

impl DailyMatrix {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&CategoryCounts> {
        self.0.get(date)
    }

    /// Dates of the window in ascending order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.0.keys().copied().collect()
    }

    /// Count for one category on one day
    pub fn count(&self, date: &NaiveDate, category: &str) -> i64 {
        self.0
            .get(date)
            .and_then(|counts| counts.get(category))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of every count in the window
    pub fn total(&self) -> i64 {
        self.0.values().flat_map(|counts| counts.values()).sum()
    }
}

/// Fully dense category × date table for heatmap views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyHeatmap {
    /// Row labels, in vocabulary order
    pub categories: Vec<String>,
    /// Column dates, ascending
    pub dates: Vec<NaiveDate>,
    /// `counts[row][column]`
    pub counts: Vec<Vec<i64>>,
}

/// Payload behind the dashboard view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    #[serde(rename = "top3")]
    pub top: Vec<CategoryCount>,
    pub daily: DailyMatrix,
}
