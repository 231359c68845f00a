use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};

use crate::{
    db::PredictionStore,
    error::{AppError, AppResult},
    models::{
        CategoryCount, CategoryCounts, DailyCounts, DailyHeatmap, DailyMatrix, Dashboard,
        Vocabulary,
    },
};

/// Default size of the trailing window, in days
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Default number of categories in the dashboard ranking
pub const DEFAULT_TOP_K: usize = 3;

/// Sorts counts by count descending, then label ascending, and keeps `k`
pub fn rank(counts: CategoryCounts, k: usize) -> Vec<CategoryCount> {
    let mut ranked: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(k);
    ranked
}

/// Every date in `[start, end]`, each mapped to the stored counts or to an
/// empty mapping
pub fn zero_fill_dates(start: NaiveDate, end: NaiveDate, mut counts: DailyCounts) -> DailyMatrix {
    let mut days = BTreeMap::new();
    for date in start.iter_days().take_while(|date| *date <= end) {
        days.insert(date, counts.remove(&date).unwrap_or_default());
    }
    DailyMatrix(days)
}

/// Aggregate views over the prediction log
#[derive(Clone)]
pub struct AnalyticsAggregator {
    store: Arc<dyn PredictionStore>,
    vocabulary: Arc<Vocabulary>,
    max_window_days: u32,
}

impl AnalyticsAggregator {
    pub fn new(
        store: Arc<dyn PredictionStore>,
        vocabulary: Arc<Vocabulary>,
        max_window_days: u32,
    ) -> Self {
        Self {
            store,
            vocabulary,
            max_window_days,
        }
    }

    /// Today's date in UTC
    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// The `k` most frequent categories over all time
    ///
    /// Ties are ordered by label ascending. An empty store gives an empty list.
    pub async fn top_k(&self, k: usize) -> AppResult<Vec<CategoryCount>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let counts = self.store.count_by_category().await?;
        Ok(rank(counts, k))
    }

    /// Per-day counts for the trailing `days` UTC dates ending today
    pub async fn daily_matrix(&self, days: u32) -> AppResult<DailyMatrix> {
        self.daily_matrix_at(days, Self::today()).await
    }

    pub async fn daily_matrix_at(&self, days: u32, today: NaiveDate) -> AppResult<DailyMatrix> {
        let (start, end) = self.window(days, today)?;
        let counts = self.store.count_by_category_per_day(start, end).await?;
        Ok(zero_fill_dates(start, end, counts))
    }

    /// Dense category × date table for heatmap views
    pub async fn daily_heatmap(&self, days: u32) -> AppResult<DailyHeatmap> {
        self.daily_heatmap_at(days, Self::today()).await
    }

    pub async fn daily_heatmap_at(&self, days: u32, today: NaiveDate) -> AppResult<DailyHeatmap> {
        let matrix = self.daily_matrix_at(days, today).await?;
        let dates = matrix.dates();

        let categories: Vec<String> = self
            .vocabulary
            .iter()
            .map(|category| category.as_str().to_string())
            .collect();

        let counts = categories
            .iter()
            .map(|category| {
                dates
                    .iter()
                    .map(|date| matrix.count(date, category))
                    .collect()
            })
            .collect();

        Ok(DailyHeatmap {
            categories,
            dates,
            counts,
        })
    }

    /// Top-K ranking and daily matrix in one payload
    pub async fn dashboard(&self, k: usize, days: u32) -> AppResult<Dashboard> {
        self.dashboard_at(k, days, Self::today()).await
    }

    pub async fn dashboard_at(&self, k: usize, days: u32, today: NaiveDate) -> AppResult<Dashboard> {
        let top = self.top_k(k).await?;
        let daily = self.daily_matrix_at(days, today).await?;
        Ok(Dashboard { top, daily })
    }

    /// `[today - (days - 1), today]`
    fn window(&self, days: u32, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
        if days == 0 {
            return Err(AppError::InvalidInput(
                "Window must cover at least one day".to_string(),
            ));
        }
        if days > self.max_window_days {
            return Err(AppError::InvalidInput(format!(
                "Window cannot exceed {} days",
                self.max_window_days
            )));
        }

        let start = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| AppError::InvalidInput("Window start is out of range".to_string()))?;

        Ok((start, today))
    }
}
