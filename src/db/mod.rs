pub mod series;

pub use series::{SeriesSource, SourceError, WarehouseSource};

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::cache::CacheKey;
    use crate::models::HistoricalPoint;

    /// In-memory source standing in for the warehouse.
    pub(crate) struct StaticSource {
        points: Vec<HistoricalPoint>,
        rows: Option<Vec<(NaiveDate, f64)>>,
        failure: Option<String>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        pub(crate) fn new(points: Vec<HistoricalPoint>) -> Self {
            Self { points, rows: None, failure: None, calls: AtomicUsize::new(0) }
        }

        /// Raw query rows, normalized on fetch like the warehouse does.
        pub(crate) fn from_rows(rows: Vec<(NaiveDate, f64)>) -> Self {
            Self { rows: Some(rows), ..Self::new(Vec::new()) }
        }

        /// Daily series with trend and a weekly cycle.
        pub(crate) fn linear(n: usize) -> Self {
            Self::new(sample_series(n))
        }

        pub(crate) fn failing(reason: &str) -> Self {
            Self { failure: Some(reason.into()), ..Self::new(Vec::new()) }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn sample_series(n: usize) -> Vec<HistoricalPoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let weekly = [0.0, 4.0, 6.0, 5.0, 3.0, -8.0, -10.0][i % 7];
                let noise = ((i * 37) % 11) as f64 * 0.3;
                HistoricalPoint::new(
                    start + chrono::Duration::days(i as i64),
                    1000.0 + i as f64 * 2.5 + weekly + noise,
                )
            })
            .collect()
    }

    #[async_trait]
    impl SeriesSource for StaticSource {
        fn table(&self) -> &str {
            "financial_data"
        }

        fn cache_key(&self) -> CacheKey {
            CacheKey { identity: "static".into(), query: "SELECT ds, y".into() }
        }

        async fn fetch_series(&self) -> Result<Vec<HistoricalPoint>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(reason) => Err(SourceError::Connect(sqlx::Error::Protocol(reason.clone()))),
                None => match &self.rows {
                    Some(rows) => series::normalize(rows.clone()),
                    None => Ok(self.points.clone()),
                },
            }
        }
    }
}
