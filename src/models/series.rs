use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation of the historical series, with canonical column names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub ds: NaiveDate,
    pub y: f64,
}

impl HistoricalPoint {
    pub fn new(ds: NaiveDate, y: f64) -> Self {
        Self { ds, y }
    }
}

impl From<(NaiveDate, f64)> for HistoricalPoint {
    fn from((ds, y): (NaiveDate, f64)) -> Self {
        Self::new(ds, y)
    }
}
