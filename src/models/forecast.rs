use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::HistoricalPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Presentation row of the forecast table and CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Predicted Revenue")]
    pub predicted: f64,
    #[serde(rename = "Lower Bound")]
    pub lower_bound: f64,
    #[serde(rename = "Upper Bound")]
    pub upper_bound: f64,
}

#[derive(Debug, Deserialize)]
pub struct HorizonParams {
    /// Kept as text so an unparsable value falls back to the default instead of a 400.
    pub horizon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub unit: super::HorizonUnit,
    pub horizon: u32,
    pub forecast_days: usize,
    pub history: Vec<HistoricalPoint>,
    pub forecast: Vec<ForecastPoint>,
    pub table: Vec<ForecastRow>,
}
