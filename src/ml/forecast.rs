//! Additive trend + seasonality forecasting using the `augurs` crate.
//! MSTL strips the seasonal cycles and AutoETS models the trend; with too little
//! history for any cycle the trend model runs alone.

use augurs::ets::AutoETS;
use augurs::mstl::MSTLModel;
use augurs::prelude::*;
use augurs::Forecast;
use chrono::Duration;
use tracing::debug;

use crate::config::ModelConfig;
use crate::models::{ForecastPoint, HistoricalPoint};

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("invalid forecast input: {0}")]
    InvalidInput(String),
    #[error("need at least {required} data points for forecasting, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("model error: {0}")]
    Model(String),
}

#[derive(Debug, Clone)]
pub struct ForecastEngine {
    seasonal_periods: Vec<usize>,
    interval_level: f64,
    min_history: usize,
}

impl ForecastEngine {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            seasonal_periods: config.seasonal_periods.clone(),
            interval_level: config.interval_level,
            min_history: config.min_history.max(1),
        }
    }

    /// Periods with at least two full cycles of history.
    fn usable_periods(&self, len: usize) -> Vec<usize> {
        self.seasonal_periods
            .iter()
            .copied()
            .filter(|&p| p > 1 && len >= 2 * p)
            .collect()
    }

    /// Fits on `history` and predicts every historical date plus `horizon_days`
    /// daily steps after the last one.
    pub fn forecast(
        &self,
        history: &[HistoricalPoint],
        horizon_days: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        if horizon_days == 0 {
            return Err(ForecastError::InvalidInput("horizon must be positive".into()));
        }
        if history.len() < self.min_history {
            return Err(ForecastError::InsufficientHistory {
                required: self.min_history,
                actual: history.len(),
            });
        }
        if history.windows(2).any(|w| w[0].ds >= w[1].ds) {
            return Err(ForecastError::InvalidInput(
                "history must be strictly increasing by date".into(),
            ));
        }

        let first = history[0].ds;
        let y = daily_grid(history);
        let periods = self.usable_periods(y.len());
        debug!(rows = history.len(), grid = y.len(), horizon_days, ?periods, "Fitting forecast model");

        let (in_sample, future) = if y.len() < ETS_MIN_POINTS {
            drift(&y, horizon_days)
        } else if periods.is_empty() {
            let model = AutoETS::non_seasonal()
                .fit(&y)
                .map_err(|e| ForecastError::Model(format!("ETS fit error: {e}")))?;
            let in_sample = model
                .predict_in_sample(self.interval_level)
                .map_err(|e| ForecastError::Model(format!("ETS predict error: {e}")))?;
            let future = model
                .predict(horizon_days, self.interval_level)
                .map_err(|e| ForecastError::Model(format!("ETS predict error: {e}")))?;
            (in_sample, future)
        } else {
            let trend_model = AutoETS::non_seasonal().into_trend_model();
            let model = MSTLModel::new(periods, trend_model)
                .fit(&y)
                .map_err(|e| ForecastError::Model(format!("MSTL fit error: {e}")))?;
            let in_sample = model
                .predict_in_sample(self.interval_level)
                .map_err(|e| ForecastError::Model(format!("MSTL predict error: {e}")))?;
            let future = model
                .predict(horizon_days, self.interval_level)
                .map_err(|e| ForecastError::Model(format!("MSTL predict error: {e}")))?;
            (in_sample, future)
        };

        let in_sample = bounded(in_sample, y.len())?;
        let future = bounded(future, horizon_days)?;

        let mut points = Vec::with_capacity(history.len() + horizon_days);
        for p in history {
            let (yhat, lo, hi) = in_sample[(p.ds - first).num_days() as usize];
            points.push(ForecastPoint { ds: p.ds, yhat, yhat_lower: lo, yhat_upper: hi });
        }

        let last = history[history.len() - 1].ds;
        for (i, (yhat, lo, hi)) in future.into_iter().enumerate() {
            points.push(ForecastPoint {
                ds: last + Duration::days(i as i64 + 1),
                yhat,
                yhat_lower: lo,
                yhat_upper: hi,
            });
        }

        Ok(points)
    }
}

/// AutoETS refuses shorter series.
const ETS_MIN_POINTS: usize = 8;

/// One value per calendar day from the first to the last observation, with
/// gaps filled by linear interpolation. Model steps are then days.
fn daily_grid(history: &[HistoricalPoint]) -> Vec<f64> {
    let mut grid = Vec::new();
    for w in history.windows(2) {
        let gap = (w[1].ds - w[0].ds).num_days();
        for k in 0..gap {
            grid.push(w[0].y + (w[1].y - w[0].y) * k as f64 / gap as f64);
        }
    }
    if let Some(last) = history.last() {
        grid.push(last.y);
    }
    grid
}

/// Straight line from the first to the last value, extended past the end.
/// Used when the series is too short for ETS; bounds come from the fallback.
fn drift(y: &[f64], horizon: usize) -> (Forecast, Forecast) {
    let n = y.len();
    let slope = if n > 1 { (y[n - 1] - y[0]) / (n - 1) as f64 } else { 0.0 };
    let at = |i: usize| y[0] + slope * i as f64;
    let in_sample = Forecast { point: (0..n).map(at).collect(), intervals: None };
    let future = Forecast { point: (n..n + horizon).map(at).collect(), intervals: None };
    (in_sample, future)
}

/// Flattens a model forecast into (point, lower, upper) triples with
/// `lower <= point <= upper`.
fn bounded(forecast: Forecast, expected: usize) -> Result<Vec<(f64, f64, f64)>, ForecastError> {
    let point = forecast.point;
    if point.len() != expected {
        return Err(ForecastError::Model(format!(
            "model returned {} values, expected {expected}",
            point.len()
        )));
    }

    let (lower, upper) = match forecast.intervals {
        Some(intervals) if intervals.lower.len() == expected && intervals.upper.len() == expected => {
            (intervals.lower, intervals.upper)
        }
        _ => {
            // Fallback: use +/- 15% as simple confidence intervals
            let lower = point.iter().map(|v| v * 0.85).collect();
            let upper = point.iter().map(|v| v * 1.15).collect();
            (lower, upper)
        }
    };

    point
        .into_iter()
        .zip(lower)
        .zip(upper)
        .map(|((p, lo), hi)| {
            if !(p.is_finite() && lo.is_finite() && hi.is_finite()) {
                return Err(ForecastError::Model("model produced non-finite values".into()));
            }
            Ok((p, lo.min(hi).min(p), hi.max(lo).max(p)))
        })
        .collect()
}
