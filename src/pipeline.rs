//! One page run: fetch -> forecast. Every request drives a fresh controller
//! through the whole pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::cache::{Series, SeriesCache};
use crate::db::{SeriesSource, SourceError};
use crate::ml::{ForecastEngine, ForecastError};
use crate::models::{ForecastPoint, Horizon};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error("forecast task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("controller halted after an earlier failure; reload to retry")]
    Halted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Loading,
    Error(String),
    Rendered,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub horizon: Horizon,
    pub history: Series,
    pub forecast: Vec<ForecastPoint>,
}

impl ForecastRun {
    /// Future-dated suffix of the forecast.
    pub fn future(&self) -> &[ForecastPoint] {
        &self.forecast[self.history.len()..]
    }
}

pub struct Pipeline {
    source: Arc<dyn SeriesSource>,
    cache: SeriesCache,
    engine: ForecastEngine,
}

impl Pipeline {
    pub fn new(source: Arc<dyn SeriesSource>, cache: SeriesCache, engine: ForecastEngine) -> Self {
        Self { source, cache, engine }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn table(&self) -> &str {
        self.source.table()
    }

    pub async fn run(&self, horizon: Horizon) -> Result<ForecastRun, PipelineError> {
        let history = self.cache.get_or_fetch(self.source.as_ref()).await?;

        let forecast_days = horizon.days();
        let engine = self.engine.clone();
        let series = history.clone();
        let started = Instant::now();
        let forecast =
            tokio::task::spawn_blocking(move || engine.forecast(&series, forecast_days)).await??;

        info!(
            rows = history.len(),
            forecast_days,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated forecast"
        );

        Ok(ForecastRun { horizon, history, forecast })
    }
}

/// Page state machine: Idle -> Loading -> Rendered | Error. Error is terminal.
#[derive(Debug)]
pub struct Controller {
    state: ControllerState,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self { state: ControllerState::Idle }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    fn begin(&mut self) -> Result<(), PipelineError> {
        if let ControllerState::Error(_) = self.state {
            return Err(PipelineError::Halted);
        }
        debug!(from = ?self.state, "Controller loading");
        self.state = ControllerState::Loading;
        Ok(())
    }

    pub async fn run(&mut self, pipeline: &Pipeline, horizon: Horizon) -> Result<ForecastRun, PipelineError> {
        self.begin()?;
        match pipeline.run(horizon).await {
            Ok(run) => {
                self.state = ControllerState::Rendered;
                debug!("Controller rendered");
                Ok(run)
            }
            Err(e) => {
                error!(error = %e, "Pipeline run failed");
                self.state = ControllerState::Error(e.to_string());
                Err(e)
            }
        }
    }
}

/// User-facing message for a fetch failure, including the raw driver text.
pub fn source_error_message(table: &str, err: &SourceError) -> String {
    format!(
        "Error connecting to the warehouse or fetching data. Please check your credentials and ensure the '{table}' table exists. Error: {err}"
    )
}
