use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::HorizonParams;
use crate::pipeline::{source_error_message, Controller, PipelineError};
use crate::render::{self, DashboardView};

/// The whole page. Each request re-runs fetch -> forecast -> present.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<HorizonParams>,
) -> Result<Response, AppError> {
    let bounds = state.dashboard.bounds();
    let horizon = bounds.resolve(params.horizon.as_deref());

    let mut controller = Controller::new();
    let run = match controller.run(&state.pipeline, horizon).await {
        Ok(run) => run,
        Err(PipelineError::Source(e)) => {
            tracing::warn!(state = ?controller.state(), "Dashboard halted on fetch failure");
            let message = source_error_message(state.pipeline.table(), &e);
            let html = render::render_error(&state.dashboard.title, &bounds, &message);
            return Ok((StatusCode::SERVICE_UNAVAILABLE, Html(html)).into_response());
        }
        Err(other) => return Err(other.into()),
    };

    let figure = render::build_figure(&run.history, &run.forecast, horizon, state.dashboard.band_scope);
    let rows = render::tail_rows(run.future(), horizon.days());
    let html = render::render_dashboard(&DashboardView {
        title: &state.dashboard.title,
        bounds,
        horizon,
        figure: &figure,
        rows: &rows,
    });

    Ok(Html(html).into_response())
}
