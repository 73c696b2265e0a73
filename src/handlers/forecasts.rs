use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{ForecastResponse, HorizonParams};
use crate::pipeline::{Controller, ForecastRun};
use crate::render;

async fn run(state: &AppState, params: &HorizonParams) -> Result<ForecastRun, AppError> {
    let horizon = state.dashboard.bounds().resolve(params.horizon.as_deref());
    Controller::new()
        .run(&state.pipeline, horizon)
        .await
        .map_err(|e| AppError::from_pipeline(e, state.pipeline.table()))
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<HorizonParams>,
) -> Result<Json<ForecastResponse>, AppError> {
    let run = run(&state, &params).await?;
    let table = render::tail_rows(run.future(), run.horizon.days());

    Ok(Json(ForecastResponse {
        unit: run.horizon.unit(),
        horizon: run.horizon.count(),
        forecast_days: run.horizon.days(),
        history: run.history.to_vec(),
        forecast: run.forecast,
        table,
    }))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<HorizonParams>,
) -> Result<Response, AppError> {
    let run = run(&state, &params).await?;
    let rows = render::tail_rows(run.future(), run.horizon.days());
    let csv = render::to_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", run.horizon.csv_filename()),
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::db::tests::StaticSource;
    use crate::handlers::tests::{app, app_with, body_string, days_dashboard, send};
    use crate::models::ForecastRow;

    #[tokio::test]
    async fn test_csv_download() {
        let (router, _) = app_with(StaticSource::linear(90), days_dashboard());
        let response = send(router, "GET", "/forecast.csv?horizon=45").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=45_day_revenue_forecast.csv"
        );

        let body = body_string(response).await;
        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let rows: Vec<ForecastRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 45);
        assert!(rows.iter().all(|r| r.lower_bound <= r.predicted && r.predicted <= r.upper_bound));
    }

    #[tokio::test]
    async fn test_csv_matches_json_table() {
        let (router, _) = app_with(StaticSource::linear(90), days_dashboard());
        let csv_body = body_string(send(router.clone(), "GET", "/forecast.csv?horizon=30").await).await;
        let json_body = body_string(send(router, "GET", "/api/v1/forecast?horizon=30").await).await;

        let mut reader = csv::Reader::from_reader(csv_body.as_bytes());
        let from_csv: Vec<ForecastRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        let json: serde_json::Value = serde_json::from_str(&json_body).unwrap();
        let from_json: Vec<ForecastRow> = serde_json::from_value(json["table"].clone()).unwrap();

        assert_eq!(from_csv, from_json);
    }

    #[tokio::test]
    async fn test_json_forecast_shape() {
        let response = send(app(StaticSource::linear(100)), "GET", "/api/v1/forecast?horizon=3").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["unit"], "months");
        assert_eq!(json["horizon"], 3);
        assert_eq!(json["forecast_days"], 91);
        assert_eq!(json["history"].as_array().unwrap().len(), 100);
        assert_eq!(json["forecast"].as_array().unwrap().len(), 191);
        assert_eq!(json["table"].as_array().unwrap().len(), 91);
        assert_eq!(json["history"][0]["ds"], json["forecast"][0]["ds"]);
    }

    #[tokio::test]
    async fn test_csv_connection_failure() {
        let response = send(app(StaticSource::failing("role does not exist")), "GET", "/forecast.csv").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
        assert!(json["message"].as_str().unwrap().contains("role does not exist"));
    }
}
