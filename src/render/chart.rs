use serde_json::{json, Value};

use crate::models::{BandScope, ForecastPoint, HistoricalPoint, Horizon};

const DATE_FMT: &str = "%Y-%m-%d";

/// Builds the Plotly figure: historical line, forecast line, and the uncertainty
/// band as two zero-width traces with the lower one filled up to the upper one.
pub fn build_figure(
    history: &[HistoricalPoint],
    forecast: &[ForecastPoint],
    horizon: Horizon,
    band_scope: BandScope,
) -> Value {
    let band = match band_scope {
        BandScope::Future => &forecast[forecast.len().saturating_sub(horizon.days())..],
        BandScope::Full => forecast,
    };
    let band_x: Vec<String> = band.iter().map(|p| p.ds.format(DATE_FMT).to_string()).collect();

    json!({
        "data": [
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Historical Revenue",
                "x": history.iter().map(|p| p.ds.format(DATE_FMT).to_string()).collect::<Vec<_>>(),
                "y": history.iter().map(|p| p.y).collect::<Vec<_>>(),
                "line": { "color": "royalblue", "width": 2 },
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Forecast",
                "x": forecast.iter().map(|p| p.ds.format(DATE_FMT).to_string()).collect::<Vec<_>>(),
                "y": forecast.iter().map(|p| p.yhat).collect::<Vec<_>>(),
                "line": { "color": "deepskyblue", "width": 2 },
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Upper Bound",
                "x": band_x,
                "y": band.iter().map(|p| p.yhat_upper).collect::<Vec<_>>(),
                "line": { "width": 0 },
                "showlegend": false,
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Lower Bound",
                "x": band_x,
                "y": band.iter().map(|p| p.yhat_lower).collect::<Vec<_>>(),
                "line": { "width": 0 },
                "fill": "tonexty",
                "fillcolor": "rgba(135, 206, 250, 0.3)",
                "showlegend": false,
            },
        ],
        "layout": {
            "title": { "text": format!("Revenue Forecast ({}) with Confidence Interval", horizon.title_label()) },
            "xaxis": { "title": { "text": "Date" } },
            "yaxis": { "title": { "text": "Revenue" } },
            "legend": { "x": 0.01, "y": 0.98 },
        },
    })
}
