use std::fmt::Write;

use serde_json::Value;

use crate::models::{ForecastRow, Horizon, HorizonBounds, HorizonUnit};
use crate::render::table::HEADERS;

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#262730}\
hr{border:none;border-top:1px solid #e6e6e6;margin:1.5rem 0}\
.info{background:#e8f4fd;padding:.75rem 1rem;border-radius:.5rem}\
.error{background:#fdecea;color:#7d1a12;padding:.75rem 1rem;border-radius:.5rem}\
.table-wrap{max-height:400px;overflow:auto;border:1px solid #e6e6e6}\
table{border-collapse:collapse;width:100%}th,td{padding:.25rem .75rem;text-align:right;border-bottom:1px solid #f0f0f0}\
th:first-child,td:first-child{text-align:left}\
#loading{display:none;font-style:italic}\
.download{display:inline-block;margin-top:1rem;padding:.5rem 1rem;border:1px solid #ccc;border-radius:.5rem;text-decoration:none;color:inherit}";

/// Everything the dashboard page shows once a run succeeded.
pub struct DashboardView<'a> {
    pub title: &'a str,
    pub bounds: HorizonBounds,
    pub horizon: Horizon,
    pub figure: &'a Value,
    pub rows: &'a [ForecastRow],
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn head(title: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head><body>",
        escape_html(title)
    )
}

fn intro(title: &str, unit: HorizonUnit) -> String {
    let granularity = match unit {
        HorizonUnit::Months => "a monthly",
        HorizonUnit::Days => "a daily",
    };
    format!(
        "<h1>{}</h1><p>This app retrieves historical financial data from the warehouse and generates {granularity} forecast.</p><hr>",
        escape_html(title)
    )
}

/// Slider that reloads the page with the new horizon and shows the wait indicator meanwhile.
fn controls(bounds: &HorizonBounds, current: u32) -> String {
    format!(
        "<h2>Select Forecast Period</h2>\
<form method=\"get\" action=\"/\" id=\"horizon-form\">\
<label for=\"horizon\">Select number of {unit} to forecast:</label> \
<output id=\"horizon-value\">{current}</output><br>\
<input type=\"range\" id=\"horizon\" name=\"horizon\" min=\"{min}\" max=\"{max}\" value=\"{current}\" \
oninput=\"document.getElementById('horizon-value').textContent=this.value\" \
onchange=\"document.getElementById('loading').style.display='block';this.form.submit()\">\
</form>\
<p id=\"loading\">Connecting to the warehouse and fetching data...</p>",
        unit = bounds.unit,
        min = bounds.min,
        max = bounds.max,
    )
}

fn horizon_info(horizon: Horizon) -> String {
    match horizon {
        Horizon::Months(n) => format!(
            "<p class=\"info\">Forecasting for the next <strong>{n}</strong> months (approximately {} days).</p>",
            horizon.days()
        ),
        Horizon::Days(n) => format!("<p class=\"info\">Forecasting for the next <strong>{n}</strong> days.</p>"),
    }
}

fn table_html(rows: &[ForecastRow]) -> String {
    let mut html = String::from("<div class=\"table-wrap\"><table><thead><tr>");
    for h in HEADERS {
        let _ = write!(html, "<th>{h}</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for r in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>",
            escape_html(&r.date),
            r.predicted,
            r.lower_bound,
            r.upper_bound
        );
    }
    html.push_str("</tbody></table></div>");
    html
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let label = view.horizon.label();
    let count = view.horizon.count();
    // Figure JSON holds dates, numbers and fixed labels; "</" is still escaped for the script block.
    let figure = view.figure.to_string().replace("</", "<\\/");

    let mut html = head(view.title);
    html.push_str(&intro(view.title, view.bounds.unit));
    html.push_str(&controls(&view.bounds, count));
    html.push_str(&horizon_info(view.horizon));
    html.push_str("<hr>");
    let _ = write!(
        html,
        "<h2>{label} Revenue Forecast</h2>\
<div id=\"chart\" style=\"width:100%;height:480px\"></div>\
<script src=\"{PLOTLY_SRC}\"></script>\
<script>const fig={figure};Plotly.newPlot('chart',fig.data,fig.layout,{{responsive:true}});</script>"
    );
    html.push_str("<hr><h2>Forecast Data Table</h2>");
    html.push_str(&table_html(view.rows));
    let _ = write!(
        html,
        "<a class=\"download\" id=\"download\" href=\"/forecast.csv?horizon={count}\" download=\"{}\">Download {label} Forecast CSV</a>",
        view.horizon.csv_filename()
    );
    html.push_str("</body></html>");
    html
}

/// Terminal error state: only the message, no chart, table or download control.
pub fn render_error(title: &str, bounds: &HorizonBounds, message: &str) -> String {
    let mut html = head(title);
    html.push_str(&intro(title, bounds.unit));
    let _ = write!(html, "<p class=\"error\" id=\"error\">{}</p>", escape_html(message));
    html.push_str("</body></html>");
    html
}
