use crate::models::{ForecastPoint, ForecastRow};

pub const HEADERS: [&str; 4] = ["Date", "Predicted Revenue", "Lower Bound", "Upper Bound"];

/// Table rows for the last `horizon_days` forecast points only.
pub fn tail_rows(forecast: &[ForecastPoint], horizon_days: usize) -> Vec<ForecastRow> {
    forecast[forecast.len().saturating_sub(horizon_days)..]
        .iter()
        .map(|p| ForecastRow {
            date: p.ds.format("%b %d, %Y").to_string(),
            predicted: p.yhat,
            lower_bound: p.yhat_lower,
            upper_bound: p.yhat_upper,
        })
        .collect()
}

/// UTF-8 CSV with a header row.
pub fn to_csv(rows: &[ForecastRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn forecast(n: usize) -> Vec<ForecastPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| ForecastPoint {
                ds: start + chrono::Duration::days(i as i64),
                yhat: 100.0 + i as f64 * 1.25,
                yhat_lower: 90.0 + i as f64,
                yhat_upper: 110.5 + i as f64 * 1.5,
            })
            .collect()
    }

    #[test]
    fn test_tail_rows_are_last_n() {
        let points = forecast(10);
        let rows = tail_rows(&points, 3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].predicted, points[7].yhat);
        assert_eq!(rows[2].upper_bound, points[9].yhat_upper);
        assert_eq!(rows[0].date, "Jan 08, 2024");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let rows = tail_rows(&forecast(5), 2);
        let csv = String::from_utf8(to_csv(&rows).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Predicted Revenue,Lower Bound,Upper Bound"));
        assert_eq!(lines.next(), Some("\"Jan 04, 2024\",103.75,93.0,115.0"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_csv_round_trips_to_table() {
        let rows = tail_rows(&forecast(40), 25);
        let bytes = to_csv(&rows).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADERS);

        let parsed: Vec<ForecastRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_empty_csv_still_has_header() {
        let csv = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv, "Date,Predicted Revenue,Lower Bound,Upper Bound\n");
    }
}
