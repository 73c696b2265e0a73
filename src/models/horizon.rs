use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonUnit {
    Days,
    #[default]
    Months,
}

impl std::fmt::Display for HorizonUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days => write!(f, "days"),
            Self::Months => write!(f, "months"),
        }
    }
}

/// Which part of the forecast the uncertainty band is drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandScope {
    Future,
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Days(u32),
    Months(u32),
}

impl Horizon {
    pub fn new(unit: HorizonUnit, count: u32) -> Self {
        match unit {
            HorizonUnit::Days => Self::Days(count),
            HorizonUnit::Months => Self::Months(count),
        }
    }

    pub fn unit(&self) -> HorizonUnit {
        match self {
            Self::Days(_) => HorizonUnit::Days,
            Self::Months(_) => HorizonUnit::Months,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            Self::Days(n) | Self::Months(n) => *n,
        }
    }

    /// Number of daily steps handed to the model. Months are converted with
    /// `floor(months * 30.44)` in exact integer arithmetic; there is no inverse.
    pub fn days(&self) -> usize {
        match self {
            Self::Days(n) => *n as usize,
            Self::Months(n) => (*n as u64 * 3044 / 100) as usize,
        }
    }

    /// "36-Month" / "90-Day", used in headers and button labels.
    pub fn label(&self) -> String {
        match self {
            Self::Days(n) => format!("{n}-Day"),
            Self::Months(n) => format!("{n}-Month"),
        }
    }

    /// "36 Months" / "90 Days", used in the chart title.
    pub fn title_label(&self) -> String {
        match self {
            Self::Days(n) => format!("{n} Days"),
            Self::Months(n) => format!("{n} Months"),
        }
    }

    pub fn csv_filename(&self) -> String {
        match self {
            Self::Days(n) => format!("{n}_day_revenue_forecast.csv"),
            Self::Months(n) => format!("{n}_month_revenue_forecast.csv"),
        }
    }
}

/// Slider bounds for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizonBounds {
    pub unit: HorizonUnit,
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl HorizonBounds {
    /// Reads the raw query value. Out-of-range values are clamped, anything
    /// unparsable falls back to the default.
    pub fn resolve(&self, raw: Option<&str>) -> Horizon {
        let count = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(|n| n.clamp(self.min as i64, self.max as i64) as u32)
            .unwrap_or(self.default);
        Horizon::new(self.unit, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 365.25 / 12
    const AVG_DAYS_PER_MONTH: f64 = 30.44;

    fn month_bounds() -> HorizonBounds {
        HorizonBounds { unit: HorizonUnit::Months, min: 1, max: 48, default: 36 }
    }

    #[test]
    fn test_months_to_days_matches_float_floor() {
        for m in 1..=48u32 {
            let expected = (m as f64 * AVG_DAYS_PER_MONTH).floor() as usize;
            assert_eq!(Horizon::Months(m).days(), expected, "months = {m}");
        }
        assert_eq!(Horizon::Months(36).days(), 1095);
        assert_eq!(Horizon::Months(1).days(), 30);
    }

    #[test]
    fn test_days_pass_through() {
        assert_eq!(Horizon::Days(90).days(), 90);
    }

    #[test]
    fn test_resolve_clamps() {
        let bounds = month_bounds();
        assert_eq!(bounds.resolve(Some("0")), Horizon::Months(1));
        assert_eq!(bounds.resolve(Some("-5")), Horizon::Months(1));
        assert_eq!(bounds.resolve(Some("100")), Horizon::Months(48));
        assert_eq!(bounds.resolve(Some(" 12 ")), Horizon::Months(12));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let bounds = month_bounds();
        assert_eq!(bounds.resolve(None), Horizon::Months(36));
        assert_eq!(bounds.resolve(Some("abc")), Horizon::Months(36));
        assert_eq!(bounds.resolve(Some("")), Horizon::Months(36));
    }

    #[test]
    fn test_labels_and_filename() {
        assert_eq!(Horizon::Months(36).label(), "36-Month");
        assert_eq!(Horizon::Months(36).csv_filename(), "36_month_revenue_forecast.csv");
        assert_eq!(Horizon::Days(90).label(), "90-Day");
        assert_eq!(Horizon::Days(90).csv_filename(), "90_day_revenue_forecast.csv");
        assert_eq!(Horizon::Days(90).title_label(), "90 Days");
    }
}
