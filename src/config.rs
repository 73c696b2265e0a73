use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::models::{BandScope, HorizonBounds, HorizonUnit};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Warehouse credentials and the fixed series query.
/// The password never leaves this struct except through `connect_options`.
#[derive(Deserialize, Clone)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub account: String,
    pub user: String,
    pub password: String,
    pub host: String,
    #[serde(default = "default_warehouse_port")]
    pub port: u16,
    pub database: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Rows before this date are skipped. Unset means the whole table.
    #[serde(default)]
    pub min_date: Option<NaiveDate>,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
}

fn default_warehouse_port() -> u16 {
    5439
}
fn default_schema() -> String {
    "public".into()
}
fn default_table() -> String {
    "financial_data".into()
}
fn default_date_column() -> String {
    "ds".into()
}
fn default_value_column() -> String {
    "y".into()
}
fn default_sslmode() -> String {
    "prefer".into()
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("date_column", &self.date_column)
            .field("value_column", &self.value_column)
            .field("min_date", &self.min_date)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl WarehouseConfig {
    pub fn ssl_mode(&self) -> Result<PgSslMode, ConfigError> {
        self.sslmode
            .parse::<PgSslMode>()
            .map_err(|_| ConfigError::Invalid(format!("unknown sslmode '{}'", self.sslmode)))
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(self.ssl_mode()?)
            .application_name("revcast"))
    }

    /// Stable, non-secret identity of the credentials, used as part of cache keys.
    pub fn identity(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for part in [
            self.account.as_str(),
            self.user.as_str(),
            self.host.as_str(),
            self.port.to_string().as_str(),
            self.database.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(&hasher.finalize()[..16])
    }
}

#[derive(Deserialize, Clone)]
pub struct CacheConfig {
    /// Zero disables expiry; entries then live until invalidated.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Bearer key for `POST /api/v1/cache/invalidate`. Unset disables the route.
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("ttl_secs", &self.ttl_secs)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: default_ttl(), admin_key: None }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub unit: HorizonUnit,
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub default: Option<u32>,
    #[serde(default)]
    pub band_scope: BandScope,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "Financial Forecasting App".into()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            unit: HorizonUnit::default(),
            min: None,
            max: None,
            default: None,
            band_scope: BandScope::default(),
            title: default_title(),
        }
    }
}

impl DashboardConfig {
    /// Slider bounds with unit-dependent defaults filled in.
    pub fn bounds(&self) -> HorizonBounds {
        let (min, max, default) = match self.unit {
            HorizonUnit::Months => (1, 48, 36),
            HorizonUnit::Days => (30, 1000, 90),
        };
        HorizonBounds {
            unit: self.unit,
            min: self.min.unwrap_or(min),
            max: self.max.unwrap_or(max),
            default: self.default.unwrap_or(default),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_periods")]
    pub seasonal_periods: Vec<usize>,
    #[serde(default = "default_interval_level")]
    pub interval_level: f64,
    #[serde(default = "default_min_history")]
    pub min_history: usize,
}

fn default_periods() -> Vec<usize> {
    vec![7]
}
fn default_interval_level() -> f64 {
    0.80
}
fn default_min_history() -> usize {
    2
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasonal_periods: default_periods(),
            interval_level: default_interval_level(),
            min_history: default_min_history(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name("secrets").required(false))
            .add_source(config::Environment::with_prefix("REVCAST").separator("__"))
            .build()
            .map_err(ConfigError::from)?;

        let app_config: AppConfig = config.try_deserialize().map_err(ConfigError::from)?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.dashboard.bounds();
        if bounds.min < 1 {
            return Err(ConfigError::Invalid("dashboard.min must be at least 1".into()));
        }
        if !(bounds.min <= bounds.default && bounds.default <= bounds.max) {
            return Err(ConfigError::Invalid(format!(
                "dashboard bounds must satisfy min <= default <= max (got {} / {} / {})",
                bounds.min, bounds.default, bounds.max
            )));
        }

        let level = self.model.interval_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "model.interval_level must be in (0, 1), got {level}"
            )));
        }
        if self.model.min_history < 1 {
            return Err(ConfigError::Invalid("model.min_history must be at least 1".into()));
        }

        let w = &self.warehouse;
        for (name, value) in [
            ("warehouse.schema", &w.schema),
            ("warehouse.table", &w.table),
            ("warehouse.date_column", &w.date_column),
            ("warehouse.value_column", &w.value_column),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a plain SQL identifier, got '{value}'"
                )));
            }
        }
        w.ssl_mode()?;

        Ok(())
    }
}

/// ASCII letters, digits and underscores, not starting with a digit.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn warehouse() -> WarehouseConfig {
        WarehouseConfig {
            account: "acme".into(),
            user: "analyst".into(),
            password: "hunter2".into(),
            host: "warehouse.internal".into(),
            port: 5439,
            database: "finance".into(),
            schema: default_schema(),
            table: default_table(),
            date_column: default_date_column(),
            value_column: default_value_column(),
            min_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            sslmode: default_sslmode(),
        }
    }

    fn app_config() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            warehouse: warehouse(),
            cache: CacheConfig::default(),
            dashboard: DashboardConfig::default(),
            model: ModelConfig::default(),
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", warehouse());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_identity_ignores_password() {
        let a = warehouse();
        let mut b = warehouse();
        b.password = "rotated".into();
        assert_eq!(a.identity(), b.identity());

        b.database = "other".into();
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_bounds_defaults_per_unit() {
        let months = DashboardConfig::default().bounds();
        assert_eq!((months.min, months.max, months.default), (1, 48, 36));

        let days = DashboardConfig { unit: HorizonUnit::Days, ..Default::default() }.bounds();
        assert_eq!((days.min, days.max, days.default), (30, 1000, 90));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(app_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let mut config = app_config();
        config.dashboard.default = Some(60);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_injected_identifier() {
        let mut config = app_config();
        config.warehouse.table = "financial_data; DROP TABLE x".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_interval_level() {
        let mut config = app_config();
        config.model.interval_level = 1.5;
        assert!(config.validate().is_err());
    }

    fn from_toml(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [warehouse]
        user = "analyst"
        password = "hunter2"
        host = "warehouse.internal"
        database = "finance"
    "#;

    #[test]
    fn test_min_date_unset_reads_whole_table() {
        let config = from_toml(MINIMAL);
        assert_eq!(config.warehouse.min_date, None);
        assert_eq!(config.warehouse.port, 5439);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_date_from_file() {
        let config = from_toml(&format!("{MINIMAL}\nmin_date = \"2020-01-01\"\n"));
        assert_eq!(config.warehouse.min_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("financial_data"));
        assert!(is_identifier("_ds2"));
        assert!(!is_identifier("2ds"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }
}
