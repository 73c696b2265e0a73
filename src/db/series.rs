use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use crate::cache::CacheKey;
use crate::config::WarehouseConfig;
use crate::models::HistoricalPoint;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{0}")]
    Connect(#[source] sqlx::Error),
    #[error("{0}")]
    Query(#[source] sqlx::Error),
    #[error("{0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("duplicate date {0} in series")]
    DuplicateDate(NaiveDate),
}

/// Something that can produce the historical series.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Table name shown to users when the fetch fails.
    fn table(&self) -> &str;

    fn cache_key(&self) -> CacheKey;

    async fn fetch_series(&self) -> Result<Vec<HistoricalPoint>, SourceError>;
}

/// The fixed two-column query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub schema: String,
    pub table: String,
    pub date_column: String,
    pub value_column: String,
    pub min_date: Option<NaiveDate>,
}

impl SeriesQuery {
    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self {
            schema: config.schema.clone(),
            table: config.table.clone(),
            date_column: config.date_column.clone(),
            value_column: config.value_column.clone(),
            min_date: config.min_date,
        }
    }

    /// Columns are projected positionally, so source casing never matters.
    /// Identifiers are validated at config load.
    pub fn sql(&self) -> String {
        let (ds, y) = (&self.date_column, &self.value_column);
        let mut sql = format!(
            "SELECT CAST({ds} AS DATE), CAST({y} AS DOUBLE PRECISION) FROM {}.{} WHERE {ds} IS NOT NULL AND {y} IS NOT NULL",
            self.schema, self.table
        );
        if self.min_date.is_some() {
            sql.push_str(&format!(" AND {ds} >= $1"));
        }
        sql.push_str(&format!(" ORDER BY {ds}"));
        sql
    }

    /// Query text with the bound filter inlined, for cache keys and logs.
    pub fn describe(&self) -> String {
        match self.min_date {
            Some(d) => format!("{} [$1 = {d}]", self.sql()),
            None => self.sql(),
        }
    }
}

pub struct SeriesRepo;

impl SeriesRepo {
    pub async fn fetch(
        conn: &mut PgConnection,
        query: &SeriesQuery,
    ) -> Result<Vec<(NaiveDate, f64)>, sqlx::Error> {
        let sql = query.sql();
        let mut q = sqlx::query_as::<_, (NaiveDate, f64)>(&sql);
        if let Some(min_date) = query.min_date {
            q = q.bind(min_date);
        }
        q.fetch_all(&mut *conn).await
    }
}

/// Sorts ascending and rejects duplicated dates. An empty result is passed
/// through; too little history is the forecaster's call.
pub fn normalize(rows: Vec<(NaiveDate, f64)>) -> Result<Vec<HistoricalPoint>, SourceError> {
    let mut points: Vec<HistoricalPoint> = rows.into_iter().map(HistoricalPoint::from).collect();
    points.sort_by_key(|p| p.ds);
    if let Some(w) = points.windows(2).find(|w| w[0].ds == w[1].ds) {
        return Err(SourceError::DuplicateDate(w[0].ds));
    }
    Ok(points)
}

/// Warehouse reached over the PostgreSQL wire protocol. Opens one connection
/// per fetch and closes it afterwards.
pub struct WarehouseSource {
    config: WarehouseConfig,
    query: SeriesQuery,
}

impl WarehouseSource {
    pub fn new(config: WarehouseConfig) -> Self {
        let query = SeriesQuery::from_config(&config);
        Self { config, query }
    }
}

#[async_trait]
impl SeriesSource for WarehouseSource {
    fn table(&self) -> &str {
        &self.query.table
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey {
            identity: self.config.identity(),
            query: self.query.describe(),
        }
    }

    async fn fetch_series(&self) -> Result<Vec<HistoricalPoint>, SourceError> {
        let options = self.config.connect_options()?;
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(SourceError::Connect)?;

        let rows = SeriesRepo::fetch(&mut conn, &self.query).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close warehouse connection");
        }

        let rows = rows.map_err(SourceError::Query)?;
        info!(
            account = %self.config.account,
            table = %self.query.table,
            rows = rows.len(),
            "Fetched historical series"
        );
        normalize(rows)
    }
}
