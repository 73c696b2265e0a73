pub mod forecast;
pub mod horizon;
pub mod series;

pub use forecast::{ForecastPoint, ForecastResponse, ForecastRow, HorizonParams};
pub use horizon::{BandScope, Horizon, HorizonBounds, HorizonUnit};
pub use series::HistoricalPoint;
