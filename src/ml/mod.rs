pub mod forecast;

pub use forecast::{ForecastEngine, ForecastError};
