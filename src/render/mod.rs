//! Chart, table and page rendering. Pure presentation: no numeric changes beyond
//! column renaming and date formatting.

pub mod chart;
pub mod page;
pub mod table;

pub use chart::build_figure;
pub use page::{render_dashboard, render_error, DashboardView};
pub use table::{tail_rows, to_csv};
