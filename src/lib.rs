//! Fetches Danish electricity balance data from the Energi Data Service API
//! and draws the generation mix against consumption as a stacked-area chart.
//!
//! The two halves are independent and invoked one after the other:
//! [`load_power_data`] returns an [`HourlyTable`] summed across price areas,
//! and [`plot::render`] / [`plot::render_to_file`] draw a selection of its
//! columns.

pub mod error;
pub mod loader;
pub mod observability;
pub mod palette;
pub mod plot;
pub mod table;

pub use error::{LoadError, PlotError};
pub use loader::{load_power_data, EnergyDataClient};
pub use plot::{render, render_to_file, PlotSpec, PlotStyle};
pub use table::HourlyTable;
