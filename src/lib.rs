//! Solar generation forecast service.
//!
//! Aligns generation and irradiation history on shared timestamps and rolls a
//! trained regression model forward hour by hour, feeding every prediction
//! back in as the next hour's generation.

pub mod api;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod ml;
pub mod state;
pub mod telemetry;
