//! calcbt-strategy
//!
//! The discrete-event strategy loop that ties the lattice, the order book,
//! the portfolio, and a set of per-asset data readers together: construct
//! from a [`Config`], then call [`Strategy::run`].

mod config;
mod error;
mod run_summary;
mod strategy;
mod verbosity;

pub use config::{Config, DataEventCallback, OrderEventCallback};
pub use error::StrategyError;
pub use run_summary::RunSummary;
pub use strategy::Strategy;
pub use verbosity::{format_log_line, Verbosity};
