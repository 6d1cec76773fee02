//! calcbt-util
//!
//! Small, self-contained utilities layered on top of a running
//! [`calcbt_strategy::Strategy`]: crossover/crossunder helpers for building
//! signal logic out of window-field histories, and a JSON export of the
//! full lattice history for offline inspection.

mod crossings;
mod dump_json;

pub use crossings::{crossover, crossunder};
pub use dump_json::dump_json;
