//! calcbt-lattice
//!
//! `CalcLattice`: the rolling-window storage and dependency-graph
//! propagation engine. Fields are registered before the first bar (`tree`,
//! not general DAG — each non-genesis field has exactly one upstream), then
//! frozen; every subsequent `new_bar` call does a depth-first propagation
//! from each genesis value through its window/cross-sectional dependents,
//! with cross-sectional fields gated to fire exactly once per bar.

mod error;
mod lattice;
mod retention;

pub use error::LatticeError;
pub use lattice::CalcLattice;
pub use retention::Retention;
