//! calcbt-fields
//!
//! The field-operation taxonomy: a flat tagged union of genesis / window /
//! cross-sectional operations, plus the concrete reductions each family
//! supports. No dispatch machinery beyond a `match` — `calcbt-lattice` owns
//! the graph and the propagation order, this crate only owns "what a field
//! computes given its inputs".

mod cross_sectional;
mod op;
mod window;

pub use cross_sectional::CrossSectionalReduction;
pub use op::FieldOperation;
pub use window::WindowReduction;
