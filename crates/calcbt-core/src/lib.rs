//! calcbt-core
//!
//! Identifier and value primitives shared by every other crate in the
//! workspace: opaque asset/field/order identifiers and the tagged cell
//! value that every retained bar is built from. No IO, no time, no
//! allocation beyond `String`/`Vec` — this crate is the leaf of the
//! dependency graph.

mod ids;
mod value;

pub use ids::{AssetId, FieldId, OrderId};
pub use value::CellValue;
