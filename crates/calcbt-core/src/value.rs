use std::fmt;

/// A single cell in a [`BarLayer`](https://docs.rs/calcbt-bar): the tagged
/// union of value kinds a lattice field can hold. Genesis fields normally
/// carry `Float64`/`Int64`, window/cross-sectional reductions normally carry
/// `Float64` or `Rank`, and `String` exists for non-numeric genesis data
/// (e.g. a symbol tag) that a strategy wants to round-trip through the
/// lattice without computing on it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// No value was produced for this (bar, asset, field) — e.g. a window
    /// reduction short of enough history, or an asset absent this bar.
    Missing,
    Float64(f64),
    Int64(i64),
    String(String),
    /// 1-based rank within a cross-sectional field; 1 is the largest value.
    Rank(u32),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Coerce to `f64` for use in a numeric reduction. `Missing`/`String`
    /// have no numeric interpretation and yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float64(v) => Some(*v),
            CellValue::Int64(v) => Some(*v as f64),
            CellValue::Rank(v) => Some(*v as f64),
            CellValue::Missing | CellValue::String(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => write!(f, "NA"),
            CellValue::Float64(v) => write!(f, "{}", v),
            CellValue::Int64(v) => write!(f, "{}", v),
            CellValue::String(v) => write!(f, "{}", v),
            CellValue::Rank(v) => write!(f, "#{}", v),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float64(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int64(v)
    }
}
