use calcbt_core::{AssetId, FieldId};
use std::fmt;

/// Error kinds a `CalcLattice` can raise. All are fatal to the caller's
/// backtest — none describe a retryable condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LatticeError {
    /// `add_field` was called with an id already registered.
    DuplicateField { field_id: FieldId },
    /// `add_field`/`add_fields` was called after the first `new_bar`.
    FieldAfterStart { field_id: FieldId },
    /// A non-genesis field named an `upstream` that has not been
    /// registered yet (registration order is the implied topological
    /// order).
    UnknownUpstream { field_id: FieldId, upstream: FieldId },
    /// `new_bar`'s input omitted an asset the lattice was constructed with.
    MissingAsset { asset_id: AssetId },
    /// `new_bar`'s input omitted a genesis field for an asset present in
    /// the input.
    MissingGenesisField { asset_id: AssetId, field_id: FieldId },
    /// A `data` accessor was called with an out-of-range `ago`.
    AgoOutOfRange { ago: i64 },
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatticeError::DuplicateField { field_id } => {
                write!(f, "field '{}' is already registered", field_id)
            }
            LatticeError::FieldAfterStart { field_id } => write!(
                f,
                "cannot add field '{}': the field set is frozen after the first bar",
                field_id
            ),
            LatticeError::UnknownUpstream { field_id, upstream } => write!(
                f,
                "field '{}' names upstream '{}' which has not been registered yet",
                field_id, upstream
            ),
            LatticeError::MissingAsset { asset_id } => {
                write!(f, "new_bar input is missing asset '{}'", asset_id)
            }
            LatticeError::MissingGenesisField { asset_id, field_id } => write!(
                f,
                "new_bar input is missing genesis field '{}' for asset '{}'",
                field_id, asset_id
            ),
            LatticeError::AgoOutOfRange { ago } => {
                write!(f, "ago={} is out of range", ago)
            }
        }
    }
}

impl std::error::Error for LatticeError {}
