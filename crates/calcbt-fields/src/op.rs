use calcbt_core::FieldId;

use crate::{CrossSectionalReduction, WindowReduction};

/// A field's definition within a lattice.
///
/// Every non-genesis variant names exactly one upstream field (`spec.md`'s
/// "tree, not general DAG" constraint) — there is no variant that reads more
/// than one upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOperation {
    /// An externally supplied value; identity propagation, no upstream.
    Genesis { field_id: FieldId },
    /// Reduces the last `window` cells (or fewer, if unavailable) of
    /// `upstream` for a single asset into one cell.
    Window {
        field_id: FieldId,
        upstream: FieldId,
        window: usize,
        reduction: WindowReduction,
    },
    /// Reduces one upstream cell per asset, for the current bar only, into
    /// one output cell per asset.
    CrossSectional {
        field_id: FieldId,
        upstream: FieldId,
        reduction: CrossSectionalReduction,
    },
}

impl FieldOperation {
    pub fn field_id(&self) -> &FieldId {
        match self {
            FieldOperation::Genesis { field_id } => field_id,
            FieldOperation::Window { field_id, .. } => field_id,
            FieldOperation::CrossSectional { field_id, .. } => field_id,
        }
    }

    /// `None` for genesis fields; every other variant has exactly one.
    pub fn upstream(&self) -> Option<&FieldId> {
        match self {
            FieldOperation::Genesis { .. } => None,
            FieldOperation::Window { upstream, .. } => Some(upstream),
            FieldOperation::CrossSectional { upstream, .. } => Some(upstream),
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, FieldOperation::Genesis { .. })
    }
}
