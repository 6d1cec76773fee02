use calcbt_core::AssetId;
use calcbt_data::ReaderError;
use calcbt_execution::ExecutionError;
use calcbt_lattice::LatticeError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Every fatal condition the strategy loop can raise, either originating
/// here or forwarded from a collaborator crate. All are fatal to the
/// backtest; none are retried.
#[derive(Debug)]
pub enum StrategyError {
    /// No data readers were configured.
    EmptyDataReaders,
    /// A per-bar genesis load disagreed on datetime across assets.
    DesynchronisedReaders {
        expected: DateTime<Utc>,
        asset_id: AssetId,
        got: DateTime<Utc>,
    },
    /// A single `new_bar` propagation exceeded the configured wall-clock
    /// budget.
    FieldOpTimeout { budget: Duration, elapsed: Duration },
    Reader(ReaderError),
    Lattice(LatticeError),
    Execution(ExecutionError),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::EmptyDataReaders => write!(f, "no data readers configured"),
            StrategyError::DesynchronisedReaders { expected, asset_id, got } => write!(
                f,
                "data readers desynchronised: expected datetime {expected}, asset '{asset_id}' yielded {got}"
            ),
            StrategyError::FieldOpTimeout { budget, elapsed } => write!(
                f,
                "field op timeout: propagation took {elapsed:?}, budget was {budget:?}"
            ),
            StrategyError::Reader(e) => write!(f, "{e}"),
            StrategyError::Lattice(e) => write!(f, "{e}"),
            StrategyError::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StrategyError {}

impl From<ReaderError> for StrategyError {
    fn from(e: ReaderError) -> Self {
        StrategyError::Reader(e)
    }
}

impl From<LatticeError> for StrategyError {
    fn from(e: LatticeError) -> Self {
        StrategyError::Lattice(e)
    }
}

impl From<ExecutionError> for StrategyError {
    fn from(e: ExecutionError) -> Self {
        StrategyError::Execution(e)
    }
}
