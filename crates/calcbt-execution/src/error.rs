use std::fmt;

/// Errors a placed order can raise. Both are fatal to the backtest — neither
/// describes a retryable condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutionError {
    /// An order was placed with `size == 0`.
    ZeroSizeOrder,
    /// A fill attempt's `delta_cash` would drive buying power below zero.
    InsufficientBuyingPower { buying_power: f64, delta_cash: f64 },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::ZeroSizeOrder => write!(f, "order placed with size 0"),
            ExecutionError::InsufficientBuyingPower { buying_power, delta_cash } => write!(
                f,
                "insufficient buying power: {buying_power} + {delta_cash} < 0"
            ),
        }
    }
}

impl std::error::Error for ExecutionError {}
