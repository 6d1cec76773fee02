use crate::bar::DataBar;
use crate::error::ReaderError;
use chrono::NaiveDateTime;

/// An iterator over time-sorted bars for exactly one asset.
///
/// Implementations are not required to be `O(log n)` on `fast_forward` —
/// per-run bar counts are bounded and a linear scan is acceptable.
pub trait DataReader {
    /// Returns the current bar without advancing. `None` once exhausted.
    fn peek(&self) -> Option<&DataBar>;

    /// Returns the current bar and advances past it. `None` once exhausted.
    fn pop_first(&mut self) -> Option<DataBar>;

    /// Advances until the next bar's datetime is `>= t`.
    ///
    /// Fails with `DateTooEarly` if the first remaining bar is already
    /// after `t` (the reader cannot rewind), and `DateTooFarOut` if the
    /// reader is exhausted before reaching `t`.
    fn fast_forward(&mut self, t: NaiveDateTime) -> Result<(), ReaderError>;
}
