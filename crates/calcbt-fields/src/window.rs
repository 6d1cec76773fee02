use calcbt_core::CellValue;

/// The reduction family for a [`FieldOperation::Window`](crate::FieldOperation).
///
/// Every reduction is handed the oldest-to-newest sequence of the upstream
/// field's last `min(window, bars_available)` values for one asset. A `None`
/// entry in the sequence means that bar's upstream cell was itself
/// `Missing`; every reduction here propagates that as an output `Missing`
/// rather than silently skipping the gap, since a skipped gap would shift
/// which bars a `Returns`/`LogReturns` ratio compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowReduction {
    /// Arithmetic mean of the sequence. Uses whatever history is available
    /// — unlike `Returns`/`LogReturns`, it does not require a full window.
    Sma,
    /// `(seq[W-1] - seq[0]) / seq[0]`. `Missing` unless the sequence has
    /// the full requested `window` length.
    Returns,
    /// `ln(seq[W-1] / seq[0])`. Same length guard as `Returns`.
    LogReturns,
    /// Exponential moving average over the available sequence, seeded at
    /// `seq[0]` with smoothing factor `2 / (len + 1)`.
    Ema,
    /// `seq[last] - seq[first]`, the un-normalised counterpart to `Returns`.
    /// Same length guard as `Returns`.
    Momentum,
}

impl WindowReduction {
    /// `seq` is `None` wherever the upstream cell for that bar was
    /// `Missing`; any `None` propagates to an output `Missing` before the
    /// reduction-specific logic runs.
    pub fn reduce(&self, window: usize, seq: &[Option<f64>]) -> CellValue {
        if seq.iter().any(|v| v.is_none()) {
            return CellValue::Missing;
        }
        let seq: Vec<f64> = seq.iter().map(|v| v.unwrap()).collect();

        match self {
            WindowReduction::Sma => {
                if seq.is_empty() {
                    CellValue::Missing
                } else {
                    CellValue::Float64(seq.iter().sum::<f64>() / seq.len() as f64)
                }
            }
            WindowReduction::Returns => {
                if seq.len() < window {
                    CellValue::Missing
                } else {
                    let first = seq[0];
                    let last = seq[window - 1];
                    CellValue::Float64((last - first) / first)
                }
            }
            WindowReduction::LogReturns => {
                if seq.len() < window {
                    CellValue::Missing
                } else {
                    let first = seq[0];
                    let last = seq[window - 1];
                    CellValue::Float64((last / first).ln())
                }
            }
            WindowReduction::Ema => {
                if seq.is_empty() {
                    return CellValue::Missing;
                }
                let alpha = 2.0 / (seq.len() as f64 + 1.0);
                let mut ema = seq[0];
                for &v in &seq[1..] {
                    ema = alpha * v + (1.0 - alpha) * ema;
                }
                CellValue::Float64(ema)
            }
            WindowReduction::Momentum => {
                if seq.len() < window {
                    CellValue::Missing
                } else {
                    let first = seq[0];
                    let last = seq[window - 1];
                    CellValue::Float64(last - first)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_window_one_equals_upstream() {
        let v = WindowReduction::Sma.reduce(1, &[Some(42.0)]);
        assert_eq!(v, CellValue::Float64(42.0));
    }

    #[test]
    fn returns_missing_when_short_of_window() {
        let v = WindowReduction::Returns.reduce(3, &[Some(1.0), Some(2.0)]);
        assert_eq!(v, CellValue::Missing);
    }

    #[test]
    fn returns_indexes_tail_of_window() {
        let v = WindowReduction::Returns.reduce(2, &[Some(10.0), Some(11.0)]);
        assert_eq!(v, CellValue::Float64(0.1));
    }

    #[test]
    fn log_returns_missing_when_short_of_window() {
        let v = WindowReduction::LogReturns.reduce(3, &[Some(1.0), Some(2.0)]);
        assert_eq!(v, CellValue::Missing);
    }

    #[test]
    fn missing_upstream_cell_propagates() {
        let v = WindowReduction::Sma.reduce(2, &[Some(1.0), None]);
        assert_eq!(v, CellValue::Missing);
    }

    #[test]
    fn ema_seeds_at_first_value_then_smooths() {
        // alpha = 2/(3+1) = 0.5: ema = 0.5*11 + 0.5*(0.5*10.5 + 0.5*10) = ...
        let v = WindowReduction::Ema.reduce(3, &[Some(10.0), Some(10.5), Some(11.0)]);
        match v {
            CellValue::Float64(f) => assert!((f - 10.625).abs() < 1e-9, "got {f}"),
            other => panic!("expected Float64, got {other:?}"),
        }
    }

    #[test]
    fn ema_of_single_value_is_that_value() {
        let v = WindowReduction::Ema.reduce(1, &[Some(7.0)]);
        assert_eq!(v, CellValue::Float64(7.0));
    }

    #[test]
    fn momentum_is_unnormalised_difference() {
        let v = WindowReduction::Momentum.reduce(2, &[Some(10.0), Some(13.0)]);
        assert_eq!(v, CellValue::Float64(3.0));
    }

    #[test]
    fn momentum_missing_when_short_of_window() {
        let v = WindowReduction::Momentum.reduce(3, &[Some(1.0), Some(2.0)]);
        assert_eq!(v, CellValue::Missing);
    }
}
