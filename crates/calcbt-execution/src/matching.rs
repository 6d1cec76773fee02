use crate::error::ExecutionError;
use crate::order::Order;

/// The OHLC of the bar a fill attempt is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// The cash/equity consequence of a single fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    pub execution_price: f64,
    pub delta_cash: f64,
    pub delta_equity: f64,
}

/// The single canonical fill entry point. Evaluated against the *current*
/// peeked bar's OHLC.
///
/// Market orders always price (at the bar's mid) and are therefore either
/// filled or fatally rejected for insufficient buying power — they never
/// carry over. Limit orders price only when their extremum condition is
/// met against this bar's low/high; otherwise `Ok(None)` signals the caller
/// to keep the order open for the next bar's scan.
pub fn try_fill_order(
    order: &Order,
    ohlc: &Ohlc,
    buying_power: f64,
) -> Result<Option<Fill>, ExecutionError> {
    let execution_price = match order {
        Order::Market { .. } => Some((ohlc.low + ohlc.high) / 2.0),
        Order::Limit { size, extremum, .. } if *size > 0.0 => {
            (*extremum >= ohlc.low).then(|| ohlc.open.min(*extremum))
        }
        Order::Limit { size, extremum, .. } if *size < 0.0 => {
            (*extremum <= ohlc.high).then(|| ohlc.open.max(*extremum))
        }
        Order::Limit { .. } => None, // size == 0 is rejected at placement time
    };

    let Some(execution_price) = execution_price else {
        return Ok(None);
    };

    let size = order.size();
    let delta_cash = -size * execution_price;
    if buying_power + delta_cash < 0.0 {
        return Err(ExecutionError::InsufficientBuyingPower { buying_power, delta_cash });
    }

    Ok(Some(Fill {
        execution_price,
        delta_cash,
        delta_equity: size,
    }))
}
