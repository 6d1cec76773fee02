use calcbt_core::{AssetId, CellValue, FieldId, OrderId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// The details of one executed fill, as attached to an [`Event::OrderFill`].
///
/// Kept minimal and free of any dependency on `calcbt-execution`'s order
/// types so this crate stays a leaf: the strategy loop and portfolio only
/// need the asset, the signed size that was filled, and the price it filled
/// at.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderFillDetails {
    pub order_id: OrderId,
    pub asset_id: AssetId,
    /// Signed size that filled; positive = bought, negative = sold.
    pub size: f64,
    pub execution_price: f64,
}

/// One event in the simulation's time-ordered queue.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new bar's genesis data has arrived and is ready for lattice
    /// propagation.
    NewBar {
        time: DateTime<Utc>,
        genesis_data: IndexMap<AssetId, IndexMap<FieldId, CellValue>>,
    },
    /// Lattice propagation for the current bar has finished; the user's
    /// data callback may now run.
    FieldCompletedProcessing { time: DateTime<Utc> },
    /// A previously placed order has been acknowledged by the simulated
    /// brokerage.
    OrderAck { time: DateTime<Utc>, order_id: OrderId },
    /// A previously placed order has filled.
    OrderFill {
        time: DateTime<Utc>,
        order: OrderFillDetails,
        delta_cash: f64,
        delta_equity: f64,
    },
}

impl Event {
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Event::NewBar { time, .. } => *time,
            Event::FieldCompletedProcessing { time } => *time,
            Event::OrderAck { time, .. } => *time,
            Event::OrderFill { time, .. } => *time,
        }
    }

    /// `true` for `OrderAck`/`OrderFill` — the two variants `spec.md` groups
    /// as "AbstractOrderEvent" for the loop's `on_order_event` dispatch.
    pub fn is_order_event(&self) -> bool {
        matches!(self, Event::OrderAck { .. } | Event::OrderFill { .. })
    }
}
