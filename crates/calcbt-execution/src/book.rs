use std::collections::VecDeque;

use calcbt_core::OrderId;
use indexmap::IndexMap;

use crate::error::ExecutionError;
use crate::order::Order;

/// Tracks every order ever placed plus the FIFO of ids still open (placed
/// but not yet filled). The book does not itself attempt fills — the
/// strategy loop drives that via [`crate::try_fill_order`], since a fill
/// attempt needs the current bar's OHLC and the portfolio's buying power,
/// neither of which the book owns.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: IndexMap<OrderId, Order>,
    open: VecDeque<OrderId>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            orders: IndexMap::new(),
            open: VecDeque::new(),
        }
    }

    /// Registers a new order and returns its freshly minted id. Does not
    /// place it on the open FIFO — callers append it themselves only if the
    /// immediate same-bar fill attempt misses.
    pub fn place(&mut self, order: Order) -> Result<OrderId, ExecutionError> {
        if order.size() == 0.0 {
            return Err(ExecutionError::ZeroSizeOrder);
        }
        let id = OrderId::generate();
        self.orders.insert(id.clone(), order);
        Ok(id)
    }

    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn carry_over(&mut self, id: OrderId) {
        self.open.push_back(id);
    }

    /// Takes every id currently on the open FIFO, leaving it empty.
    ///
    /// Per the bar-start scan contract: each currently-open order is
    /// attempted exactly once; misses are re-appended by the caller via
    /// [`Self::carry_over`], not retried within this same scan.
    pub fn drain_open(&mut self) -> Vec<OrderId> {
        self.open.drain(..).collect()
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcbt_core::AssetId;

    #[test]
    fn zero_size_order_rejected() {
        let mut book = OrderBook::new();
        let err = book
            .place(Order::Market { asset_id: AssetId::from("A"), size: 0.0 })
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ZeroSizeOrder));
    }

    #[test]
    fn drain_open_empties_fifo_and_preserves_order() {
        let mut book = OrderBook::new();
        let a = book
            .place(Order::Market { asset_id: AssetId::from("A"), size: 1.0 })
            .unwrap();
        let b = book
            .place(Order::Market { asset_id: AssetId::from("B"), size: 1.0 })
            .unwrap();
        book.carry_over(a.clone());
        book.carry_over(b.clone());

        let drained = book.drain_open();
        assert_eq!(drained, vec![a, b]);
        assert_eq!(book.open_len(), 0);
    }
}
