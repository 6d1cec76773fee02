//! calcbt-portfolio
//!
//! `Portfolio`: cash and per-asset equity, updated only on `OrderFill`
//! dispatch (`OrderAck` is accounting-inert). `total_value` is recomputed
//! from the lattice's most recently completed close on every fill, which
//! means it lags during a bar — that lag is preserved deliberately, not a
//! bug (see the design notes on `update_portfolio`).

use calcbt_core::AssetId;
use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq)]
pub struct Portfolio {
    buying_power: f64,
    equity: IndexMap<AssetId, f64>,
    total_value: f64,
}

impl Portfolio {
    pub fn new(principal: f64) -> Self {
        Self {
            buying_power: principal,
            equity: IndexMap::new(),
            total_value: principal,
        }
    }

    pub fn buying_power(&self) -> f64 {
        self.buying_power
    }

    pub fn equity_of(&self, asset_id: &AssetId) -> f64 {
        self.equity.get(asset_id).copied().unwrap_or(0.0)
    }

    pub fn total_value(&self) -> f64 {
        self.total_value
    }

    /// Applies one `OrderFill`'s cash/equity delta, then recomputes
    /// `total_value = buying_power + sum(equity[a] * last_close(a))`.
    ///
    /// `last_close` is the lattice's most recently completed value for the
    /// configured close field, per asset; a position with no recorded close
    /// yet (e.g. its first bar hasn't propagated) contributes zero to
    /// `total_value` rather than panicking.
    pub fn apply_fill(
        &mut self,
        asset_id: &AssetId,
        delta_cash: f64,
        delta_equity: f64,
        last_close: impl Fn(&AssetId) -> Option<f64>,
    ) {
        self.buying_power += delta_cash;
        *self.equity.entry(asset_id.clone()).or_insert(0.0) += delta_equity;

        let marked: f64 = self
            .equity
            .iter()
            .map(|(asset, qty)| qty * last_close(asset).unwrap_or(0.0))
            .sum();
        self.total_value = self.buying_power + marked;
    }
}
