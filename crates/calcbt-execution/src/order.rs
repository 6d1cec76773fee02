use calcbt_core::AssetId;
use std::fmt;

/// An order as submitted to the book. Size is signed: positive buys,
/// negative sells.
#[derive(Clone, Debug, PartialEq)]
pub enum Order {
    Market { asset_id: AssetId, size: f64 },
    Limit { asset_id: AssetId, size: f64, extremum: f64 },
}

impl Order {
    pub fn asset_id(&self) -> &AssetId {
        match self {
            Order::Market { asset_id, .. } => asset_id,
            Order::Limit { asset_id, .. } => asset_id,
        }
    }

    pub fn size(&self) -> f64 {
        match self {
            Order::Market { size, .. } => *size,
            Order::Limit { size, .. } => *size,
        }
    }

    pub fn side(&self) -> Side {
        if self.size() >= 0.0 {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}

/// The implied direction of an order's signed size, for logging only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}
