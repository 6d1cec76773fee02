use calcbt_core::{AssetId, CellValue};
use indexmap::IndexMap;

/// The reduction family for a
/// [`FieldOperation::CrossSectional`](crate::FieldOperation).
///
/// Every reduction is handed a dense `AssetId -> value` map for the current
/// bar, in the lattice's asset order, and returns one output cell per asset
/// in that same order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossSectionalReduction {
    /// `(x - mean) / sample_stddev` for each asset. Fewer than two assets
    /// with a numeric value makes the sample standard deviation undefined;
    /// every asset's output is `Missing` in that case.
    ZScore,
    /// Descending rank (1 = largest value). Ties are broken by asset order
    /// — the order `asset_order` presents them in — via a stable sort, so
    /// the choice is deterministic rather than an artifact of a particular
    /// sort implementation.
    Rank,
}

impl CrossSectionalReduction {
    pub fn reduce(&self, values: &IndexMap<AssetId, CellValue>) -> IndexMap<AssetId, CellValue> {
        match self {
            CrossSectionalReduction::ZScore => reduce_zscore(values),
            CrossSectionalReduction::Rank => reduce_rank(values),
        }
    }
}

fn reduce_zscore(values: &IndexMap<AssetId, CellValue>) -> IndexMap<AssetId, CellValue> {
    let numeric: Vec<f64> = values.values().filter_map(CellValue::as_f64).collect();

    if numeric.len() < 2 {
        return values.keys().map(|a| (a.clone(), CellValue::Missing)).collect();
    }

    let mean = numeric.iter().sum::<f64>() / numeric.len() as f64;
    let variance = numeric.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (numeric.len() - 1) as f64;
    let stddev = variance.sqrt();

    values
        .iter()
        .map(|(asset, value)| {
            let out = match value.as_f64() {
                Some(x) if stddev > 0.0 => CellValue::Float64((x - mean) / stddev),
                Some(_) => CellValue::Missing,
                None => CellValue::Missing,
            };
            (asset.clone(), out)
        })
        .collect()
}

fn reduce_rank(values: &IndexMap<AssetId, CellValue>) -> IndexMap<AssetId, CellValue> {
    let mut present: Vec<(usize, &AssetId, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, (asset, value))| value.as_f64().map(|v| (idx, asset, v)))
        .collect();

    // Stable sort descending by value; ties keep their original (asset-order)
    // relative position since the sort is stable and the input is already in
    // asset order.
    present.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks: IndexMap<AssetId, CellValue> =
        values.keys().map(|a| (a.clone(), CellValue::Missing)).collect();
    for (rank, (_, asset, _)) in present.into_iter().enumerate() {
        ranks.insert((*asset).clone(), CellValue::Rank((rank + 1) as u32));
    }
    ranks
}
