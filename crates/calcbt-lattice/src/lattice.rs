use calcbt_bar::BarLayer;
use calcbt_core::{AssetId, CellValue, FieldId};
use calcbt_fields::FieldOperation;
use indexmap::{IndexMap, IndexSet};

use crate::{LatticeError, Retention};

/// The rolling-window storage and propagation engine for a fixed set of
/// assets and a frozen-after-first-bar set of fields.
pub struct CalcLattice {
    assets: IndexSet<AssetId>,
    /// Same contents/order as `assets`, kept as a plain `Vec` so iteration
    /// can be cloned cheaply without re-hashing into an `IndexSet` while
    /// `propagate` holds a mutable borrow of `self`.
    asset_order: Vec<AssetId>,
    retention: Retention,

    recent_bars: Vec<BarLayer>,
    current_bar_index: u64,

    completed_assets_counter: IndexMap<FieldId, usize>,

    window_dependents: IndexMap<FieldId, Vec<FieldId>>,
    cross_sectional_dependents: IndexMap<FieldId, Vec<FieldId>>,
    genesis_field_ids: IndexSet<FieldId>,
    field_order: Vec<FieldId>,
    ops: IndexMap<FieldId, FieldOperation>,

    started: bool,
}

impl CalcLattice {
    pub fn new(assets: Vec<AssetId>, retention: Retention) -> Self {
        let asset_order = assets.clone();
        Self {
            assets: assets.into_iter().collect(),
            asset_order,
            retention,
            recent_bars: Vec::new(),
            current_bar_index: 0,
            completed_assets_counter: IndexMap::new(),
            window_dependents: IndexMap::new(),
            cross_sectional_dependents: IndexMap::new(),
            genesis_field_ids: IndexSet::new(),
            field_order: Vec::new(),
            ops: IndexMap::new(),
            started: false,
        }
    }

    pub fn assets(&self) -> &IndexSet<AssetId> {
        &self.assets
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.field_order
    }

    pub fn num_bars_available(&self) -> usize {
        self.recent_bars.len()
    }

    pub fn current_bar_index(&self) -> u64 {
        self.current_bar_index
    }

    /// Registers one field. Fails once any bar has been ingested, or if the
    /// id is already present.
    pub fn add_field(&mut self, op: FieldOperation) -> Result<(), LatticeError> {
        if self.started {
            return Err(LatticeError::FieldAfterStart {
                field_id: op.field_id().clone(),
            });
        }
        if self.ops.contains_key(op.field_id()) {
            return Err(LatticeError::DuplicateField {
                field_id: op.field_id().clone(),
            });
        }
        if let Some(upstream) = op.upstream() {
            if !self.ops.contains_key(upstream) {
                return Err(LatticeError::UnknownUpstream {
                    field_id: op.field_id().clone(),
                    upstream: upstream.clone(),
                });
            }
        }

        let field_id = op.field_id().clone();
        match &op {
            FieldOperation::Genesis { .. } => {
                self.genesis_field_ids.insert(field_id.clone());
            }
            FieldOperation::Window { upstream, .. } => {
                self.window_dependents
                    .entry(upstream.clone())
                    .or_default()
                    .push(field_id.clone());
            }
            FieldOperation::CrossSectional { upstream, .. } => {
                self.cross_sectional_dependents
                    .entry(upstream.clone())
                    .or_default()
                    .push(field_id.clone());
            }
        }

        self.completed_assets_counter.insert(field_id.clone(), 0);
        self.field_order.push(field_id.clone());
        self.ops.insert(field_id, op);
        Ok(())
    }

    pub fn add_fields(
        &mut self,
        ops: impl IntoIterator<Item = FieldOperation>,
    ) -> Result<(), LatticeError> {
        for op in ops {
            self.add_field(op)?;
        }
        Ok(())
    }

    /// Ingests one bar: validates the input is complete relative to the
    /// asset/genesis-field set, then runs the depth-first propagation
    /// described in `spec.md` §4.1.
    pub fn new_bar(
        &mut self,
        genesis_data: &IndexMap<AssetId, IndexMap<FieldId, CellValue>>,
    ) -> Result<(), LatticeError> {
        for asset in &self.assets {
            let per_asset = genesis_data
                .get(asset)
                .ok_or_else(|| LatticeError::MissingAsset {
                    asset_id: asset.clone(),
                })?;
            for field in &self.genesis_field_ids {
                if !per_asset.contains_key(field) {
                    return Err(LatticeError::MissingGenesisField {
                        asset_id: asset.clone(),
                        field_id: field.clone(),
                    });
                }
            }
        }

        self.started = true;
        for count in self.completed_assets_counter.values_mut() {
            *count = 0;
        }
        self.current_bar_index += 1;

        if let Some(limit) = self.retention.limit() {
            if self.recent_bars.len() >= limit {
                self.recent_bars.remove(0);
            }
        }
        self.recent_bars.push(BarLayer::new());

        for asset in self.asset_order.clone() {
            for field in self.genesis_field_ids.clone() {
                let value = genesis_data[&asset][&field].clone();
                self.insert_and_count(&asset, &field, value);
                self.propagate(&asset, &field);
            }
        }

        Ok(())
    }

    fn insert_and_count(&mut self, asset: &AssetId, field: &FieldId, value: CellValue) {
        self.recent_bars
            .last_mut()
            .expect("new_bar always pushes a layer before propagation")
            .insert(asset.clone(), field.clone(), value);
        *self
            .completed_assets_counter
            .get_mut(field)
            .expect("every registered field has a counter entry") += 1;
    }

    /// Depth-first: first every window dependent of `field` (recursing
    /// immediately, per-asset, no interleaving between sibling branches),
    /// then — once every asset has produced a value for `field` this bar —
    /// every cross-sectional dependent, computed for all assets at once.
    fn propagate(&mut self, asset: &AssetId, field: &FieldId) {
        if let Some(dependents) = self.window_dependents.get(field).cloned() {
            for dependent in dependents {
                let value = self.compute_window(asset, &dependent);
                self.insert_and_count(asset, &dependent, value);
                self.propagate(asset, &dependent);
            }
        }

        if let Some(dependents) = self.cross_sectional_dependents.get(field).cloned() {
            let all_assets_done = self.completed_assets_counter[field] == self.assets.len();
            if all_assets_done {
                for dependent in dependents {
                    let values = self.compute_cross_sectional(field, &dependent);
                    for asset_i in self.asset_order.clone() {
                        let value = values[&asset_i].clone();
                        self.insert_and_count(&asset_i, &dependent, value);
                    }
                    for asset_i in self.asset_order.clone() {
                        self.propagate(&asset_i, &dependent);
                    }
                }
            }
        }
    }

    fn compute_window(&self, asset: &AssetId, field_id: &FieldId) -> CellValue {
        let FieldOperation::Window {
            upstream,
            window,
            reduction,
            ..
        } = &self.ops[field_id]
        else {
            unreachable!("window_dependents only ever names Window fields");
        };

        let bars_available = self.recent_bars.len();
        let n = (*window).min(bars_available);
        let start = bars_available - n;
        let seq: Vec<Option<f64>> = self.recent_bars[start..]
            .iter()
            .map(|layer| layer.get(asset, upstream).and_then(CellValue::as_f64))
            .collect();

        reduction.reduce(*window, &seq)
    }

    fn compute_cross_sectional(
        &self,
        upstream: &FieldId,
        field_id: &FieldId,
    ) -> IndexMap<AssetId, CellValue> {
        let FieldOperation::CrossSectional { reduction, .. } = &self.ops[field_id] else {
            unreachable!("cross_sectional_dependents only ever names CrossSectional fields");
        };

        let current = self
            .recent_bars
            .last()
            .expect("propagation only runs after a layer has been pushed");
        let asset_order = self.asset_order.clone();
        let dense = current.field_across_assets(&asset_order, upstream);
        reduction.reduce(&dense)
    }

    fn resolve_ago(&self, ago: i64) -> Result<usize, LatticeError> {
        if ago < 0 {
            return Err(LatticeError::AgoOutOfRange { ago });
        }
        let ago = ago as usize;
        if let Some(limit) = self.retention.limit() {
            if ago >= limit {
                return Err(LatticeError::AgoOutOfRange { ago: ago as i64 });
            }
        }
        if ago >= self.recent_bars.len() {
            return Err(LatticeError::AgoOutOfRange { ago: ago as i64 });
        }
        Ok(self.recent_bars.len() - 1 - ago)
    }

    pub fn data(&self, ago: i64) -> Result<&BarLayer, LatticeError> {
        let idx = self.resolve_ago(ago)?;
        Ok(&self.recent_bars[idx])
    }

    pub fn data_field(
        &self,
        ago: i64,
        field: &FieldId,
    ) -> Result<IndexMap<AssetId, CellValue>, LatticeError> {
        let idx = self.resolve_ago(ago)?;
        let asset_order = self.asset_order.clone();
        Ok(self.recent_bars[idx].field_across_assets(&asset_order, field))
    }

    pub fn data_asset_field(
        &self,
        ago: i64,
        asset: &AssetId,
        field: &FieldId,
    ) -> Result<CellValue, LatticeError> {
        let idx = self.resolve_ago(ago)?;
        Ok(self.recent_bars[idx]
            .get(asset, field)
            .cloned()
            .unwrap_or(CellValue::Missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcbt_fields::{CrossSectionalReduction, WindowReduction};

    fn genesis(field: &str) -> FieldOperation {
        FieldOperation::Genesis {
            field_id: FieldId::from(field),
        }
    }

    fn bar(rows: &[(&str, &[(&str, f64)])]) -> IndexMap<AssetId, IndexMap<FieldId, CellValue>> {
        rows.iter()
            .map(|(asset, fields)| {
                let inner = fields
                    .iter()
                    .map(|(f, v)| (FieldId::from(*f), CellValue::Float64(*v)))
                    .collect();
                (AssetId::from(*asset), inner)
            })
            .collect()
    }

    fn assets() -> Vec<AssetId> {
        vec![AssetId::from("A"), AssetId::from("B"), AssetId::from("C")]
    }

    #[test]
    fn retention_one_keeps_single_layer_and_ago_one_is_out_of_range() {
        let mut lat = CalcLattice::new(assets(), Retention::Bars(1));
        lat.add_field(genesis("close")).unwrap();

        let bar1 = bar(&[
            ("A", &[("close", 1.0)]),
            ("B", &[("close", 2.0)]),
            ("C", &[("close", 3.0)]),
        ]);
        lat.new_bar(&bar1).unwrap();

        assert_eq!(lat.num_bars_available(), 1);
        assert!(lat.data(1).is_err());
        assert!(matches!(lat.data(1), Err(LatticeError::AgoOutOfRange { .. })));
    }

    #[test]
    fn add_field_after_start_is_rejected() {
        let mut lat = CalcLattice::new(assets(), Retention::All);
        lat.add_field(genesis("close")).unwrap();
        let bar1 = bar(&[("A", &[("close", 1.0)]), ("B", &[("close", 1.0)]), ("C", &[("close", 1.0)])]);
        lat.new_bar(&bar1).unwrap();

        let err = lat.add_field(genesis("volume")).unwrap_err();
        assert!(matches!(err, LatticeError::FieldAfterStart { .. }));
    }

    #[test]
    fn missing_asset_in_new_bar_is_rejected() {
        let mut lat = CalcLattice::new(assets(), Retention::All);
        lat.add_field(genesis("close")).unwrap();
        let partial = bar(&[("A", &[("close", 1.0)]), ("B", &[("close", 1.0)])]);
        let err = lat.new_bar(&partial).unwrap_err();
        assert!(matches!(err, LatticeError::MissingAsset { .. }));
    }

    #[test]
    fn cross_sectional_field_is_missing_until_all_assets_report() {
        let mut lat = CalcLattice::new(assets(), Retention::All);
        lat.add_field(genesis("close")).unwrap();
        lat.add_field(FieldOperation::CrossSectional {
            field_id: FieldId::from("zscore_close"),
            upstream: FieldId::from("close"),
            reduction: CrossSectionalReduction::ZScore,
        })
        .unwrap();

        let bar1 = bar(&[
            ("A", &[("close", 10.0)]),
            ("B", &[("close", 20.0)]),
            ("C", &[("close", 30.0)]),
        ]);
        lat.new_bar(&bar1).unwrap();

        let z = FieldId::from("zscore_close");
        assert!(lat.data_asset_field(0, &AssetId::from("A"), &z).unwrap().as_f64().is_some());
    }
}
