//! calcbt-bar
//!
//! `BarLayer`: the dense (asset, field) -> value table for one retained
//! bar. A lattice owns a `Vec<BarLayer>` (oldest to newest); layers never
//! reference each other, only `FieldId`s do.

use calcbt_core::{AssetId, CellValue, FieldId};
use indexmap::IndexMap;

/// One bar's worth of cell values, keyed by (asset, field).
///
/// Storage is a single flat map rather than a nested asset -> field -> value
/// structure: most lattices are sparse relative to the full asset x field
/// cross product (a cross-sectional field only fires once a bar, genesis
/// fields arrive per-asset), so a flat map avoids allocating an inner map
/// per asset up front.
#[derive(Clone, Debug, Default)]
pub struct BarLayer {
    cells: IndexMap<(AssetId, FieldId), CellValue>,
}

impl BarLayer {
    pub fn new() -> Self {
        Self {
            cells: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, asset: AssetId, field: FieldId, value: CellValue) {
        self.cells.insert((asset, field), value);
    }

    pub fn get(&self, asset: &AssetId, field: &FieldId) -> Option<&CellValue> {
        self.cells.get(&(asset.clone(), field.clone()))
    }

    pub fn contains(&self, asset: &AssetId, field: &FieldId) -> bool {
        self.cells.contains_key(&(asset.clone(), field.clone()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Dense per-asset view of one field across the given asset order.
    /// Assets with no recorded value for this field map to `CellValue::Missing`.
    pub fn field_across_assets(
        &self,
        asset_order: &[AssetId],
        field: &FieldId,
    ) -> IndexMap<AssetId, CellValue> {
        asset_order
            .iter()
            .map(|asset| {
                let value = self.get(asset, field).cloned().unwrap_or(CellValue::Missing);
                (asset.clone(), value)
            })
            .collect()
    }

    /// Nested asset -> field -> value view, restricted to `asset_order` and
    /// `field_order`, for consumers (e.g. JSON export) that need a full
    /// dense grid rather than this layer's flat sparse storage.
    pub fn to_nested(
        &self,
        asset_order: &[AssetId],
        field_order: &[FieldId],
    ) -> IndexMap<AssetId, IndexMap<FieldId, CellValue>> {
        asset_order
            .iter()
            .map(|asset| {
                let fields = field_order
                    .iter()
                    .map(|field| {
                        let value = self.get(asset, field).cloned().unwrap_or(CellValue::Missing);
                        (field.clone(), value)
                    })
                    .collect();
                (asset.clone(), fields)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cell_is_missing() {
        let layer = BarLayer::new();
        assert!(layer.get(&AssetId::from("A"), &FieldId::from("close")).is_none());
    }

    #[test]
    fn field_across_assets_fills_missing() {
        let mut layer = BarLayer::new();
        let a = AssetId::from("A");
        let b = AssetId::from("B");
        let close = FieldId::from("close");
        layer.insert(a.clone(), close.clone(), CellValue::Float64(1.0));

        let dense = layer.field_across_assets(&[a.clone(), b.clone()], &close);
        assert_eq!(dense.get(&a), Some(&CellValue::Float64(1.0)));
        assert_eq!(dense.get(&b), Some(&CellValue::Missing));
    }
}
