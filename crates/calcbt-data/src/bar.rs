use calcbt_core::{CellValue, FieldId};
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// One time-stamped bar as produced by a `DataReader`, always including the
/// configured datetime column alongside whatever other fields the source
/// carries (at minimum open/high/low/close/volume).
#[derive(Clone, Debug, PartialEq)]
pub struct DataBar {
    pub datetime: NaiveDateTime,
    pub fields: IndexMap<FieldId, CellValue>,
}

impl DataBar {
    pub fn get(&self, field: &FieldId) -> Option<&CellValue> {
        self.fields.get(field)
    }
}
