use std::fs;
use std::path::PathBuf;

use calcbt_core::{CellValue, FieldId};
use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::bar::DataBar;
use crate::error::ReaderError;
use crate::reader::DataReader;

/// Column-name configuration for [`CsvBarReader`], mirroring `spec.md` §6's
/// "OHLCV column-name mapping is treated as configuration."
#[derive(Clone, Debug)]
pub struct CsvColumns {
    pub datetime: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            datetime: "datetime".to_string(),
            open: "open".to_string(),
            high: "high".to_string(),
            low: "low".to_string(),
            close: "close".to_string(),
            volume: "volume".to_string(),
        }
    }
}

/// A `DataReader` backed by one or more delimited text files, concatenated
/// in the order given.
///
/// Parses the configured datetime column with a configurable `chrono`
/// format string and the five OHLCV columns into `CellValue::Float64`
/// (volume as `Float64` too, matching the rest of the lattice's numeric
/// cells rather than introducing a second value kind for it). Malformed
/// rows are fatal: this reader does no repair or interpolation.
pub struct CsvBarReader {
    bars: Vec<DataBar>,
    cursor: usize,
}

impl CsvBarReader {
    /// Reads and parses `paths` in order, concatenating their rows into one
    /// time-sorted sequence.
    pub fn from_paths(
        paths: &[PathBuf],
        columns: &CsvColumns,
        datetime_format: &str,
    ) -> Result<Self, ReaderError> {
        let mut bars = Vec::new();
        for path in paths {
            let text = fs::read_to_string(path)
                .map_err(|e| ReaderError::Io(format!("open '{}': {e}", path.display())))?;
            bars.extend(parse_csv_str(&text, &path.display().to_string(), columns, datetime_format)?);
        }
        Ok(Self { bars, cursor: 0 })
    }

    /// Parses already-loaded CSV text (useful for tests without touching
    /// the filesystem).
    pub fn from_str(
        source_name: &str,
        text: &str,
        columns: &CsvColumns,
        datetime_format: &str,
    ) -> Result<Self, ReaderError> {
        let bars = parse_csv_str(text, source_name, columns, datetime_format)?;
        Ok(Self { bars, cursor: 0 })
    }
}

impl DataReader for CsvBarReader {
    fn peek(&self) -> Option<&DataBar> {
        self.bars.get(self.cursor)
    }

    fn pop_first(&mut self) -> Option<DataBar> {
        let bar = self.bars.get(self.cursor).cloned();
        if bar.is_some() {
            self.cursor += 1;
        }
        bar
    }

    fn fast_forward(&mut self, t: NaiveDateTime) -> Result<(), ReaderError> {
        match self.peek() {
            Some(bar) if bar.datetime > t => return Err(ReaderError::DateTooEarly),
            None => return Err(ReaderError::DateTooFarOut),
            _ => {}
        }
        while let Some(bar) = self.peek() {
            if bar.datetime >= t {
                return Ok(());
            }
            self.cursor += 1;
        }
        Err(ReaderError::DateTooFarOut)
    }
}

fn parse_csv_str(
    text: &str,
    source_name: &str,
    columns: &CsvColumns,
    datetime_format: &str,
) -> Result<Vec<DataBar>, ReaderError> {
    let mut lines = text.lines();

    let header_line = match lines.next() {
        Some(l) => l,
        None => return Ok(Vec::new()),
    };
    let header: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let col_index = |name: &str| -> Result<usize, ReaderError> {
        header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReaderError::MissingColumn {
                source: source_name.to_string(),
                column: name.to_string(),
            })
    };

    let dt_idx = col_index(&columns.datetime)?;
    let open_idx = col_index(&columns.open)?;
    let high_idx = col_index(&columns.high)?;
    let low_idx = col_index(&columns.low)?;
    let close_idx = col_index(&columns.close)?;
    let volume_idx = col_index(&columns.volume)?;

    let mut out = Vec::new();
    let mut line_num = 1usize; // header is line 1

    for line in lines {
        line_num += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let malformed = |reason: &str| ReaderError::MalformedRow {
            source: source_name.to_string(),
            line: line_num,
            reason: reason.to_string(),
        };

        if fields.len() != header.len() {
            return Err(malformed(&format!(
                "expected {} columns, got {}",
                header.len(),
                fields.len()
            )));
        }

        let get = |idx: usize| -> &str { fields[idx] };

        let datetime = NaiveDateTime::parse_from_str(get(dt_idx), datetime_format)
            .map_err(|e| malformed(&format!("unparseable datetime '{}': {e}", get(dt_idx))))?;

        let parse_f64 = |name: &str, raw: &str| -> Result<f64, ReaderError> {
            raw.parse::<f64>()
                .map_err(|_| malformed(&format!("unparseable {name} '{raw}'")))
        };

        let open = parse_f64("open", get(open_idx))?;
        let high = parse_f64("high", get(high_idx))?;
        let low = parse_f64("low", get(low_idx))?;
        let close = parse_f64("close", get(close_idx))?;
        let volume = parse_f64("volume", get(volume_idx))?;

        let mut row_fields = IndexMap::new();
        row_fields.insert(FieldId::from(columns.open.as_str()), CellValue::Float64(open));
        row_fields.insert(FieldId::from(columns.high.as_str()), CellValue::Float64(high));
        row_fields.insert(FieldId::from(columns.low.as_str()), CellValue::Float64(low));
        row_fields.insert(FieldId::from(columns.close.as_str()), CellValue::Float64(close));
        row_fields.insert(FieldId::from(columns.volume.as_str()), CellValue::Float64(volume));

        out.push(DataBar {
            datetime,
            fields: row_fields,
        });
    }

    Ok(out)
}
