use anyhow::{anyhow, bail, Context, Result};
use calcbt_core::AssetId;
use calcbt_data::{CsvBarReader, CsvColumns};
use calcbt_lattice::Retention;
use calcbt_strategy::{Config, Verbosity};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The serializable subset of a [`Config`]: everything but the data readers
/// themselves and the event callbacks, which only the caller can supply.
/// Deserialized straight off the merged, canonicalized YAML produced by
/// [`crate::load_layered_yaml`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Asset id -> CSV file paths, concatenated in order.
    pub assets: IndexMap<String, Vec<String>>,
    pub start: String,
    pub end_time: String,
    #[serde(default)]
    pub datetime_format: Option<String>,
    /// Omitted or `null` means keep every bar (`Retention::All`).
    #[serde(default)]
    pub num_lookback_bars: Option<usize>,
    #[serde(default)]
    pub trading_interval_minutes: Option<i64>,
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub data_delay_ms: Option<i64>,
    #[serde(default)]
    pub message_latency_ms: Option<i64>,
    #[serde(default)]
    pub field_op_timeout_ms: Option<u64>,
    #[serde(default)]
    pub datetime_col: Option<String>,
    #[serde(default)]
    pub open_col: Option<String>,
    #[serde(default)]
    pub high_col: Option<String>,
    #[serde(default)]
    pub low_col: Option<String>,
    #[serde(default)]
    pub close_col: Option<String>,
    #[serde(default)]
    pub volume_col: Option<String>,
    #[serde(default)]
    pub principal: Option<f64>,
}

impl ConfigFile {
    pub fn from_merged_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).context("config does not match the expected shape")
    }

    /// Builds a runnable [`Config`] wired to CSV-backed readers. Callers
    /// still need to set `on_data_event`/`on_order_event` themselves; those
    /// fields default to no-ops per [`Config::new`].
    pub fn into_config(self) -> Result<Config<CsvBarReader>> {
        if self.assets.is_empty() {
            bail!("config has no assets");
        }

        let datetime_format = self.datetime_format.as_deref().unwrap_or(DEFAULT_DATETIME_FORMAT);
        let start = parse_datetime(&self.start, datetime_format)
            .with_context(|| format!("invalid start '{}'", self.start))?;
        let end_time = parse_datetime(&self.end_time, datetime_format)
            .with_context(|| format!("invalid end_time '{}'", self.end_time))?;

        let columns = CsvColumns {
            datetime: self.datetime_col.clone().unwrap_or_else(|| "datetime".to_string()),
            open: self.open_col.clone().unwrap_or_else(|| "open".to_string()),
            high: self.high_col.clone().unwrap_or_else(|| "high".to_string()),
            low: self.low_col.clone().unwrap_or_else(|| "low".to_string()),
            close: self.close_col.clone().unwrap_or_else(|| "close".to_string()),
            volume: self.volume_col.clone().unwrap_or_else(|| "volume".to_string()),
        };

        let mut readers = IndexMap::new();
        for (asset, paths) in &self.assets {
            if paths.is_empty() {
                bail!("asset '{asset}' has no CSV paths configured");
            }
            let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
            let reader = CsvBarReader::from_paths(&paths, &columns, datetime_format)
                .with_context(|| format!("loading CSV data for asset '{asset}'"))?;
            readers.insert(AssetId::from(asset.as_str()), reader);
        }

        let mut config = Config::new(readers, start, end_time);
        config.datetime_col = columns.datetime.clone();
        config.open_col = columns.open.clone();
        config.high_col = columns.high.clone();
        config.low_col = columns.low.clone();
        config.close_col = columns.close.clone();
        config.volume_col = columns.volume.clone();
        config.num_lookback_bars = match self.num_lookback_bars {
            Some(n) => Retention::Bars(n),
            None => Retention::All,
        };
        if let Some(minutes) = self.trading_interval_minutes {
            config.trading_interval = ChronoDuration::minutes(minutes);
        }
        if let Some(verbosity) = &self.verbosity {
            config.verbosity = parse_verbosity(verbosity)?;
        }
        if let Some(ms) = self.data_delay_ms {
            config.data_delay = ChronoDuration::milliseconds(ms);
        }
        if let Some(ms) = self.message_latency_ms {
            config.message_latency = ChronoDuration::milliseconds(ms);
        }
        if let Some(ms) = self.field_op_timeout_ms {
            config.field_op_timeout = StdDuration::from_millis(ms);
        }
        if let Some(principal) = self.principal {
            config.principal = principal;
        }

        Ok(config)
    }
}

fn parse_datetime(s: &str, format: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, format)?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn parse_verbosity(s: &str) -> Result<Verbosity> {
    match s.to_ascii_uppercase().as_str() {
        "NONE" => Ok(Verbosity::None),
        "WARNING" => Ok(Verbosity::Warning),
        "DEBUG" => Ok(Verbosity::Debug),
        "TRANSACTIONS" => Ok(Verbosity::Transactions),
        "INFO" => Ok(Verbosity::Info),
        other => Err(anyhow!("unrecognised verbosity '{other}'")),
    }
}
