use calcbt_core::AssetId;
use calcbt_data::DataReader;
use calcbt_events::Event;
use calcbt_fields::FieldOperation;
use calcbt_lattice::Retention;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indexmap::IndexMap;
use std::time::Duration as StdDuration;

use crate::verbosity::Verbosity;
use crate::Strategy;

pub type DataEventCallback<R> = Box<dyn FnMut(&mut Strategy<R>, &Event)>;
pub type OrderEventCallback<R> = Box<dyn FnMut(&mut Strategy<R>, &Event)>;

/// Every recognised configuration option, per `spec.md` §6, plus the
/// ambient column-name / callback defaults it specifies.
pub struct Config<R: DataReader> {
    pub data_readers: IndexMap<AssetId, R>,
    /// User additions beyond the implicit OHLCV genesis fields.
    pub field_operations: Vec<FieldOperation>,
    pub num_lookback_bars: Retention,
    pub start: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub trading_interval: ChronoDuration,
    pub verbosity: Verbosity,
    pub data_delay: ChronoDuration,
    pub message_latency: ChronoDuration,
    pub field_op_timeout: StdDuration,
    pub datetime_col: String,
    pub open_col: String,
    pub high_col: String,
    pub low_col: String,
    pub close_col: String,
    pub volume_col: String,
    pub on_data_event: DataEventCallback<R>,
    pub on_order_event: OrderEventCallback<R>,
    pub principal: f64,
    /// Sink for the verbosity-gated text log. Defaults to stdout.
    pub log_writer: Box<dyn std::io::Write>,
}

impl<R: DataReader> Config<R> {
    /// Builds a config with every `spec.md` §6 default: `verbosity=NONE`,
    /// `trading_interval=390min`, `data_delay=message_latency=field_op_timeout
    /// =100ms`, `principal=100000`, lowercase singleton column names, no-op
    /// callbacks. Callers still must supply `data_readers`, `start`, and
    /// `end_time`.
    pub fn new(
        data_readers: IndexMap<AssetId, R>,
        start: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            data_readers,
            field_operations: Vec::new(),
            num_lookback_bars: Retention::All,
            start,
            end_time,
            trading_interval: ChronoDuration::minutes(390),
            verbosity: Verbosity::None,
            data_delay: ChronoDuration::milliseconds(100),
            message_latency: ChronoDuration::milliseconds(100),
            field_op_timeout: StdDuration::from_millis(100),
            datetime_col: "datetime".to_string(),
            open_col: "open".to_string(),
            high_col: "high".to_string(),
            low_col: "low".to_string(),
            close_col: "close".to_string(),
            volume_col: "volume".to_string(),
            on_data_event: Box::new(|_, _| {}),
            on_order_event: Box::new(|_, _| {}),
            principal: 100_000.0,
            log_writer: Box::new(std::io::stdout()),
        }
    }
}
