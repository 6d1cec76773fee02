use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use calcbt_core::{AssetId, CellValue, FieldId};
use calcbt_data::DataReader;
use calcbt_events::Event;
use calcbt_lattice::Retention;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indexmap::IndexMap;

use calcbt_strategy::{Config, Strategy};

type Snapshot = IndexMap<AssetId, IndexMap<FieldId, CellValue>>;
type Snapshots = IndexMap<DateTime<Utc>, Snapshot>;

/// Runs `config` to completion with `retention = all` and zero data/message
/// latency, and writes the lattice's dense per-bar grid to `path` as JSON:
/// one entry per processed bar, keyed by that bar's datetime, each holding
/// every asset's field values at that point.
///
/// Any `on_data_event` callback already set on `config` still fires; this
/// only adds a snapshot recorded alongside it.
pub fn dump_json<R: DataReader>(mut config: Config<R>, path: impl AsRef<Path>) -> anyhow::Result<()> {
    config.num_lookback_bars = Retention::All;
    config.data_delay = ChronoDuration::zero();
    config.message_latency = ChronoDuration::zero();

    let snapshots: Rc<RefCell<Snapshots>> = Rc::new(RefCell::new(IndexMap::new()));
    let snapshots_for_cb = Rc::clone(&snapshots);
    let mut original = std::mem::replace(&mut config.on_data_event, Box::new(|_, _| {}));

    config.on_data_event = Box::new(move |strategy: &mut Strategy<R>, event: &Event| {
        original(strategy, event);
        if !matches!(event, Event::FieldCompletedProcessing { .. }) {
            return;
        }
        let assets = strategy.assets();
        let fields = strategy.fields();
        if let Ok(layer) = strategy.data(0) {
            let nested = layer.to_nested(&assets, &fields);
            snapshots_for_cb.borrow_mut().insert(strategy.current_time(), nested);
        }
    });

    let mut strategy = Strategy::new(config)?;
    strategy.run()?;
    drop(strategy);

    let snapshots = Rc::try_unwrap(snapshots)
        .map_err(|_| anyhow::anyhow!("snapshot handle still shared after the run completed"))?
        .into_inner();

    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshots)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcbt_data::{CsvBarReader, CsvColumns};

    const FMT: &str = "%Y-%m-%d %H:%M:%S";
    const HEADER: &str = "datetime,open,high,low,close,volume";

    fn dt(s: &str) -> DateTime<Utc> {
        DateTime::<Utc>::from_naive_utc_and_offset(
            chrono::NaiveDateTime::parse_from_str(s, FMT).unwrap(),
            Utc,
        )
    }

    #[test]
    fn writes_one_entry_per_bar() {
        let rows = format!(
            "{HEADER}\n2024-01-01 00:00:00,10,12,9,11,100\n2024-01-02 00:00:00,11,13,10,12,100\n"
        );
        let mut readers = IndexMap::new();
        readers.insert(
            AssetId::from("A"),
            CsvBarReader::from_str("t.csv", &rows, &CsvColumns::default(), FMT).unwrap(),
        );
        let mut config = Config::new(readers, dt("2024-01-01 00:00:00"), dt("2024-01-04 00:00:00"));
        config.trading_interval = ChronoDuration::minutes(1);

        let dir = std::env::temp_dir().join(format!("calcbt-dump-json-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let out_path = dir.join("dump.json");

        dump_json(config, &out_path).unwrap();

        let contents = std::fs::read_to_string(&out_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 2);

        std::fs::remove_file(&out_path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
