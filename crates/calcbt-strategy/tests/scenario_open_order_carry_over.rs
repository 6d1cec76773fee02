use calcbt_core::AssetId;
use calcbt_data::{CsvBarReader, CsvColumns};
use calcbt_events::Event;
use calcbt_execution::Order;
use calcbt_strategy::{Config, Strategy};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const FMT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER: &str = "datetime,open,high,low,close,volume";

fn dt(s: &str) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(chrono::NaiveDateTime::parse_from_str(s, FMT).unwrap(), Utc)
}

fn reader(rows: &str) -> CsvBarReader {
    CsvBarReader::from_str("t.csv", rows, &CsvColumns::default(), FMT).unwrap()
}

/// Limit sell placed on bar 1 above bar 1's high misses, carries over on
/// the open-orders FIFO, and fills on bar 2 once its high reaches the
/// extremum.
#[test]
fn open_order_carries_over_and_fills_next_bar() {
    let rows_a = format!(
        "{HEADER}\n2024-01-01 00:00:00,10,12,9,11,100\n2024-01-02 00:00:00,13,16,12,15,100\n"
    );
    let rows_b = format!(
        "{HEADER}\n2024-01-01 00:00:00,20,22,19,21,200\n2024-01-02 00:00:00,21,23,20,22,200\n"
    );

    let mut readers = IndexMap::new();
    readers.insert(AssetId::from("A"), reader(&rows_a));
    readers.insert(AssetId::from("B"), reader(&rows_b));
    let mut config = Config::new(readers, dt("2024-01-01 00:00:00"), dt("2024-01-04 00:00:00"));
    config.trading_interval = ChronoDuration::minutes(1);

    let placed = Arc::new(AtomicU64::new(0));
    let placed_cb = placed.clone();
    config.on_data_event = Box::new(move |strategy: &mut Strategy<CsvBarReader>, event| {
        if matches!(event, Event::FieldCompletedProcessing { .. }) && placed_cb.load(Ordering::SeqCst) == 0 {
            placed_cb.store(1, Ordering::SeqCst);
            // Sell limit above bar 1's high (12): misses bar 1, fills bar 2 (high=16).
            strategy
                .place_order(Order::Limit { asset_id: AssetId::from("A"), size: -1.0, extremum: 15.0 })
                .unwrap();
        }
    });

    let mut strategy = Strategy::new(config).unwrap();
    let summary = strategy.run().unwrap();

    assert_eq!(summary.bars_processed, 2);
    assert_eq!(strategy.equity_of(&AssetId::from("A")), -1.0);
}
