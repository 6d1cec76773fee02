use std::time::Instant;

use calcbt_bar::BarLayer;
use calcbt_core::{AssetId, CellValue, FieldId, OrderId};
use calcbt_data::{DataBar, DataReader};
use calcbt_events::{Event, EventQueue, OrderFillDetails};
use calcbt_execution::{random_fill_time, try_fill_order, Fill, Ohlc, Order, OrderBook};
use calcbt_lattice::CalcLattice;
use calcbt_portfolio::Portfolio;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indexmap::IndexMap;

use crate::config::Config;
use crate::error::StrategyError;
use crate::run_summary::RunSummary;
use crate::verbosity::{log, Verbosity};

/// The discrete-event simulation loop: owns the data readers, the lattice,
/// the portfolio, the order book, and the event queue, and drives one bar
/// at a time per `spec.md` §4.6's per-bar sequence.
pub struct Strategy<R: DataReader> {
    data_readers: IndexMap<AssetId, R>,
    lattice: CalcLattice,
    portfolio: Portfolio,
    order_book: OrderBook,
    queue: EventQueue,

    verbosity: Verbosity,
    end_time: DateTime<Utc>,
    trading_interval: ChronoDuration,
    data_delay: ChronoDuration,
    message_latency: ChronoDuration,
    field_op_timeout: std::time::Duration,

    open_field: FieldId,
    high_field: FieldId,
    low_field: FieldId,
    close_field: FieldId,

    on_data_event: crate::config::DataEventCallback<R>,
    on_order_event: crate::config::OrderEventCallback<R>,
    log_writer: Box<dyn std::io::Write>,

    current_time: DateTime<Utc>,
    current_bar_start_time: DateTime<Utc>,
    current_bar_end_time: DateTime<Utc>,
    current_bar_index: u64,
    bars_processed: u64,
    fill_count: u64,
    peak_total_value: f64,
    max_drawdown: f64,
}

fn to_utc(naive: chrono::NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
}

fn ohlc_from_bar(
    bar: &DataBar,
    open_field: &FieldId,
    high_field: &FieldId,
    low_field: &FieldId,
    close_field: &FieldId,
) -> Ohlc {
    let at = |field: &FieldId| bar.get(field).and_then(CellValue::as_f64).unwrap_or(f64::NAN);
    Ohlc {
        open: at(open_field),
        high: at(high_field),
        low: at(low_field),
        close: at(close_field),
    }
}

impl<R: DataReader> Strategy<R> {
    pub fn new(mut config: Config<R>) -> Result<Self, StrategyError> {
        if config.data_readers.is_empty() {
            return Err(StrategyError::EmptyDataReaders);
        }

        let start_naive = config.start.naive_utc();
        for reader in config.data_readers.values_mut() {
            reader.fast_forward(start_naive)?;
        }

        let assets: Vec<AssetId> = config.data_readers.keys().cloned().collect();
        let open_field = FieldId::from(config.open_col.as_str());
        let high_field = FieldId::from(config.high_col.as_str());
        let low_field = FieldId::from(config.low_col.as_str());
        let close_field = FieldId::from(config.close_col.as_str());
        let volume_field = FieldId::from(config.volume_col.as_str());

        let mut lattice = CalcLattice::new(assets, config.num_lookback_bars);
        lattice.add_fields([
            calcbt_fields::FieldOperation::Genesis { field_id: open_field.clone() },
            calcbt_fields::FieldOperation::Genesis { field_id: high_field.clone() },
            calcbt_fields::FieldOperation::Genesis { field_id: low_field.clone() },
            calcbt_fields::FieldOperation::Genesis { field_id: close_field.clone() },
            calcbt_fields::FieldOperation::Genesis { field_id: volume_field },
        ])?;
        lattice.add_fields(std::mem::take(&mut config.field_operations))?;

        let portfolio = Portfolio::new(config.principal);

        Ok(Self {
            data_readers: config.data_readers,
            lattice,
            portfolio,
            order_book: OrderBook::new(),
            queue: EventQueue::new(),
            verbosity: config.verbosity,
            end_time: config.end_time,
            trading_interval: config.trading_interval,
            data_delay: config.data_delay,
            message_latency: config.message_latency,
            field_op_timeout: config.field_op_timeout,
            open_field,
            high_field,
            low_field,
            close_field,
            on_data_event: config.on_data_event,
            on_order_event: config.on_order_event,
            log_writer: config.log_writer,
            current_time: config.start,
            current_bar_start_time: config.start,
            current_bar_end_time: config.start,
            current_bar_index: 0,
            bars_processed: 0,
            fill_count: 0,
            peak_total_value: config.principal,
            max_drawdown: 0.0,
        })
    }

    pub fn data(&self, ago: i64) -> Result<&BarLayer, StrategyError> {
        Ok(self.lattice.data(ago)?)
    }

    pub fn data_field(&self, ago: i64, field: &FieldId) -> Result<IndexMap<AssetId, CellValue>, StrategyError> {
        Ok(self.lattice.data_field(ago, field)?)
    }

    pub fn data_asset_field(
        &self,
        ago: i64,
        asset: &AssetId,
        field: &FieldId,
    ) -> Result<CellValue, StrategyError> {
        Ok(self.lattice.data_asset_field(ago, asset, field)?)
    }

    pub fn assets(&self) -> Vec<AssetId> {
        self.lattice.assets().iter().cloned().collect()
    }

    pub fn fields(&self) -> Vec<FieldId> {
        self.lattice.fields().to_vec()
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    pub fn current_bar_index(&self) -> u64 {
        self.current_bar_index
    }

    pub fn buying_power(&self) -> f64 {
        self.portfolio.buying_power()
    }

    pub fn total_value(&self) -> f64 {
        self.portfolio.total_value()
    }

    pub fn equity_of(&self, asset: &AssetId) -> f64 {
        self.portfolio.equity_of(asset)
    }

    /// Places `order`: mints an id, schedules its `OrderAck`, then attempts
    /// an immediate same-bar fill against the lattice's current OHLC.
    pub fn place_order(&mut self, order: Order) -> Result<OrderId, StrategyError> {
        let id = self.order_book.place(order.clone())?;
        self.queue.push(Event::OrderAck {
            time: self.current_time + self.message_latency * 2,
            order_id: id.clone(),
        });

        let ohlc = self.current_ohlc(order.asset_id())?;
        match try_fill_order(&order, &ohlc, self.portfolio.buying_power())? {
            Some(fill) => self.schedule_fill(id.clone(), &order, fill),
            None => self.order_book.carry_over(id.clone()),
        }
        Ok(id)
    }

    fn current_ohlc(&self, asset: &AssetId) -> Result<Ohlc, StrategyError> {
        let at = |field: &FieldId| -> Result<f64, StrategyError> {
            Ok(self
                .lattice
                .data_asset_field(0, asset, field)?
                .as_f64()
                .unwrap_or(f64::NAN))
        };
        Ok(Ohlc {
            open: at(&self.open_field)?,
            high: at(&self.high_field)?,
            low: at(&self.low_field)?,
            close: at(&self.close_field)?,
        })
    }

    fn schedule_fill(&mut self, order_id: OrderId, order: &Order, fill: Fill) {
        let time = match order {
            Order::Market { .. } => self.current_time + self.message_latency,
            Order::Limit { .. } => random_fill_time(
                &mut rand::rng(),
                self.current_time,
                self.current_bar_end_time,
                self.message_latency.num_milliseconds(),
            ),
        };
        self.queue.push(Event::OrderFill {
            time,
            order: OrderFillDetails {
                order_id,
                asset_id: order.asset_id().clone(),
                size: order.size(),
                execution_price: fill.execution_price,
            },
            delta_cash: fill.delta_cash,
            delta_equity: fill.delta_equity,
        });
    }

    fn log(&mut self, level: Verbosity, message: &str) {
        log(self.verbosity, level, self.current_time, message, &mut self.log_writer);
    }

    /// Runs every remaining bar up to `end_time` and returns the terminal
    /// summary.
    pub fn run(&mut self) -> Result<RunSummary, StrategyError> {
        loop {
            let bars = match self.load_next_bar()? {
                Some(bars) => bars,
                None => break,
            };

            self.current_time = self.current_bar_start_time;
            self.current_bar_index += 1;
            self.bars_processed += 1;
            self.current_bar_end_time = self.current_bar_start_time + self.trading_interval;

            self.log(Verbosity::Debug, &format!("bar {} start", self.current_bar_index));

            self.retry_open_orders(&bars)?;

            let genesis_data: IndexMap<AssetId, IndexMap<FieldId, CellValue>> = bars
                .iter()
                .map(|(asset, bar)| (asset.clone(), bar.fields.clone()))
                .collect();
            self.queue.push(Event::NewBar {
                time: self.current_bar_start_time + self.data_delay,
                genesis_data,
            });

            while let Some(head) = self.queue.peek() {
                if head.time() >= self.current_bar_end_time {
                    break;
                }
                let event = self.queue.pop().expect("peek just confirmed an event is present");
                self.current_time = event.time();
                self.dispatch(event)?;
            }

            let total_value = self.portfolio.total_value();
            self.peak_total_value = self.peak_total_value.max(total_value);
            let drawdown = self.peak_total_value - total_value;
            self.max_drawdown = self.max_drawdown.max(drawdown);

            if self.current_bar_end_time >= self.end_time {
                break;
            }
        }

        Ok(RunSummary {
            bars_processed: self.bars_processed,
            final_buying_power: self.portfolio.buying_power(),
            final_total_value: self.portfolio.total_value(),
            max_drawdown: self.max_drawdown,
            fill_count: self.fill_count,
        })
    }

    /// Peeks every reader; returns `None` once any is exhausted or the next
    /// bar's start would fall at/after `end_time` (both read as a natural
    /// end of the run). Fails with `DesynchronisedReaders` if readers
    /// disagree on datetime; otherwise pops all of them and returns the
    /// bars.
    fn load_next_bar(&mut self) -> Result<Option<IndexMap<AssetId, DataBar>>, StrategyError> {
        let mut expected: Option<(AssetId, DateTime<Utc>)> = None;
        for (asset, reader) in self.data_readers.iter() {
            let Some(bar) = reader.peek() else {
                return Ok(None);
            };
            let dt = to_utc(bar.datetime);
            match &expected {
                None => expected = Some((asset.clone(), dt)),
                Some((_, exp_dt)) if *exp_dt != dt => {
                    return Err(StrategyError::DesynchronisedReaders {
                        expected: *exp_dt,
                        asset_id: asset.clone(),
                        got: dt,
                    });
                }
                Some(_) => {}
            }
        }

        let (_, bar_start) = expected.expect("data_readers is non-empty, so the loop above always sets expected");
        if bar_start >= self.end_time {
            return Ok(None);
        }
        self.current_bar_start_time = bar_start;

        let mut bars = IndexMap::new();
        for (asset, reader) in self.data_readers.iter_mut() {
            let bar = reader
                .pop_first()
                .expect("peek succeeded for every reader above this same pass");
            bars.insert(asset.clone(), bar);
        }
        Ok(Some(bars))
    }

    fn retry_open_orders(&mut self, bars: &IndexMap<AssetId, DataBar>) -> Result<(), StrategyError> {
        let ids = self.order_book.drain_open();
        for id in ids {
            let order = self
                .order_book
                .order(&id)
                .cloned()
                .expect("an id drained from the open FIFO always has a registered order");
            let bar = bars
                .get(order.asset_id())
                .expect("every lattice asset has a bar this step, per load_next_bar's completeness check");
            let ohlc = ohlc_from_bar(bar, &self.open_field, &self.high_field, &self.low_field, &self.close_field);

            match try_fill_order(&order, &ohlc, self.portfolio.buying_power())? {
                Some(fill) => self.schedule_fill(id, &order, fill),
                None => self.order_book.carry_over(id),
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<(), StrategyError> {
        match event {
            Event::NewBar { genesis_data, .. } => {
                let started = Instant::now();
                self.lattice.new_bar(&genesis_data)?;
                let elapsed = started.elapsed();
                if elapsed > self.field_op_timeout {
                    return Err(StrategyError::FieldOpTimeout {
                        budget: self.field_op_timeout,
                        elapsed,
                    });
                }
                self.log(Verbosity::Debug, "lattice propagation complete");
                let cost = ChronoDuration::from_std(elapsed).unwrap_or(ChronoDuration::zero());
                self.queue.push(Event::FieldCompletedProcessing {
                    time: self.current_time + cost,
                });
            }
            Event::FieldCompletedProcessing { .. } => {
                self.log(Verbosity::Info, "field processing complete");
                self.fire_data_event(&event);
            }
            Event::OrderAck { ref order_id, .. } => {
                self.log(Verbosity::Transactions, &format!("order {order_id} acknowledged"));
                self.fire_order_event(&event);
            }
            Event::OrderFill { ref order, delta_cash, delta_equity, .. } => {
                let lattice = &self.lattice;
                let close_field = &self.close_field;
                self.portfolio.apply_fill(&order.asset_id, delta_cash, delta_equity, |a| {
                    lattice.data_asset_field(0, a, close_field).ok().and_then(|v| v.as_f64())
                });
                self.fill_count += 1;
                self.log(
                    Verbosity::Transactions,
                    &format!("order {} filled: size={} price={}", order.order_id, order.size, order.execution_price),
                );
                self.fire_order_event(&event);
            }
        }
        Ok(())
    }

    fn fire_data_event(&mut self, event: &Event) {
        let mut cb = std::mem::replace(&mut self.on_data_event, Box::new(|_, _| {}));
        cb(self, event);
        self.on_data_event = cb;
    }

    fn fire_order_event(&mut self, event: &Event) {
        let mut cb = std::mem::replace(&mut self.on_order_event, Box::new(|_, _| {}));
        cb(self, event);
        self.on_order_event = cb;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcbt_data::{CsvBarReader, CsvColumns};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    const FMT: &str = "%Y-%m-%d %H:%M:%S";

    fn dt(s: &str) -> DateTime<Utc> {
        to_utc(chrono::NaiveDateTime::parse_from_str(s, FMT).unwrap())
    }

    fn reader(rows: &str) -> CsvBarReader {
        CsvBarReader::from_str("t.csv", rows, &CsvColumns::default(), FMT).unwrap()
    }

    fn two_asset_config(rows_a: &str, rows_b: &str) -> Config<CsvBarReader> {
        let mut readers = IndexMap::new();
        readers.insert(AssetId::from("A"), reader(rows_a));
        readers.insert(AssetId::from("B"), reader(rows_b));
        Config::new(readers, dt("2024-01-01 00:00:00"), dt("2024-01-04 00:00:00"))
    }

    const HEADER: &str = "datetime,open,high,low,close,volume";

    #[test]
    fn run_processes_every_bar_and_reports_summary() {
        let rows_a = format!(
            "{HEADER}\n2024-01-01 00:00:00,10,12,9,11,100\n2024-01-02 00:00:00,11,13,10,12,100\n"
        );
        let rows_b = format!(
            "{HEADER}\n2024-01-01 00:00:00,20,22,19,21,200\n2024-01-02 00:00:00,21,23,20,22,200\n"
        );
        let mut config = two_asset_config(&rows_a, &rows_b);
        config.trading_interval = ChronoDuration::minutes(1);
        let mut strategy = Strategy::new(config).unwrap();
        let summary = strategy.run().unwrap();
        assert_eq!(summary.bars_processed, 2);
        assert_eq!(summary.final_buying_power, 100_000.0);
        assert_eq!(summary.final_total_value, 100_000.0);
    }

    #[test]
    fn market_order_placed_in_data_callback_fills_same_bar() {
        let rows_a = format!(
            "{HEADER}\n2024-01-01 00:00:00,10,12,9,11,100\n2024-01-02 00:00:00,11,13,10,12,100\n"
        );
        let rows_b = format!(
            "{HEADER}\n2024-01-01 00:00:00,20,22,19,21,200\n2024-01-02 00:00:00,21,23,20,22,200\n"
        );
        let mut config = two_asset_config(&rows_a, &rows_b);
        config.trading_interval = ChronoDuration::minutes(1);
        config.message_latency = ChronoDuration::milliseconds(1);
        config.data_delay = ChronoDuration::milliseconds(0);

        let placed = Arc::new(AtomicU64::new(0));
        let placed_cb = placed.clone();
        config.on_data_event = Box::new(move |strategy: &mut Strategy<CsvBarReader>, event| {
            if matches!(event, Event::FieldCompletedProcessing { .. }) && placed_cb.load(Ordering::SeqCst) == 0 {
                placed_cb.store(1, Ordering::SeqCst);
                strategy
                    .place_order(Order::Market { asset_id: AssetId::from("A"), size: 1.0 })
                    .unwrap();
            }
        });

        let mut strategy = Strategy::new(config).unwrap();
        let summary = strategy.run().unwrap();

        assert_eq!(summary.bars_processed, 2);
        // Bought 1 unit of A at mid of bar 1 ((9+12)/2 = 10.5), then marked at bar2's close (12).
        assert!(summary.final_buying_power < 100_000.0);
        assert_eq!(strategy.equity_of(&AssetId::from("A")), 1.0);
        assert_eq!(summary.fill_count, 1);
    }

    #[test]
    fn drawdown_tracks_the_largest_drop_from_a_running_peak() {
        // Bar 1 marks total_value up from principal (100_000), bar 2 drops it
        // back down: max_drawdown must reflect the bar-2 dip from the bar-1 peak.
        let rows_a = format!(
            "{HEADER}\n2024-01-01 00:00:00,10,12,9,11,100\n2024-01-02 00:00:00,9,10,8,9,100\n2024-01-03 00:00:00,9,10,8,9,100\n"
        );
        let rows_b = format!(
            "{HEADER}\n2024-01-01 00:00:00,20,22,19,21,200\n2024-01-02 00:00:00,19,20,18,19,200\n2024-01-03 00:00:00,19,20,18,19,200\n"
        );
        let mut config = two_asset_config(&rows_a, &rows_b);
        config.trading_interval = ChronoDuration::minutes(1);
        config.end_time = dt("2024-01-04 00:00:00");

        let placed = Arc::new(AtomicU64::new(0));
        let placed_cb = placed.clone();
        config.on_data_event = Box::new(move |strategy: &mut Strategy<CsvBarReader>, event| {
            if matches!(event, Event::FieldCompletedProcessing { .. }) && placed_cb.load(Ordering::SeqCst) == 0 {
                placed_cb.store(1, Ordering::SeqCst);
                strategy
                    .place_order(Order::Market { asset_id: AssetId::from("A"), size: 100.0 })
                    .unwrap();
            }
        });

        let mut strategy = Strategy::new(config).unwrap();
        let summary = strategy.run().unwrap();

        assert_eq!(summary.fill_count, 1);
        assert!(summary.max_drawdown > 0.0, "expected a nonzero drawdown, got {}", summary.max_drawdown);
    }

    #[test]
    fn market_fill_is_scheduled_at_current_time_plus_latency_not_randomised() {
        let rows_a = format!(
            "{HEADER}\n2024-01-01 00:00:00,10,12,9,11,100\n2024-01-02 00:00:00,11,13,10,12,100\n"
        );
        let rows_b = format!(
            "{HEADER}\n2024-01-01 00:00:00,20,22,19,21,200\n2024-01-02 00:00:00,21,23,20,22,200\n"
        );
        let mut config = two_asset_config(&rows_a, &rows_b);
        config.trading_interval = ChronoDuration::minutes(1);
        config.message_latency = ChronoDuration::milliseconds(250);
        config.data_delay = ChronoDuration::milliseconds(0);

        let placed = Arc::new(AtomicU64::new(0));
        let placed_cb = placed.clone();
        let placed_at: Arc<std::sync::Mutex<Option<DateTime<Utc>>>> = Arc::new(std::sync::Mutex::new(None));
        let placed_at_cb = placed_at.clone();
        config.on_data_event = Box::new(move |strategy: &mut Strategy<CsvBarReader>, event| {
            if matches!(event, Event::FieldCompletedProcessing { .. }) && placed_cb.load(Ordering::SeqCst) == 0 {
                placed_cb.store(1, Ordering::SeqCst);
                *placed_at_cb.lock().unwrap() = Some(strategy.current_time());
                strategy
                    .place_order(Order::Market { asset_id: AssetId::from("A"), size: 1.0 })
                    .unwrap();
            }
        });

        let fill_time: Arc<std::sync::Mutex<Option<DateTime<Utc>>>> = Arc::new(std::sync::Mutex::new(None));
        let fill_time_cb = fill_time.clone();
        config.on_order_event = Box::new(move |_strategy: &mut Strategy<CsvBarReader>, event| {
            if let Event::OrderFill { time, .. } = event {
                *fill_time_cb.lock().unwrap() = Some(*time);
            }
        });

        let mut strategy = Strategy::new(config).unwrap();
        strategy.run().unwrap();

        let placed_at = placed_at.lock().unwrap().unwrap();
        let fill_time = fill_time.lock().unwrap().unwrap();
        assert_eq!(fill_time, placed_at + ChronoDuration::milliseconds(250));
    }
}
