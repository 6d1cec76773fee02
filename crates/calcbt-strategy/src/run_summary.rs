/// Exposed once `Strategy::run` returns: the terminal state of the run, for
/// callers that don't want to reach into the lattice/portfolio themselves.
///
/// `max_drawdown` and `fill_count` are derived, read-only statistics over
/// the run's equity curve (one `total_value` sample per bar) and fill
/// history; they add no new mutable state to the portfolio itself.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub bars_processed: u64,
    pub final_buying_power: f64,
    pub final_total_value: f64,
    pub max_drawdown: f64,
    pub fill_count: u64,
}
