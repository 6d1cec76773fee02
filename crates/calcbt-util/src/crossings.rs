/// Whether `a` crossed above `b` between the last two points: `a` was
/// `<= b` one point ago and is `> b` now. Most commonly called with two
/// lattice window-field histories fetched via `data(ago, asset, field)`.
pub fn crossover(series_a: &[f64], series_b: &[f64]) -> bool {
    crossed(series_a, series_b, |prev_diff, curr_diff| prev_diff <= 0.0 && curr_diff > 0.0)
}

/// Whether `a` crossed below `b` between the last two points.
pub fn crossunder(series_a: &[f64], series_b: &[f64]) -> bool {
    crossed(series_a, series_b, |prev_diff, curr_diff| prev_diff >= 0.0 && curr_diff < 0.0)
}

fn crossed(a: &[f64], b: &[f64], predicate: impl Fn(f64, f64) -> bool) -> bool {
    if a.len() != b.len() || a.len() < 2 {
        return false;
    }
    let n = a.len();
    let prev_diff = a[n - 2] - b[n - 2];
    let curr_diff = a[n - 1] - b[n - 1];
    predicate(prev_diff, curr_diff)
}
