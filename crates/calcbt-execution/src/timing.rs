use chrono::{DateTime, Utc};
use rand::Rng;

/// Picks a uniformly random fill time in `[current_time + latency, bar_end +
/// latency]`, matching the market/limit fill scheduling rule.
pub fn random_fill_time<R: Rng + ?Sized>(
    rng: &mut R,
    current_time: DateTime<Utc>,
    bar_end: DateTime<Utc>,
    latency_ms: i64,
) -> DateTime<Utc> {
    let earliest = current_time + chrono::Duration::milliseconds(latency_ms);
    let latest = bar_end + chrono::Duration::milliseconds(latency_ms);
    if latest <= earliest {
        return earliest;
    }
    let span_ms = (latest - earliest).num_milliseconds();
    let offset_ms = rng.random_range(0..=span_ms);
    earliest + chrono::Duration::milliseconds(offset_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_fill_time_falls_within_bounds() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let bar_end = t0 + chrono::Duration::minutes(1);
        let mut rng = rand::rng();
        for _ in 0..50 {
            let t = random_fill_time(&mut rng, t0, bar_end, 100);
            assert!(t >= t0 + chrono::Duration::milliseconds(100));
            assert!(t <= bar_end + chrono::Duration::milliseconds(100));
        }
    }
}
