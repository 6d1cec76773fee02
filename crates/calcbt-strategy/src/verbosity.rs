use chrono::{DateTime, Utc};
use std::fmt;

/// A ladder, not an unordered set: `Info` subsumes `Transactions` subsumes
/// `Debug` subsumes `Warning` subsumes `None`. A log line at level `L` is
/// emitted iff the configured verbosity is `>= L` in this ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    None,
    Warning,
    Debug,
    Transactions,
    Info,
}

impl Verbosity {
    pub fn allows(self, level: Verbosity) -> bool {
        self >= level
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verbosity::None => "NONE",
            Verbosity::Warning => "WARNING",
            Verbosity::Debug => "DEBUG",
            Verbosity::Transactions => "TRANSACTIONS",
            Verbosity::Info => "INFO",
        };
        write!(f, "{s}")
    }
}

/// Formats one log line as `<yyyy-mm-dd HH:MM:SS.sss> ~~~~ <message>`, where
/// the timestamp is the simulation's `current_time` (not wall-clock).
pub fn format_log_line(current_time: DateTime<Utc>, message: &str) -> String {
    format!("<{}> ~~~~ {}", current_time.format("%Y-%m-%d %H:%M:%S%.3f"), message)
}

/// Writes `message` at `level` to `sink` iff `verbosity` permits it. `sink`
/// is caller-supplied (defaults to stdout in [`crate::Config`]) so embedding
/// callers can redirect the spec-mandated text log elsewhere.
pub fn log(
    verbosity: Verbosity,
    level: Verbosity,
    current_time: DateTime<Utc>,
    message: &str,
    sink: &mut dyn std::io::Write,
) {
    if verbosity.allows(level) {
        let _ = writeln!(sink, "{}", format_log_line(current_time, message));
    }
}
