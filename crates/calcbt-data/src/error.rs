use std::fmt;

/// Errors a `DataReader` implementation can raise.
#[derive(Debug)]
pub enum ReaderError {
    /// `fast_forward(t)` was called but the first remaining bar is already
    /// after `t` — the reader cannot rewind.
    DateTooEarly,
    /// `fast_forward(t)` exhausted the reader before reaching `t`.
    DateTooFarOut,
    /// An I/O error while reading the underlying source.
    Io(String),
    /// A row could not be parsed into a bar: wrong column count, a value
    /// that does not parse as the expected type, or an unparseable
    /// datetime. The reader does no repair or interpolation.
    MalformedRow { source: String, line: usize, reason: String },
    /// The configured header is missing a required column.
    MissingColumn { source: String, column: String },
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::DateTooEarly => {
                write!(f, "fast_forward target is before the reader's first bar")
            }
            ReaderError::DateTooFarOut => {
                write!(f, "reader exhausted before reaching the fast_forward target")
            }
            ReaderError::Io(msg) => write!(f, "data reader io error: {msg}"),
            ReaderError::MalformedRow { source, line, reason } => write!(
                f,
                "{source}:{line}: malformed row ({reason})"
            ),
            ReaderError::MissingColumn { source, column } => write!(
                f,
                "{source}: missing required column '{column}'"
            ),
        }
    }
}

impl std::error::Error for ReaderError {}
