/// How many past bars a lattice keeps alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retention {
    /// Keep at most this many bars; the oldest is evicted on overflow.
    Bars(usize),
    /// Keep every bar ever ingested.
    All,
}

impl Retention {
    pub fn limit(&self) -> Option<usize> {
        match self {
            Retention::Bars(n) => Some(*n),
            Retention::All => None,
        }
    }
}
