//! calcbt-events
//!
//! The time-ordered event queue that drives one bar of simulation: a sum
//! type of event variants plus a single insertion-sorted sequence. No
//! polymorphism, no trait objects — the strategy loop matches on the
//! variant at one dispatch site.

mod event;
mod queue;

pub use event::{Event, OrderFillDetails};
pub use queue::EventQueue;
