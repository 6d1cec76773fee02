use crate::Event;

/// A time-ordered sequence of events, stable across equal times in
/// insertion order.
///
/// An insertion-sorted `Vec` is sufficient per `spec.md` §4.2: per-bar event
/// counts are small (a handful of order lifecycle events plus the two bar
/// events), so O(n) insertion never shows up in practice.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Inserts at the position implied by ascending `time`. Events already
    /// queued with the same `time` are left before the new one, so pushes
    /// at equal times behave FIFO.
    pub fn push(&mut self, event: Event) {
        let t = event.time();
        let pos = self.events.partition_point(|e| e.time() <= t);
        self.events.insert(pos, event);
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn pop(&mut self) -> Option<Event> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn pops_in_ascending_time_order() {
        let mut q = EventQueue::new();
        q.push(Event::FieldCompletedProcessing { time: at(30) });
        q.push(Event::FieldCompletedProcessing { time: at(10) });
        q.push(Event::FieldCompletedProcessing { time: at(20) });

        assert_eq!(q.pop().unwrap().time(), at(10));
        assert_eq!(q.pop().unwrap().time(), at(20));
        assert_eq!(q.pop().unwrap().time(), at(30));
        assert!(q.pop().is_none());
    }

    #[test]
    fn equal_times_preserve_insertion_order() {
        let mut q = EventQueue::new();
        q.push(Event::OrderAck {
            time: at(10),
            order_id: calcbt_core::OrderId::new("first"),
        });
        q.push(Event::OrderAck {
            time: at(10),
            order_id: calcbt_core::OrderId::new("second"),
        });

        let Event::OrderAck { order_id, .. } = q.pop().unwrap() else {
            panic!("expected OrderAck");
        };
        assert_eq!(order_id, calcbt_core::OrderId::new("first"));
    }
}
