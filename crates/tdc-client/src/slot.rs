//! # Request Slots
//!
//! Each kind of in-flight request (advanced query, simple query, report)
//! owns a slot. Issuing a request takes a ticket; a response is applied only
//! if its ticket is still the newest one for the slot. Older responses that
//! arrive late are dropped instead of overwriting newer results.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct RequestSlot {
    name: &'static str,
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: &'static str,
    pub seq: u64,
}

/// What happened to a request once its response arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Newest request for its slot; the response was applied.
    Applied(T),
    /// A newer request was issued in the meantime; the response was dropped.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

impl RequestSlot {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            latest: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn issue(&self) -> Ticket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            slot: self.name,
            seq,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_newest_ticket_is_current() {
        let slot = RequestSlot::new("advanced");
        let first = slot.issue();
        assert!(slot.is_current(first));

        let second = slot.issue();
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
        assert_eq!(second.slot, "advanced");
        assert_eq!(second.seq, 2);
    }

    #[test]
    fn test_slots_are_independent() {
        let advanced = RequestSlot::new("advanced");
        let simple = RequestSlot::new("simple");
        let a = advanced.issue();
        simple.issue();
        simple.issue();
        assert!(advanced.is_current(a));
    }

    #[test]
    fn test_outcome_helpers() {
        assert_eq!(Outcome::Applied(3).applied(), Some(3));
        assert!(Outcome::<u8>::Superseded.is_superseded());
        assert_eq!(Outcome::<u8>::Superseded.applied(), None);
    }
}
