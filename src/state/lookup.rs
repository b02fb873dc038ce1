//! Results of asynchronous lookups, guarded against out-of-order completion

use serde::{Deserialize, Serialize};

/// Handle for one issued lookup, meaningful only to the slot that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LookupTicket {
    seq: u64,
}

impl LookupTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// A value filled in by an external lookup.
///
/// Every request is numbered. A response is applied only when it is newer
/// than the last one applied, so a slow early response can never overwrite
/// a later one. Sequence numbers are session-local and are not persisted:
/// a deserialized slot starts idle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lookup<T> {
    value: T,
    #[serde(skip)]
    issued: u64,
    #[serde(skip)]
    resolved: u64,
}

impl<T> Lookup<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            issued: 0,
            resolved: 0,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Issue a new request
    pub fn begin(&mut self) -> LookupTicket {
        self.issued += 1;
        LookupTicket { seq: self.issued }
    }

    /// Apply a response. Returns false when the response is stale.
    pub fn complete(&mut self, ticket: LookupTicket, value: T) -> bool {
        if ticket.seq <= self.resolved || ticket.seq > self.issued {
            return false;
        }
        self.value = value;
        self.resolved = ticket.seq;
        true
    }

    /// Resolve a request that produced no value
    pub fn fail(&mut self, ticket: LookupTicket) -> bool {
        if ticket.seq <= self.resolved || ticket.seq > self.issued {
            return false;
        }
        self.resolved = ticket.seq;
        true
    }

    /// Whether the most recently issued request is still outstanding
    pub fn is_waiting(&self) -> bool {
        self.resolved < self.issued
    }

    /// Set the value outside of a lookup, superseding anything in flight
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.resolved = self.issued;
    }
}

// Bookkeeping is not part of the value.
impl<T: PartialEq> PartialEq for Lookup<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Lookup<T> {}

impl<T: Default> Lookup<T> {
    /// Clear the value and drop interest in outstanding requests
    pub fn clear(&mut self) {
        self.set(T::default());
    }
}
