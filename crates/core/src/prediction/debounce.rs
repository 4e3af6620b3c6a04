//! Settle-window timer, one slot per key.
//!
//! Every `schedule` supersedes the previous one for that key. Hosts either hand
//! the returned [`Ticket`] to a real timer and call [`Debouncer::fire`] when it
//! expires (browser), or poll [`Debouncer::take_due`] with a clock.

use std::hash::Hash;

use hashbrown::HashMap;

use crate::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket<K> {
    pub key: K,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    window: Duration,
    pending: HashMap<K, (u64, Instant)>,
    generation: u64,
}

impl<K: Copy + Eq + Hash> Debouncer<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            generation: 0,
        }
    }

    pub fn schedule(&mut self, key: K, now: Instant) -> Ticket<K> {
        self.generation += 1;
        self.pending.insert(key, (self.generation, now + self.window));
        Ticket {
            key,
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.pending
            .get(&ticket.key)
            .is_some_and(|(g, _)| *g == ticket.generation)
    }

    /// Consumes `ticket` if nothing superseded or cancelled it.
    pub fn fire(&mut self, ticket: &Ticket<K>) -> bool {
        if self.is_current(ticket) {
            self.pending.remove(&ticket.key);
            true
        } else {
            false
        }
    }

    /// Removes and returns every key whose window has elapsed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(k, _)| *k)
            .collect();
        for k in &due {
            self.pending.remove(k);
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(_, d)| *d).min()
    }

    pub fn cancel(&mut self, key: K) {
        self.pending.remove(&key);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
