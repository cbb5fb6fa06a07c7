//! Bounded in-memory signal history.
//!
//! One store per signal kind, shared by `Arc` between the monitor loop and
//! the HTTP handlers. Appends assign the id and timestamp, push to the back
//! and evict from the front under a single write lock, so readers never see
//! a half-applied append.

use crate::types::{
    Action, MemecoinSignal, MemecoinSignalInput, SignalPage, WhaleSignal, WhaleSignalInput,
};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

/// Retained whale signals.
pub const WHALE_SIGNAL_CAPACITY: usize = 1000;
/// Retained memecoin signals.
pub const MEMECOIN_SIGNAL_CAPACITY: usize = 500;
/// Entries returned when a read does not specify a limit.
pub const DEFAULT_READ_LIMIT: usize = 50;

struct Log<T> {
    entries: VecDeque<T>,
    next_id: u64,
}

/// Append-only FIFO history with a fixed capacity.
pub struct SignalStore<T> {
    log: RwLock<Log<T>>,
    capacity: usize,
}

pub type WhaleSignalStore = SignalStore<WhaleSignal>;
pub type MemecoinSignalStore = SignalStore<MemecoinSignal>;

/// Trailing `limit` items of a slice; 0 means all.
fn tail<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    let start = if limit == 0 {
        0
    } else {
        items.len().saturating_sub(limit)
    };
    items[start..].to_vec()
}

impl<T: Clone> SignalStore<T> {
    /// Create a store holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            log: RwLock::new(Log {
                entries: VecDeque::new(),
                next_id: 1,
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append the entry built from the next id and the current time,
    /// evicting the oldest entries while over capacity.
    pub fn append_with(&self, build: impl FnOnce(u64, DateTime<Utc>) -> T) -> T {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);

        let id = log.next_id;
        log.next_id += 1;

        let entry = build(id, Utc::now());
        log.entries.push_back(entry.clone());
        while log.entries.len() > self.capacity {
            log.entries.pop_front();
        }

        entry
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> usize {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last `limit` entries in insertion order (0 = all), plus the retained count.
    pub fn recent(&self, limit: usize) -> SignalPage<T> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        let entries = log.entries.iter().cloned().collect::<Vec<_>>();

        SignalPage {
            signals: tail(&entries, limit),
            total: entries.len(),
        }
    }

    /// Count of retained entries matching `predicate`.
    pub fn count_where(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .filter(|entry| predicate(entry))
            .count()
    }
}

impl SignalStore<WhaleSignal> {
    pub fn append(&self, input: WhaleSignalInput) -> WhaleSignal {
        self.append_with(|id, timestamp| input.into_signal(id, timestamp))
    }

    /// Retained signals whose action is BUY.
    pub fn buy_count(&self) -> usize {
        self.count_where(|signal| signal.action == Some(Action::Buy))
    }
}

impl SignalStore<MemecoinSignal> {
    pub fn append(&self, input: MemecoinSignalInput) -> MemecoinSignal {
        self.append_with(|id, timestamp| input.into_signal(id, timestamp))
    }

    /// Retained signals sorted by score, highest first (stable; a missing
    /// score ranks as zero), then the trailing `limit` of that order.
    ///
    /// The trailing slice holds the lowest-scoring entries.
    pub fn ranked_tail(&self, limit: usize) -> SignalPage<MemecoinSignal> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        let mut ranked: Vec<MemecoinSignal> = log.entries.iter().cloned().collect();
        drop(log);

        ranked.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));

        SignalPage {
            signals: tail(&ranked, limit),
            total: ranked.len(),
        }
    }
}

impl Default for WhaleSignalStore {
    fn default() -> Self {
        Self::new(WHALE_SIGNAL_CAPACITY)
    }
}

impl Default for MemecoinSignalStore {
    fn default() -> Self {
        Self::new(MEMECOIN_SIGNAL_CAPACITY)
    }
}
