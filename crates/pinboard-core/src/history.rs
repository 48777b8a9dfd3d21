//! Undo/redo history over full board snapshots.

use std::collections::VecDeque;
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use crate::board::BoardSnapshot;
use crate::config::{BoardConfig, DEFAULT_HISTORY_CAPACITY};

/// Bounded undo/redo stack with a cursor.
///
/// Entries after the cursor form the redo branch and are discarded on every
/// push. Once the stack exceeds its capacity the oldest entry is evicted.
/// Returned states are clones, so callers may mutate them freely.
#[derive(Debug, Clone)]
pub struct HistoryManager<S = BoardSnapshot> {
    entries: VecDeque<S>,
    cursor: usize,
    capacity: usize,
}

impl<S: Clone> Default for HistoryManager<S> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<S: Clone> HistoryManager<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `capacity` states (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Reset the history so that `state` is its only entry.
    pub fn initialize(&mut self, state: &S) {
        self.clear();
        self.push(state);
    }

    /// Record a new state at the cursor, dropping any redo branch.
    pub fn push(&mut self, state: &S) {
        if !self.entries.is_empty() && self.cursor + 1 < self.entries.len() {
            let dropped = self.entries.len() - (self.cursor + 1);
            self.entries.truncate(self.cursor + 1);
            log::debug!("History: discarded {dropped} redo state(s)");
        }

        self.entries.push_back(state.clone());
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
            log::debug!("History: evicted oldest state (capacity {})", self.capacity);
        }
    }

    /// Step back one state. Returns `None` when already at the oldest state.
    pub fn undo(&mut self) -> Option<S> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward one state. Returns `None` when already at the newest state.
    pub fn redo(&mut self) -> Option<S> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// State at the cursor.
    pub fn current(&self) -> Option<S> {
        self.entries.get(self.cursor).cloned()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Position of the cursor, if the history has any entries.
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }
}

/// Debounced recorder in front of a [`HistoryManager`].
///
/// Every change re-arms a timer and replaces the pending snapshot; the
/// snapshot is pushed only after a quiet period, so a burst of edits becomes
/// one history entry. Undo and redo arm a guard that swallows the change
/// notification produced by applying the restored state. Only a report of
/// exactly that state is swallowed, so a host that never reports the restore
/// still has its next edit recorded.
#[derive(Debug, Clone)]
pub struct HistoryRecorder<S = BoardSnapshot> {
    history: HistoryManager<S>,
    debounce: Duration,
    pending: Option<(Instant, S)>,
    restoring: Option<S>,
}

impl<S: Clone + PartialEq> HistoryRecorder<S> {
    pub fn new(history: HistoryManager<S>, debounce: Duration) -> Self {
        Self {
            history,
            debounce,
            pending: None,
            restoring: None,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(
            HistoryManager::with_capacity(config.history_capacity),
            config.history_debounce(),
        )
    }

    /// Reset the history to a freshly loaded state.
    pub fn initialize(&mut self, state: &S) {
        self.pending = None;
        self.restoring = None;
        self.history.initialize(state);
    }

    /// Note that the board changed to `state`.
    pub fn record_change(&mut self, state: S) {
        self.record_change_at(state, Instant::now());
    }

    /// Like [`record_change`](Self::record_change) with an explicit clock.
    pub fn record_change_at(&mut self, state: S, now: Instant) {
        if self.restoring.take().is_some_and(|restored| restored == state) {
            return;
        }
        self.pending = Some((now + self.debounce, state));
    }

    /// Push the pending snapshot if its quiet period elapsed.
    /// Returns true when a snapshot was pushed.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        let due = matches!(&self.pending, Some((deadline, _)) if now >= *deadline);
        due && self.flush()
    }

    /// Push the pending snapshot immediately, if any.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some((_, state)) => {
                self.history.push(&state);
                true
            }
            None => false,
        }
    }

    /// Time left until the pending snapshot is pushed.
    pub fn time_until_flush(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(deadline, _)| deadline.saturating_duration_since(now))
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Undo, committing any pending burst first so it can be undone too.
    pub fn undo(&mut self) -> Option<S> {
        self.flush();
        let state = self.history.undo()?;
        self.restoring = Some(state.clone());
        Some(state)
    }

    /// Redo, committing any pending burst first (which drops the redo branch).
    pub fn redo(&mut self) -> Option<S> {
        self.flush();
        let state = self.history.redo()?;
        self.restoring = Some(state.clone());
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || (self.pending.is_some() && !self.history.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        self.pending.is_none() && self.history.can_redo()
    }

    pub fn history(&self) -> &HistoryManager<S> {
        &self.history
    }
}
