//! Debounce scheduler: coalesces bursts of saves into one notification per article.
//!
//! Every qualifying save calls [`DebounceScheduler::arm`]. Arming an article
//! that is already armed replaces its timer: the old timer is aborted, the
//! article's generation is bumped and a fresh quiet period starts. Only when
//! a quiet period elapses without another arm does the article fire, and the
//! fired notification is pushed to the dispatch worker's channel.
//!
//! Per article the states are:
//!
//! ```text
//! Idle ──arm──► Armed ──quiet period──► Fired ──► Idle
//!                │  ▲
//!                └──┘ arm (abort timer, generation + 1)
//! Armed ──cancel──► Idle
//! ```
//!
//! All transitions go through one short critical section, so arm, cancel,
//! flush and expiry of the same article are linearised. Aborting a timer is
//! best effort (it may already be waiting for the lock), so an expiring timer
//! also checks that its generation is still the armed one and drops itself
//! otherwise. Together these give at most one fire per arm, and the newest
//! arm always fires unless it is cancelled.
//!
//! State is held in memory only. A restart drops every armed notification;
//! those edits are simply not announced.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use postbell_common::error::AppError;
use postbell_common::types::{ArticleId, FiredNotification, PendingNotification};

/// Stand-in deadline for quiet periods too long to represent.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// An armed article: its public snapshot plus the timer that will expire it.
struct Slot {
    pending: PendingNotification,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    slots: HashMap<ArticleId, Slot>,
    /// Last generation handed out per article. Survives fires and cancels so
    /// generations never repeat for an article.
    generations: HashMap<ArticleId, u64>,
}

impl State {
    fn next_generation(&mut self, article_id: ArticleId) -> u64 {
        let generation = self.generations.entry(article_id).or_insert(0);
        *generation += 1;
        *generation
    }
}

struct Inner {
    quiet_period: Duration,
    quiet_delta: TimeDelta,
    state: Mutex<State>,
    fired_tx: mpsc::UnboundedSender<FiredNotification>,
}

impl Inner {
    /// Timer callback. Fires only if `generation` is still the armed one.
    fn expire(&self, article_id: ArticleId, generation: u64) {
        let mut state = self.state.lock();

        let current = state.slots.get(&article_id).map(|s| s.pending.generation);
        if current != Some(generation) {
            let race = AppError::SchedulingRace {
                article_id,
                generation,
                current,
            };
            tracing::debug!(error = %race, "Discarding superseded timer");
            return;
        }

        if let Some(slot) = state.slots.remove(&article_id) {
            self.emit(&slot.pending, "quiet period elapsed");
        }
    }

    fn emit(&self, pending: &PendingNotification, reason: &'static str) {
        let fired = FiredNotification {
            article_id: pending.article_id,
            generation: pending.generation,
        };

        tracing::info!(
            article_id = %pending.article_id,
            generation = pending.generation,
            armed_at = %pending.armed_at,
            reason,
            "Notification fired"
        );

        if self.fired_tx.send(fired).is_err() {
            tracing::warn!(
                article_id = %pending.article_id,
                generation = pending.generation,
                "Dispatch worker is gone, fired notification dropped"
            );
        }
    }
}

/// Per-article re-armable delayed trigger.
///
/// Cloning is cheap; clones share the same state and output channel. Arming
/// spawns a timer task, so it must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct DebounceScheduler {
    inner: Arc<Inner>,
}

impl DebounceScheduler {
    /// Create a scheduler and the receiving end of its fire channel.
    pub fn new(quiet_period: Duration) -> (Self, mpsc::UnboundedReceiver<FiredNotification>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let inner = Inner {
            quiet_period,
            quiet_delta: TimeDelta::from_std(quiet_period).unwrap_or(TimeDelta::MAX),
            state: Mutex::new(State::default()),
            fired_tx,
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            fired_rx,
        )
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Record a qualifying save: (re)start the article's quiet period.
    ///
    /// Returns the generation that will fire if no later arm supersedes it.
    /// Never blocks on I/O.
    pub fn arm(&self, article_id: ArticleId) -> u64 {
        let mut state = self.inner.state.lock();
        let generation = state.next_generation(article_id);

        if let Some(previous) = state.slots.remove(&article_id) {
            previous.timer.abort();
            tracing::debug!(
                article_id = %article_id,
                superseded = previous.pending.generation,
                generation,
                "Re-armed pending notification"
            );
        } else {
            tracing::debug!(article_id = %article_id, generation, "Armed notification");
        }

        let armed_at = Utc::now();
        let fire_at = armed_at
            .checked_add_signed(self.inner.quiet_delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let now = Instant::now();
        let deadline = now
            .checked_add(self.inner.quiet_period)
            .unwrap_or_else(|| now + FAR_FUTURE);

        // The slot is inserted before the lock is released, so the timer can
        // never look for it too early, even with a zero quiet period.
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(article_id, generation);
            }
        });

        state.slots.insert(
            article_id,
            Slot {
                pending: PendingNotification {
                    article_id,
                    armed_at,
                    fire_at,
                    generation,
                },
                timer,
            },
        );

        generation
    }

    /// Drop the article's pending notification without firing it.
    ///
    /// Returns whether anything was armed. Cancelling an idle article is a no-op.
    pub fn cancel(&self, article_id: ArticleId) -> bool {
        let removed = self.inner.state.lock().slots.remove(&article_id);

        match removed {
            Some(slot) => {
                slot.timer.abort();
                tracing::debug!(
                    article_id = %article_id,
                    generation = slot.pending.generation,
                    "Cancelled pending notification"
                );
                true
            }
            None => false,
        }
    }

    /// Fire the article's pending notification now instead of waiting.
    ///
    /// Consumes it exactly as an expiry would; returns `false` if nothing was armed.
    pub fn flush(&self, article_id: ArticleId) -> bool {
        let mut state = self.inner.state.lock();

        match state.slots.remove(&article_id) {
            Some(slot) => {
                slot.timer.abort();
                self.inner.emit(&slot.pending, "flushed");
                true
            }
            None => false,
        }
    }

    pub fn pending(&self, article_id: ArticleId) -> Option<PendingNotification> {
        self.inner
            .state
            .lock()
            .slots
            .get(&article_id)
            .map(|slot| slot.pending.clone())
    }

    /// Snapshot of all armed notifications, soonest first.
    pub fn pending_all(&self) -> Vec<PendingNotification> {
        let mut pending: Vec<PendingNotification> = self
            .inner
            .state
            .lock()
            .slots
            .values()
            .map(|slot| slot.pending.clone())
            .collect();
        pending.sort_by_key(|p| (p.fire_at, p.article_id));
        pending
    }

    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().slots.len()
    }

    /// Abort every timer. Returns how many armed notifications were dropped.
    pub fn shutdown(&self) -> usize {
        let slots: Vec<Slot> = {
            let mut state = self.inner.state.lock();
            state.slots.drain().map(|(_, slot)| slot).collect()
        };

        for slot in &slots {
            slot.timer.abort();
        }

        if !slots.is_empty() {
            tracing::warn!(
                dropped = slots.len(),
                "Scheduler stopped with armed notifications; they will not be sent"
            );
        }
        slots.len()
    }
}
