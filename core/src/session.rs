//! Session-scoped state shared between the stores.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, NaiveDate};

/// Flags that live for one app session.
#[derive(Debug, Default)]
pub struct SessionState {
    has_seen_yesterday: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen_yesterday(&self) -> bool {
        self.has_seen_yesterday.load(Ordering::Acquire)
    }

    pub fn mark_yesterday_seen(&self) {
        self.has_seen_yesterday.store(true, Ordering::Release);
    }
}

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The device's local date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
