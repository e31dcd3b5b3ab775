//! Epoch-windowed reward budget.
//!
//! An epoch is `[start, start + duration)`. The tracker never runs on a
//! timer: every caller passes the current time to [`EpochBudgetTracker::refresh`],
//! which rolls a lapsed window over to a fresh one anchored at that time.
//!
//! # Invariants
//!
//! * `rewards_paid_this_epoch` only grows within a window, through
//!   [`commit`](EpochBudgetTracker::commit)
//! * a rollover happens at most once per observed boundary and never before
//!   `start + duration`

use serde::{Deserialize, Serialize};

/// Where the current time falls relative to the tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochPhase {
    /// `now < start + duration`.
    Open,
    /// `now >= start + duration`; the next refresh starts a new window.
    RolloverPending,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EpochBudgetTracker {
    epoch_start_time: u64,
    epoch_duration_secs: u64,
    rewards_paid_this_epoch: u128,
}

impl EpochBudgetTracker {
    pub fn new(epoch_start_time: u64, epoch_duration_secs: u64) -> Self {
        Self {
            epoch_start_time,
            epoch_duration_secs,
            rewards_paid_this_epoch: 0,
        }
    }

    pub fn epoch_start_time(&self) -> u64 {
        self.epoch_start_time
    }

    pub fn epoch_duration_secs(&self) -> u64 {
        self.epoch_duration_secs
    }

    pub fn rewards_paid_this_epoch(&self) -> u128 {
        self.rewards_paid_this_epoch
    }

    /// First second that lies outside the current window.
    pub fn epoch_end(&self) -> u64 {
        self.epoch_start_time.saturating_add(self.epoch_duration_secs)
    }

    pub fn phase(&self, now: u64) -> EpochPhase {
        if now >= self.epoch_end() {
            EpochPhase::RolloverPending
        } else {
            EpochPhase::Open
        }
    }

    /// Start a fresh window at `now` if the current one has lapsed.
    ///
    /// Returns `true` if a rollover happened.
    pub fn refresh(&mut self, now: u64) -> bool {
        if self.phase(now) == EpochPhase::Open {
            return false;
        }
        self.epoch_start_time = now;
        self.rewards_paid_this_epoch = 0;
        true
    }

    /// Budget left in this window: `max(0, reward_per_epoch - paid)`.
    pub fn remaining(&self, reward_per_epoch: u128) -> u128 {
        reward_per_epoch.saturating_sub(self.rewards_paid_this_epoch)
    }

    /// Clamp `amount` to the remaining budget. Does not record anything.
    pub fn reserve_reward_budget(&self, amount: u128, reward_per_epoch: u128) -> u128 {
        amount.min(self.remaining(reward_per_epoch))
    }

    /// Record `amount` as paid in this window.
    pub fn commit(&mut self, amount: u128) {
        self.rewards_paid_this_epoch = self.rewards_paid_this_epoch.saturating_add(amount);
    }

    /// Change the window length. Takes effect for the current window.
    pub fn set_duration(&mut self, epoch_duration_secs: u64) {
        self.epoch_duration_secs = epoch_duration_secs;
    }
}
