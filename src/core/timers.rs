//! Cooldowns and cooperative repeating tasks.
//!
//! Low-frequency work (avoidance recompute, corpse refinement) does not run
//! every frame. Each owner keeps a [`RepeatingTask`] next to its state and
//! polls it from its own tick; cancelling the task is synchronous, so a
//! cancelled task can never fire against state that was reset after it.

/// Countdown timer for attack and ability cooldowns.
///
/// The countdown keeps running below zero; anything `<= 0` counts as ready.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    /// A cooldown that is ready immediately.
    pub const fn ready() -> Self {
        Self { remaining: 0.0 }
    }

    /// A cooldown that becomes ready after `duration` seconds.
    pub const fn armed(duration: f32) -> Self {
        Self { remaining: duration }
    }

    pub fn arm(&mut self, duration: f32) {
        self.remaining = duration;
    }

    pub fn tick(&mut self, delta: f32) {
        self.remaining -= delta;
    }

    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// A cooperatively scheduled task that fires once every `period` seconds
/// while running.
///
/// A task that was started fires on its first poll. Late polls do not queue
/// catch-up runs: after firing, the next run is a full period away.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatingTask {
    period: f32,
    next_run_in: Option<f32>,
}

impl RepeatingTask {
    /// Create a stopped task.
    pub const fn new(period: f32) -> Self {
        Self {
            period,
            next_run_in: None,
        }
    }

    /// Create a task that fires on its first poll.
    pub const fn started(period: f32) -> Self {
        Self {
            period,
            next_run_in: Some(0.0),
        }
    }

    pub fn start(&mut self) {
        self.next_run_in = Some(0.0);
    }

    pub fn cancel(&mut self) {
        self.next_run_in = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_run_in.is_some()
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Advance the task by `delta` seconds. Returns `true` when the task is
    /// due this tick.
    pub fn poll(&mut self, delta: f32) -> bool {
        let Some(next) = self.next_run_in.as_mut() else {
            return false;
        };

        if *next > 0.0 {
            *next -= delta;
            if *next > 0.0 {
                return false;
            }
        }

        *next = self.period.max(0.0);
        true
    }
}
