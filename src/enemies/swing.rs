//! Attack phase driver.
//!
//! An attack is split into three phases: it begins when the brain decides to
//! attack (the swing is inserted), resolves partway through (`hit_fraction`),
//! and ends when the swing runs out. The brain is told about each boundary
//! exactly once.

use bevy::prelude::*;

/// An attack in progress.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct AttackSwing {
    duration: f32,
    hit_fraction: f32,
    elapsed: f32,
    resolved: bool,
}

/// Phase boundaries crossed by one [`AttackSwing::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwingProgress {
    /// The attack lands this tick
    pub resolve: bool,
    /// The attack is over this tick
    pub finished: bool,
}

impl AttackSwing {
    pub fn new(duration: f32, hit_fraction: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            hit_fraction: hit_fraction.clamp(0.0, 1.0),
            elapsed: 0.0,
            resolved: false,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn advance(&mut self, delta: f32) -> SwingProgress {
        self.elapsed += delta.max(0.0);

        let mut progress = SwingProgress::default();
        if !self.resolved && self.elapsed >= self.duration * self.hit_fraction {
            self.resolved = true;
            progress.resolve = true;
        }
        progress.finished = self.elapsed >= self.duration;
        progress
    }
}
