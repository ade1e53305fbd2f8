//! Score counter animation
//!
//! The displayed score climbs from 0 to the target in fixed ticks. Each tick adds
//! `target / (duration / tick)`; the value is clamped at the target and rounded
//! for display, so the counter never overshoots and always lands exactly.

use crate::processor::ticker::{PeriodicTask, TickControl};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counter state for one displayed score
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreAnimation {
    target: i64,
    increment: f64,
    steps: u64,
    tick: Duration,
    current: f64,
    taken: u64,
}

impl ScoreAnimation {
    pub fn new(target: i64, duration: Duration, tick: Duration) -> Self {
        let tick = tick.max(Duration::from_millis(1));
        let steps = (duration.as_millis() / tick.as_millis()).max(1) as u64;
        Self {
            target,
            increment: target as f64 / steps as f64,
            steps,
            tick,
            current: 0.0,
            taken: 0,
        }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    /// Rounded value currently displayed
    pub fn value(&self) -> i64 {
        self.current.round() as i64
    }

    pub fn is_finished(&self) -> bool {
        self.target <= 0 || self.taken >= self.steps || self.current >= self.target as f64
    }

    /// Advance one tick and return the displayed value
    pub fn step(&mut self) -> i64 {
        if self.is_finished() {
            self.current = self.target as f64;
            return self.target;
        }
        self.taken += 1;
        self.current += self.increment;
        if self.taken >= self.steps || self.current >= self.target as f64 {
            self.current = self.target as f64;
        }
        self.value()
    }

    /// Every displayed value from the first tick to the last
    pub fn frames(mut self) -> impl Iterator<Item = i64> {
        std::iter::from_fn(move || {
            if self.is_finished() {
                None
            } else {
                Some(self.step())
            }
        })
    }
}

/// A score counter driven by a background periodic task
///
/// The task stops itself at the target and is cancelled when the counter is
/// dropped, which happens when the result view goes away.
pub struct AnimatedScore {
    target: i64,
    value: Arc<AtomicI64>,
    task: PeriodicTask,
}

impl AnimatedScore {
    /// Start counting; `on_tick` runs after every update (used to request a repaint)
    pub fn start<F>(mut animation: ScoreAnimation, on_tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let target = animation.target();
        let value = Arc::new(AtomicI64::new(animation.value()));
        let shared = Arc::clone(&value);
        let interval = animation.tick;

        let task = PeriodicTask::spawn("score-animation", interval, move || {
            shared.store(animation.step(), Ordering::Relaxed);
            on_tick();
            if animation.is_finished() {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });

        if target <= 0 {
            value.store(target, Ordering::Relaxed);
        }
        Self {
            target,
            value,
            task,
        }
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.value() == self.target
    }

    /// Stop counting where it is
    pub fn cancel(&mut self) {
        self.task.cancel();
    }
}
