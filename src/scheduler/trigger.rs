//! Cycle trigger system
//!
//! This module provides the tick gate that decides when a cycle fires and a
//! tokio driver that feeds ticks into a [`CycleScheduler`] on a fixed period.

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use super::cycle::{CycleReport, CycleScheduler};
use super::error::{SchedulerError, SchedulerResult};

// ============================================================================
// Cycle Timer
// ============================================================================

/// Counts ticks towards the next cycle
///
/// For a delay `D` the timer fires on every `D`-th tick, the first time on
/// tick `D - 1` (0-indexed). The delay is passed on every tick so a reload
/// takes effect without resetting the count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleTimer {
    elapsed: u32,
}

impl CycleTimer {
    /// Create a timer with no elapsed ticks
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick; returns `true` when a cycle should fire
    pub fn tick(&mut self, delay: u32) -> bool {
        if self.elapsed.saturating_add(1) >= delay {
            self.elapsed = 0;
            true
        } else {
            self.elapsed += 1;
            false
        }
    }

    /// Ticks counted since the last fire
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Restart counting from zero
    pub fn reset(&mut self) {
        self.elapsed = 0;
    }
}

// ============================================================================
// Tick Events
// ============================================================================

/// Events emitted by the tick driver
#[derive(Debug, Clone)]
pub enum TickEvent {
    /// A cycle fired on this tick
    CycleFired(CycleReport),

    /// The driver loop ended
    Stopped { ticks: u64 },
}

// ============================================================================
// Tick Driver
// ============================================================================

/// Feeds ticks into a scheduler on a fixed period
pub struct TickDriver {
    period: Duration,
    event_sender: broadcast::Sender<TickEvent>,
}

impl TickDriver {
    /// Create a driver ticking every `period`
    pub fn new(period: Duration) -> SchedulerResult<Self> {
        if period.is_zero() {
            return Err(SchedulerError::driver_config(
                "period",
                "Tick period must be greater than zero",
            ));
        }

        let (event_sender, _) = broadcast::channel(100);

        Ok(Self {
            period,
            event_sender,
        })
    }

    /// Configured tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Subscribe to tick events
    pub fn subscribe(&self) -> broadcast::Receiver<TickEvent> {
        self.event_sender.subscribe()
    }

    /// Drive `scheduler` until `shutdown` resolves or `max_ticks` ticks ran
    ///
    /// Returns the number of ticks delivered.
    pub async fn run<F>(
        &self,
        scheduler: &mut CycleScheduler,
        max_ticks: Option<u64>,
        shutdown: F,
    ) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut ticks = 0u64;

        loop {
            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    ticks += 1;
                    if let Some(report) = scheduler.on_tick() {
                        // No subscribers is fine
                        let _ = self.event_sender.send(TickEvent::CycleFired(report));
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!(ticks, "Tick driver received shutdown");
                    break;
                }
            }
        }

        let _ = self.event_sender.send(TickEvent::Stopped { ticks });
        ticks
    }
}

impl std::fmt::Debug for TickDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickDriver")
            .field("period", &self.period)
            .field("subscribers", &self.event_sender.receiver_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
