use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Timing rules that decide when an unframed reply is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStrategy {
    /// Quiet period after the last chunk that ends the reply (milliseconds)
    #[serde(default = "default_idle_ms")]
    pub idle_ms: u64,

    /// Hard ceiling for the whole session, connect included (milliseconds)
    #[serde(default = "default_overall_ms")]
    pub overall_ms: u64,
}

fn default_idle_ms() -> u64 {
    250
}
fn default_overall_ms() -> u64 {
    5000
}

impl Default for CompletionStrategy {
    fn default() -> Self {
        Self {
            idle_ms: default_idle_ms(),
            overall_ms: default_overall_ms(),
        }
    }
}

impl CompletionStrategy {
    pub fn new(idle: Duration, overall: Duration) -> Self {
        Self {
            idle_ms: idle.as_millis() as u64,
            overall_ms: overall.as_millis() as u64,
        }
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    pub fn overall(&self) -> Duration {
        Duration::from_millis(self.overall_ms)
    }
}

/// Why a session stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Completion {
    /// No data for the idle threshold after at least one chunk
    Idle,
    /// The daemon closed its side
    RemoteClosed,
    /// The overall ceiling passed first
    OverallTimeout,
}

/// Session reading state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Connected, nothing received yet
    Idle,
    /// At least one chunk received; idle timer armed
    Receiving { last_activity: Instant },
    /// Terminal
    Finalized(Completion),
}

/// Drives the idle/overall completion rules from externally supplied instants.
///
/// No I/O and no timers of its own; the exchange loop sleeps until
/// [`next_deadline`](Self::next_deadline) and reports back with [`tick`](Self::tick).
#[derive(Debug)]
pub struct CompletionTracker {
    strategy: CompletionStrategy,
    started: Instant,
    state: CompletionState,
    received: usize,
}

impl CompletionTracker {
    pub fn new(strategy: CompletionStrategy, started: Instant) -> Self {
        Self {
            strategy,
            started,
            state: CompletionState::Idle,
            received: 0,
        }
    }

    pub fn strategy(&self) -> &CompletionStrategy {
        &self.strategy
    }

    pub fn state(&self) -> CompletionState {
        self.state
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn completion(&self) -> Option<Completion> {
        match self.state {
            CompletionState::Finalized(c) => Some(c),
            _ => None,
        }
    }

    pub fn overall_deadline(&self) -> Instant {
        self.started + self.strategy.overall()
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        match self.state {
            CompletionState::Receiving { last_activity } => Some(last_activity + self.strategy.idle()),
            _ => None,
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) could change the state.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.completion().is_some() {
            return None;
        }
        let overall = self.overall_deadline();
        Some(match self.idle_deadline() {
            Some(idle) if idle < overall => idle,
            _ => overall,
        })
    }

    /// A chunk of `len` bytes arrived at `now`; rearms the idle timer.
    ///
    /// Data after finalization is ignored.
    pub fn on_data(&mut self, len: usize, now: Instant) {
        if self.completion().is_some() {
            return;
        }
        self.received += len;
        self.state = CompletionState::Receiving { last_activity: now };
    }

    /// The remote side reached end-of-stream.
    pub fn on_remote_closed(&mut self) {
        if self.completion().is_none() {
            self.state = CompletionState::Finalized(Completion::RemoteClosed);
        }
    }

    /// Re-evaluate timers at `now`; returns the completion if the session is done.
    pub fn tick(&mut self, now: Instant) -> Option<Completion> {
        if self.completion().is_none() {
            if let Some(idle) = self.idle_deadline() {
                if now >= idle {
                    self.state = CompletionState::Finalized(Completion::Idle);
                }
            }
        }
        if self.completion().is_none() && now >= self.overall_deadline() {
            self.state = CompletionState::Finalized(Completion::OverallTimeout);
        }
        self.completion()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}
