use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Time source for session timers.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    /// Frozen at a point in time; only moves when advanced.
    Manual(Instant),
}

impl Default for Clock {
    fn default() -> Self {
        Clock::System
    }
}

impl Clock {
    pub fn manual() -> Self {
        Clock::Manual(Instant::now())
    }

    pub fn now(&self) -> Instant {
        match self {
            Clock::System => Instant::now(),
            Clock::Manual(t) => *t,
        }
    }

    /// Move a manual clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Manual(t) = self {
            *t += delta;
        }
    }
}

/// A one-shot scheduled transition. Dropping the handle cancels it: the
/// owner only acts on a handle it still holds.
#[derive(Debug, PartialEq, Eq)]
pub struct TimerHandle {
    id: u64,
    deadline: Instant,
}

impl TimerHandle {
    pub fn schedule(now: Instant, delay: Duration) -> Self {
        Self {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            deadline: now + delay,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Per-second countdown for timed sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    next_tick: Instant,
}

impl Countdown {
    pub fn start(seconds: u32, now: Instant) -> Self {
        Self {
            remaining: seconds,
            next_tick: now + TICK,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Consume one second and schedule the following tick.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.next_tick += TICK;
        self.remaining
    }
}

/// `M:SS`, e.g. `4:07` or `65:00`.
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
