use std::time::Duration;

pub const DEFAULT_START_SECS: u32 = 75;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

type Handler = Box<dyn FnMut(u32)>;

/// What a single `tick` did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running; nothing happened.
    Idle,
    /// One second came off; carries what is left.
    Ticked(u32),
    /// This tick drained the clock and stopped the timer.
    Ended,
}

/// Countdown clock with start/tick/end observers.
///
/// The timer never schedules itself. The owner calls [`Countdown::advance`]
/// with elapsed time from its event loop, which converts it into whole
/// ticks. Once stopped, pending time is discarded and `tick` is inert, so a
/// torn-down session never receives stale callbacks.
pub struct Countdown {
    start_secs: u32,
    interval: Duration,
    remaining: u32,
    running: bool,
    pending: Duration,
    on_start: Vec<Handler>,
    on_tick: Vec<Handler>,
    on_end: Vec<Handler>,
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("start_secs", &self.start_secs)
            .field("interval", &self.interval)
            .field("remaining", &self.remaining)
            .field("running", &self.running)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(
            DEFAULT_START_SECS,
            Duration::from_millis(DEFAULT_INTERVAL_MS),
        )
    }
}

impl Countdown {
    pub fn new(start_secs: u32, interval: Duration) -> Self {
        Self {
            start_secs,
            interval,
            remaining: 0,
            running: false,
            pending: Duration::ZERO,
            on_start: Vec::new(),
            on_tick: Vec::new(),
            on_end: Vec::new(),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start_secs(&self) -> u32 {
        self.start_secs
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn on_start(&mut self, handler: impl FnMut(u32) + 'static) {
        self.on_start.push(Box::new(handler));
    }

    pub fn on_tick(&mut self, handler: impl FnMut(u32) + 'static) {
        self.on_tick.push(Box::new(handler));
    }

    pub fn on_end(&mut self, handler: impl FnMut(u32) + 'static) {
        self.on_end.push(Box::new(handler));
    }

    /// Resets the clock to its configured start and begins running.
    pub fn start(&mut self) {
        self.remaining = self.start_secs;
        self.running = true;
        self.pending = Duration::ZERO;
        log::debug!("countdown started at {}s", self.remaining);
        emit(&mut self.on_start, self.remaining);
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop();
            return TickOutcome::Ended;
        }

        emit(&mut self.on_tick, self.remaining);
        TickOutcome::Ticked(self.remaining)
    }

    /// Deducts `amount` seconds, clamped at zero. Does not stop the timer;
    /// the next tick notices the empty clock.
    pub fn penalize(&mut self, amount: u32) {
        self.remaining = self.remaining.saturating_sub(amount);
        log::debug!("countdown penalized {amount}s, {}s left", self.remaining);
    }

    /// Halts the countdown and notifies `on_end` observers. Calling this on
    /// a stopped timer does nothing.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.pending = Duration::ZERO;
        log::debug!("countdown stopped with {}s left", self.remaining);
        emit(&mut self.on_end, self.remaining);
    }

    /// Feeds elapsed wall time into the timer, firing one tick per whole
    /// interval. Returns the last non-idle outcome, if any tick fired.
    pub fn advance(&mut self, elapsed: Duration) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }

        self.pending += elapsed;
        let mut last = None;
        while self.running && self.pending >= self.interval {
            self.pending -= self.interval;
            last = Some(self.tick());
        }
        last
    }
}

fn emit(handlers: &mut [Handler], remaining: u32) {
    for handler in handlers.iter_mut() {
        handler(remaining);
    }
}
