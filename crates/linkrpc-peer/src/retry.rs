use std::time::Duration;

/// Adaptive short-timeout pair shared by both handshake directions.
///
/// Every handshake starts from the configured baselines. After a failed
/// attempt the budgets grow — geometrically on the master, additively on the
/// slave — capped at the handshake's outer deadline. Growing budgets break
/// the livelock where both sides keep missing each other's window by the
/// same margin.
#[derive(Debug, Clone)]
pub struct RetryTimeouts {
    put_short: Duration,
    get_short: Duration,
    put_reset: Duration,
    get_reset: Duration,
}

const ADDITIVE_STEP: Duration = Duration::from_millis(1);

impl RetryTimeouts {
    /// Create with baseline budgets.
    pub fn new(put_short: Duration, get_short: Duration) -> Self {
        Self {
            put_short,
            get_short,
            put_reset: put_short,
            get_reset: get_short,
        }
    }

    /// Restore both budgets to their baselines.
    pub fn reset(&mut self) {
        self.put_short = self.put_reset;
        self.get_short = self.get_reset;
    }

    /// Current `(put, get)` budgets.
    pub fn shorts(&self) -> (Duration, Duration) {
        (self.put_short, self.get_short)
    }

    /// Grow both budgets by 3/2, capped at `cap`.
    pub fn escalate_multiplicative(&mut self, cap: Duration) {
        self.put_short = ((self.put_short * 3) / 2).min(cap);
        self.get_short = ((self.get_short * 3) / 2).min(cap);
    }

    /// Grow both budgets by 1 ms, capped at `cap`.
    pub fn escalate_additive(&mut self, cap: Duration) {
        self.put_short = (self.put_short + ADDITIVE_STEP).min(cap);
        self.get_short = (self.get_short + ADDITIVE_STEP).min(cap);
    }
}
