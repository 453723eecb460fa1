use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct State {
    fail_count: u32,
    open_until: Option<Instant>,
}

/// Consecutive-failure circuit breaker.
///
/// `threshold` consecutive failures open the circuit for `cooldown`; any
/// success closes it and clears the counter.
#[derive(Debug)]
pub struct Circuit {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<State>,
}

impl Circuit {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            state: Mutex::new(State::default()),
        }
    }

    /// Whether a call may proceed.
    pub fn allow(&self) -> bool {
        let state = self.state.lock().expect("circuit lock");
        match state.open_until {
            Some(until) => Instant::now() >= until,
            None => true,
        }
    }

    pub fn on_success(&self) {
        let mut state = self.state.lock().expect("circuit lock");
        state.fail_count = 0;
        state.open_until = None;
    }

    /// Record a failure; returns true when this failure opened the circuit.
    pub fn on_failure(&self) -> bool {
        let mut state = self.state.lock().expect("circuit lock");
        state.fail_count += 1;
        if state.fail_count >= self.threshold {
            state.open_until = Some(Instant::now() + self.cooldown);
            true
        } else {
            false
        }
    }
}
