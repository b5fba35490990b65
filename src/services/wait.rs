//! Bounded polling until a variant reaches a target status.

use std::time::{Duration, Instant};

use tracing::debug;

use super::oracle::StatusOracle;
use super::status::Status;
use super::variant::Variant;

/// Samples the status oracle on a fixed interval.
#[derive(Clone)]
pub struct Poller {
    oracle: StatusOracle,
    interval: Duration,
}

impl Poller {
    pub fn new(oracle: StatusOracle, interval: Duration) -> Self {
        Self { oracle, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until `variant` reports `target` or `timeout` elapses.
    ///
    /// Returns `false` on timeout. A vanished service satisfies a wait
    /// for `Stopped`. Never sleeps past the deadline, so the call returns
    /// within `timeout` plus one sample.
    pub fn wait_for(&self, variant: &Variant, target: Status, timeout: Duration) -> bool {
        let start = Instant::now();
        let mut samples = 0u32;

        loop {
            let observed = self.oracle.query_status(variant);
            samples += 1;

            if observed == target || (target == Status::Stopped && observed == Status::NotInstalled) {
                debug!(
                    service = %variant.registry_name,
                    target = ?target,
                    observed = ?observed,
                    samples,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Target status reached"
                );
                return true;
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                debug!(
                    service = %variant.registry_name,
                    target = ?target,
                    last = ?observed,
                    samples,
                    "Timed out waiting for status"
                );
                return false;
            }

            std::thread::sleep(self.interval.min(timeout - elapsed));
        }
    }
}
