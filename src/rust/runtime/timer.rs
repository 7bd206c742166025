// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::std::time::{Duration, Instant};

//==============================================================================
// Structures
//==============================================================================

/// A monotonic clock the host advances explicitly.
///
/// The engine never consults wall-clock time on its own; it reads `now()`
/// from the value most recently pushed by the host. Hosts advance the clock
/// from real time on every loop iteration, while tests advance it manually
/// for deterministic retransmission behavior.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    now: Instant,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Clock {
    pub fn new(now: Instant) -> Self {
        Self { now }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn advance_clock(&mut self, now: Instant) {
        assert!(self.now <= now);
        self.now = now;
    }

    pub fn advance_by(&mut self, delta: Duration) {
        self.now += delta;
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::Clock;
    use ::anyhow::Result;
    use ::std::time::{Duration, Instant};

    #[test]
    fn advances_monotonically() -> Result<()> {
        let start: Instant = Instant::now();
        let mut clock: Clock = Clock::new(start);
        crate::ensure_eq!(clock.now(), start);

        clock.advance_by(Duration::from_millis(250));
        crate::ensure_eq!(clock.now(), start + Duration::from_millis(250));

        clock.advance_clock(start + Duration::from_secs(1));
        crate::ensure_eq!(clock.now(), start + Duration::from_secs(1));

        Ok(())
    }
}
