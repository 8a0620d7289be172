use crate::host::Host;

/// Interval between idle checks.
pub const POLL_INTERVAL_MS: u32 = 1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollState {
    Watching,
    /// Terminal, entered on application exit.
    Stopped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Stopped,
    Active { idle_ms: u32 },
    Triggered { idle_ms: u32 },
}

/// Compares idle time against the limit once per tick and starts the screen saver when it is reached.
///
/// Triggering does not reset anything: as long as the machine stays idle past the limit,
/// every tick sends the command again.
pub struct PollLoop {
    state: PollState,
    streak: u32,
}

impl PollLoop {
    pub fn new() -> Self {
        PollLoop {
            state: PollState::Watching,
            streak: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn tick(&mut self, host: &impl Host, idle_limit_ms: u32) -> TickOutcome {
        if self.state == PollState::Stopped {
            return TickOutcome::Stopped;
        }
        let idle_ms = host.query_idle_ms();
        if idle_ms < idle_limit_ms {
            if self.streak > 0 {
                debug!("Input resumed after {} screen saver requests", self.streak);
                self.streak = 0;
            }
            return TickOutcome::Active { idle_ms };
        }
        host.trigger_screensaver();
        self.streak = self.streak.saturating_add(1);
        if self.streak == 1 {
            info!(
                "Idle for {} ms (limit {} ms), requesting screen saver",
                idle_ms, idle_limit_ms
            );
        } else {
            debug!("Still idle for {} ms, request #{}", idle_ms, self.streak);
        }
        TickOutcome::Triggered { idle_ms }
    }

    pub fn stop(&mut self) {
        if self.state != PollState::Stopped {
            info!("Idle watch stopped");
            self.state = PollState::Stopped;
        }
    }
}
