/// Operating system services needed to watch idle time and start the screen saver.
pub trait Host {
    /// Returns milliseconds since the last keyboard or pointer input, system-wide.
    ///
    /// Reports 0 when the system cannot tell, so a failed query never starts the screen saver.
    fn query_idle_ms(&self) -> u32;

    /// Asks the shell to start the screen saver. Fire-and-forget.
    fn trigger_screensaver(&self);
}

const TICK_PERIOD: u64 = 1 << 32;

/// Computes idle time from the current 64-bit tick count and the 32-bit tick of the last input.
///
/// The last input tick wraps every ~49.7 days, so it is placed into the period of `now`
/// before subtracting. The result saturates at `u32::MAX`.
pub fn idle_ms_since(now: u64, last_input: Option<u32>) -> u32 {
    let Some(last_input) = last_input else {
        return 0;
    };
    let mut last_input = (now & !(TICK_PERIOD - 1)) | u64::from(last_input);
    if last_input > now {
        // last input happened in the previous period
        let Some(previous) = last_input.checked_sub(TICK_PERIOD) else {
            return 0;
        };
        last_input = previous;
    }
    u32::try_from(now.saturating_sub(last_input)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_query_is_zero() {
        assert_eq!(idle_ms_since(1_000_000, None), 0);
    }

    #[test]
    fn within_first_period() {
        assert_eq!(idle_ms_since(45_000, Some(15_000)), 30_000);
        assert_eq!(idle_ms_since(15_000, Some(15_000)), 0);
    }

    #[test]
    fn last_input_before_wrap() {
        // the 32-bit tick wrapped between the last input and now
        let now = TICK_PERIOD + 500;
        let last_input = u32::MAX - 499;
        assert_eq!(idle_ms_since(now, Some(last_input)), 1000);
    }

    #[test]
    fn long_uptime() {
        let now = 7 * TICK_PERIOD + 90_000;
        assert_eq!(idle_ms_since(now, Some(30_000)), 60_000);
    }

    #[test]
    fn early_boot_never_underflows() {
        // a tick newer than `now` cannot be lifted into a previous period
        assert_eq!(idle_ms_since(100, Some(200)), 0);
    }

    #[test]
    fn monotonic_without_input() {
        let last_input = Some(u32::MAX - 2_000);
        let mut previous = 0;
        for now in (u64::from(u32::MAX) - 2_000..u64::from(u32::MAX) + 10_000).step_by(997) {
            let idle = idle_ms_since(now, last_input);
            assert!(idle >= previous, "{} < {} at {}", idle, previous, now);
            previous = idle;
        }
    }
}
