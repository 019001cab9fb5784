use std::time::{Duration, Instant};

/// Trait for high-precision monotonic timers.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);

    /// Blocks until the monotonic clock reaches `deadline`. Returns false
    /// without waiting if the deadline has already passed.
    fn wait_until(&self, deadline: Self::Timestamp) -> bool;
}

/// The last stretch of a wait is handed to a spin loop, because the OS
/// sleep primitives only guarantee wake-up at scheduler granularity.
const SPIN_TAIL_NS: u64 = 300_000;

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }

    fn wait_until(&self, deadline: u64) -> bool {
        let now = self.now();
        if now >= deadline {
            return false;
        }
        let remaining = deadline - now;
        if remaining > SPIN_TAIL_NS {
            self.high_precision_sleep(Duration::from_nanos(remaining - SPIN_TAIL_NS));
        }
        while self.now() < deadline {
            std::hint::spin_loop();
        }
        true
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject,
        };

        unsafe {
            let Ok(timer) = CreateWaitableTimerW(None, true, None) else {
                std::thread::sleep(duration);
                return;
            };

            // Negative due time means relative, in 100 ns intervals.
            let due_time = -(duration.as_nanos() as i64 / 100);

            if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, u32::MAX);
            }

            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_until_blocks_for_the_full_duration() {
        let timer = HighPrecisionTimer::new();
        let start = timer.now();
        let deadline = start + 20_000_000; // 20 ms
        assert!(timer.wait_until(deadline));
        assert!(timer.now() >= deadline);
    }

    #[test]
    fn wait_until_never_waits_negative_time() {
        let timer = HighPrecisionTimer::new();
        let before = timer.now();
        assert!(!timer.wait_until(0));
        // Returned essentially immediately.
        assert!(timer.elapsed(before) < Duration::from_millis(5));
    }

    #[test]
    fn elapsed_grows_monotonically() {
        let timer = HighPrecisionTimer::new();
        let ts = timer.now();
        timer.sleep(Duration::from_millis(2));
        let first = timer.elapsed(ts);
        timer.sleep(Duration::from_millis(2));
        assert!(timer.elapsed(ts) > first);
    }
}
