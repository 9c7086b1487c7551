//! Outbound (driven) ports for the consensus subsystem.

use std::sync::atomic::{AtomicU32, Ordering};

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> u32;
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> u32 {
        (**self).now()
    }
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u32 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32
    }
}

/// Settable time source for deterministic forging in tests.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    time: AtomicU32,
}

impl ManualTimeSource {
    /// Start the clock at `initial` seconds.
    pub fn new(initial: u32) -> Self {
        Self {
            time: AtomicU32::new(initial),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, seconds: u32) {
        self.time.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute value.
    pub fn set(&self, time: u32) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> u32 {
        self.time.load(Ordering::SeqCst)
    }
}
