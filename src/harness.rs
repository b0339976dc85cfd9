use std::hint::black_box;
use std::time::{Duration, Instant};

pub const BYTES_PER_KB: f64 = 1024.0;
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Round to two fractional digits, the precision every reported value carries.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn bytes_to_kb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_KB)
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MB)
}

#[derive(Clone, Debug)]
pub struct Measured<T> {
    pub value: T,
    pub elapsed: Duration,
}

impl<T> Measured<T> {
    pub fn seconds(&self) -> f64 {
        round2(self.elapsed.as_secs_f64())
    }

    pub fn millis(&self) -> f64 {
        round2(self.elapsed.as_secs_f64() * 1000.0)
    }
}

/// Time a single call of `f` on the monotonic clock.
pub fn measure_fn<T>(f: impl FnOnce() -> T) -> Measured<T> {
    let start = Instant::now();
    let value = black_box(f());
    Measured {
        value,
        elapsed: start.elapsed(),
    }
}
