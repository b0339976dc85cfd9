pub mod build;

use tracing::info;

use crate::error::Result;
use crate::harness::bytes_to_mb;
use crate::memory::MemoryProbe;

pub use build::{dir_size_bytes, measure_build, output_size_kb, BuildMeasurement};
pub use workload::measure_synthetic_workload;

/// Memory in use at the moment of the call, in MB.
pub fn measure_memory(probe: &dyn MemoryProbe) -> Result<f64> {
    let mb = bytes_to_mb(probe.used_bytes()?);
    info!(mb, "sampled process memory");
    Ok(mb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedMemoryProbe;

    #[test]
    fn memory_is_reported_in_mebibytes() {
        assert_eq!(measure_memory(&FixedMemoryProbe(4_540_000)).unwrap(), 4.33);
        assert_eq!(measure_memory(&FixedMemoryProbe(0)).unwrap(), 0.0);
    }
}
