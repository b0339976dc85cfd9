//! Process memory sampling.
//!
//! The runner never reads process state directly; it asks a [`MemoryProbe`]
//! so tests can substitute a fixed reading.

use sysinfo::{Pid, System};

use crate::error::{Error, Result};

pub trait MemoryProbe {
    /// Memory currently in use by this process, in bytes.
    fn used_bytes(&self) -> Result<u64>;
}

/// Reads the resident set size of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessMemoryProbe;

impl MemoryProbe for ProcessMemoryProbe {
    fn used_bytes(&self) -> Result<u64> {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        if !system.refresh_process(pid) {
            return Err(Error::MemoryProbe(format!("process {pid} not found")));
        }
        system
            .process(pid)
            .map(|p| p.memory())
            .ok_or_else(|| Error::MemoryProbe(format!("no memory info for process {pid}")))
    }
}

/// Always reports the same number of bytes.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe(pub u64);

impl MemoryProbe for FixedMemoryProbe {
    fn used_bytes(&self) -> Result<u64> {
        Ok(self.0)
    }
}

impl<P: MemoryProbe + ?Sized> MemoryProbe for &P {
    fn used_bytes(&self) -> Result<u64> {
        (**self).used_bytes()
    }
}
