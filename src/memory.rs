//! Physical memory probe used by the memory-guarded edit distance.

use sysinfo::System;

pub const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Total physical system memory in whole GiB.
pub fn total_system_gib() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.total_memory() / BYTES_PER_GIB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_memory_at_least_1gib() {
        let total = total_system_gib();
        assert!(total >= 1, "expected at least 1 GiB of RAM, got {total}");
    }
}
