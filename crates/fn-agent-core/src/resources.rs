//! Approximate resource accounting.
//!
//! Heap usage is sampled from the process resident set immediately before
//! and after an invocation; the reported `memory_used_mb` is the clamped
//! delta. This is a deliberate approximation, not per-invocation accounting:
//! concurrent invocations share the process heap and the allocator may
//! release or retain pages at its own pace, so negative deltas are clamped
//! to zero and consumers must treat the number as an estimate.

use std::sync::OnceLock;

const MIB: u64 = 1024 * 1024;

/// Fallback memory limit when no probe source is available.
const FALLBACK_LIMIT_MB: u64 = 128;

/// cgroup v1 reports "unlimited" as a value near i64::MAX; anything this
/// large is not a real limit.
const UNLIMITED_SENTINEL: u64 = 1 << 60;

/// Current resident set size in bytes, or 0 if it cannot be sampled.
pub fn heap_resident_bytes() -> u64 {
    #[cfg(target_os = "linux")]
    {
        // /proc/self/statm: size resident shared text lib data dt (in pages)
        let Ok(statm) = std::fs::read_to_string("/proc/self/statm") else {
            return 0;
        };
        let Some(resident_pages) = statm
            .split_whitespace()
            .nth(1)
            .and_then(|v| v.parse::<u64>().ok())
        else {
            return 0;
        };
        resident_pages * page_size()
    }

    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}

#[cfg(target_os = "linux")]
fn page_size() -> u64 {
    4096
}

/// Heap growth between two samples, in whole megabytes, clamped to zero.
pub fn memory_delta_mb(before_bytes: u64, after_bytes: u64) -> u64 {
    after_bytes.saturating_sub(before_bytes) / MIB
}

/// Memory limit of this agent in megabytes.
///
/// Probed once and cached. Probe order: cgroup v2, cgroup v1, system memory,
/// then a fixed fallback.
pub fn memory_limit_mb() -> u64 {
    static LIMIT: OnceLock<u64> = OnceLock::new();
    *LIMIT.get_or_init(probe_memory_limit_mb)
}

fn probe_memory_limit_mb() -> u64 {
    if let Some(limit) = read_cgroup_v2_limit() {
        return limit;
    }
    if let Some(limit) = read_cgroup_v1_limit() {
        return limit;
    }
    if let Some(total) = read_system_memory() {
        return total;
    }
    FALLBACK_LIMIT_MB
}

/// cgroup v2: /sys/fs/cgroup/memory.max ("max" means no limit).
fn read_cgroup_v2_limit() -> Option<u64> {
    let content = std::fs::read_to_string("/sys/fs/cgroup/memory.max").ok()?;
    let trimmed = content.trim();
    if trimmed == "max" {
        return None;
    }
    let bytes: u64 = trimmed.parse().ok()?;
    Some(bytes / MIB)
}

/// cgroup v1: /sys/fs/cgroup/memory/memory.limit_in_bytes.
fn read_cgroup_v1_limit() -> Option<u64> {
    let content = std::fs::read_to_string("/sys/fs/cgroup/memory/memory.limit_in_bytes").ok()?;
    let bytes: u64 = content.trim().parse().ok()?;
    if bytes >= UNLIMITED_SENTINEL {
        return None;
    }
    Some(bytes / MIB)
}

/// MemTotal from /proc/meminfo.
fn read_system_memory() -> Option<u64> {
    let content = std::fs::read_to_string("/proc/meminfo").ok()?;
    let line = content.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb / 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_delta_clamped_to_zero() {
        // Shrinking heap (e.g. pages returned mid-invocation) reports 0,
        // never a negative value.
        assert_eq!(memory_delta_mb(100 * MIB, 40 * MIB), 0);
    }

    #[test]
    fn test_memory_delta_whole_megabytes() {
        assert_eq!(memory_delta_mb(0, 3 * MIB + 512 * 1024), 3);
        assert_eq!(memory_delta_mb(MIB, MIB), 0);
    }

    #[test]
    fn test_memory_limit_positive() {
        // Whatever source answered, the limit is never zero.
        assert!(memory_limit_mb() > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_heap_sample_nonzero_on_linux() {
        assert!(heap_resident_bytes() > 0);
    }
}
