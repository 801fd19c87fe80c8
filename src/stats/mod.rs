//! Process memory diagnostics.
//!
//! Reads the `Vm*` counters from `/proc/self/status` (Linux only) so that
//! memory use around an ingestion can be logged.

use std::fmt;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::CArrayError;

/// Virtual memory counters of the current process, in kB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    /// Total virtual memory size.
    pub vm_size: u64,
    /// Resident set size.
    pub vm_rss: u64,
    /// Data segment size.
    pub vm_data: u64,
    /// Stack size.
    pub vm_stk: u64,
    /// Text segment size.
    pub vm_exe: u64,
    /// Shared library code size.
    pub vm_lib: u64,
}

impl MemoryStats {
    /// Parses the contents of a `/proc/<pid>/status` file.
    ///
    /// Counters other than `VmSize` default to 0 when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CArrayError::InvalidArgument`] if `VmSize` is missing or a
    /// counter is not a number.
    pub fn parse(status: &str) -> Result<Self, CArrayError> {
        let mut stats = MemoryStats::default();
        let mut saw_size = false;

        for line in status.lines() {
            let Some((key, rest)) = line.split_once(':') else {
                continue;
            };
            let slot = match key {
                "VmSize" => {
                    saw_size = true;
                    &mut stats.vm_size
                }
                "VmRSS" => &mut stats.vm_rss,
                "VmData" => &mut stats.vm_data,
                "VmStk" => &mut stats.vm_stk,
                "VmExe" => &mut stats.vm_exe,
                "VmLib" => &mut stats.vm_lib,
                _ => continue,
            };
            *slot = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or(CArrayError::invalid("malformed memory counter"))?;
        }

        if !saw_size {
            return Err(CArrayError::invalid("memory status has no VmSize entry"));
        }
        Ok(stats)
    }

    /// Reads the counters of the current process.
    pub fn current() -> Result<Self, CArrayError> {
        let status = std::fs::read_to_string("/proc/self/status")?;
        Self::parse(&status)
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VmSize: {:>7} kB\tVmRSS: {:>7} kB", self.vm_size, self.vm_rss)?;
        writeln!(f, "VmData: {:>7} kB\tVmStk: {:>7} kB", self.vm_data, self.vm_stk)?;
        write!(f, "VmExe:  {:>7} kB\tVmLib: {:>7} kB", self.vm_exe, self.vm_lib)
    }
}

/// Logs memory usage and the wall-clock time elapsed since `tref`.
///
/// Returns the current instant, to be passed as `tref` to the next call.
pub fn show_stats(explain: &str, tref: Instant) -> Instant {
    let now = Instant::now();
    let elapsed = now.duration_since(tref).as_secs_f64();

    match MemoryStats::current() {
        Ok(stats) => info!(explain, elapsed_secs = elapsed, "memory usage\n{}", stats),
        Err(e) => warn!(explain, elapsed_secs = elapsed, error = %e, "memory usage unavailable"),
    }
    now
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tcat\n\
        State:\tR (running)\n\
        VmPeak:\t    8000 kB\n\
        VmSize:\t    7788 kB\n\
        VmRSS:\t     812 kB\n\
        VmData:\t     360 kB\n\
        VmStk:\t     132 kB\n\
        VmExe:\t      20 kB\n\
        VmLib:\t    1640 kB\n\
        Threads:\t1\n";

    #[test]
    fn test_parse() {
        let stats = MemoryStats::parse(STATUS).unwrap();
        assert_eq!(
            stats,
            MemoryStats {
                vm_size: 7788,
                vm_rss: 812,
                vm_data: 360,
                vm_stk: 132,
                vm_exe: 20,
                vm_lib: 1640,
            }
        );
    }

    #[test]
    fn test_parse_missing_optional_counters() {
        let stats = MemoryStats::parse("VmSize:\t 100 kB\n").unwrap();
        assert_eq!(stats.vm_size, 100);
        assert_eq!(stats.vm_rss, 0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(MemoryStats::parse("Name:\tcat\n").is_err());
        assert!(MemoryStats::parse("VmSize:\tlots kB\n").is_err());
    }

    #[test]
    fn test_display() {
        let stats = MemoryStats::parse(STATUS).unwrap();
        let s = stats.to_string();
        assert!(s.contains("VmSize:    7788 kB"));
        assert!(s.contains("VmLib:    1640 kB"));
        assert_eq!(s.lines().count(), 3);
    }

    #[test]
    fn test_show_stats_returns_later_instant() {
        let tref = Instant::now();
        let next = show_stats("test", tref);
        assert!(next >= tref);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_on_linux() {
        let stats = MemoryStats::current().unwrap();
        assert!(stats.vm_size > 0);
    }
}
