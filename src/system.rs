//! System-wide counters read from the proc filesystem.
//!
//! Uptime and the kernel clock-tick rate are the two global inputs the
//! snapshot reader needs to turn raw per-process CPU tick counters into
//! a usage percentage.

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK.
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Reads system uptime from `<proc_root>/uptime`.
///
/// Returns uptime in seconds.
/// Format: "<uptime_seconds> <idle_seconds>"
pub fn read_uptime(proc_root: &Path) -> Result<f64, String> {
    let path = proc_root.join("uptime");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.is_empty() {
        return Err(format!(
            "Invalid {} format: no fields found",
            path.display()
        ));
    }

    let uptime_seconds = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse uptime: {}", e))?;

    Ok(uptime_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_uptime() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("uptime"), "12345.67 9876.54\n")
            .expect("Failed to write uptime file");

        let uptime = read_uptime(dir.path()).unwrap();
        assert!((uptime - 12345.67).abs() < 0.001);
    }

    #[test]
    fn test_read_uptime_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(read_uptime(dir.path()).is_err());
    }

    #[test]
    fn test_read_uptime_garbage() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("uptime"), "not-a-number idle\n")
            .expect("Failed to write uptime file");

        assert!(read_uptime(dir.path()).is_err());
    }

    #[test]
    fn test_clk_tck_positive() {
        assert!(*CLK_TCK > 0.0);
    }
}
