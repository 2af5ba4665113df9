//! Keep the kernel's OOM killer away from the locker

use tracing::debug;

/// Ask the kernel to never OOM-kill this process
///
/// Needs `CAP_SYS_RESOURCE`, so it only takes effect before privileges are
/// dropped. Failure is not fatal.
pub fn protect_from_oom_killer() {
    #[cfg(target_os = "linux")]
    {
        match std::fs::write("/proc/self/oom_score_adj", "-1000") {
            Ok(()) => debug!("OOM score adjusted"),
            Err(e) => tracing::warn!("Unable to disable OOM killer: {}", e),
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        debug!("OOM protection is not supported on this platform");
    }
}
