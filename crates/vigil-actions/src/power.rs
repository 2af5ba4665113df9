//! Power-off and kill-switch lockdown

use tracing::warn;

use crate::command::Invocation;
use crate::error::Result;

const SYSRQ: &str = "/proc/sys/kernel/sysrq";

/// Commands tried in order until one succeeds
pub fn power_off_invocations() -> [Invocation; 2] {
    [
        Invocation::new("sudo").args(["systemctl", "poweroff"]),
        Invocation::new("sudo").args(["shutdown", "-h", "now"]),
    ]
}

pub async fn power_off() -> Result<()> {
    let [primary, fallback] = power_off_invocations();
    if let Err(e) = primary.run().await {
        warn!("{} failed, trying {}: {}", primary, fallback, e);
        fallback.run().await?;
    }
    Ok(())
}

/// Writes `0` to the sysrq control file
pub fn sysrq_invocation() -> Invocation {
    Invocation::new("sudo").args(["tee", SYSRQ])
}

/// Clears XKB options, which removes the ctrl+alt+backspace terminate binding
pub fn xkb_invocation() -> Invocation {
    Invocation::new("setxkbmap").arg("-option")
}

/// Disable both kill switches; both are attempted even if the first fails
pub async fn disable_kill_switches() -> Result<()> {
    let sysrq = sysrq_invocation().run_with_input(Some(b"0\n")).await;
    let xkb = xkb_invocation().run().await;
    sysrq.and(xkb)
}
