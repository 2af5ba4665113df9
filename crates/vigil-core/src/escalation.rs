//! Failure-tiered response pipeline
//!
//! Every failed submission is mapped to a [`Tier`]:
//!
//! | Failed attempts | Tier   | Response                                          |
//! |-----------------|--------|---------------------------------------------------|
//! | 1-2             | Soft   | short neutral cue                                 |
//! | 3-5             | Alarm  | alarm cue, background evidence capture + notify   |
//! | 6+              | Severe | ordered capture, notify, cleanup, power off       |
//!
//! Danger keys run the severe sequence regardless of the count.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ALARM_AFTER, SEVERE_AFTER};

/// Result type for side-effect actions; the error is only ever logged
pub type ActionResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Response tier selected for a failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Soft,
    Alarm,
    Severe,
}

/// Audio cues the locker can play
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Short neutral beep
    Beep,
    /// Siren
    Alarm,
}

/// Why a remote alert is being raised
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alert {
    /// A wrong secret was submitted
    BadPassword,
    /// A key commonly used to escape the locker was pressed
    DangerKey,
}

impl Alert {
    pub fn message(&self) -> &'static str {
        match self {
            Alert::BadPassword => "Bad screenlock password.",
            Alert::DangerKey => "Bad screenlock key.",
        }
    }
}

/// Locally captured evidence image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evidence {
    pub path: PathBuf,
}

/// Evidence published to a remote image host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedEvidence {
    /// Public link handed to the notification provider
    pub link: String,
    /// Token needed to delete the remote copy
    pub delete_token: String,
}

/// Side-effect collaborators invoked by the policy
///
/// `play` and `alert_in_background` must return immediately; whatever they
/// start runs detached and its outcome is never observed. All other methods
/// block until the step has finished so the severe sequence stays ordered.
pub trait Countermeasures {
    /// Play a cue without waiting for it to finish
    fn play(&self, cue: Cue);

    /// Capture evidence and notify remote without waiting for either
    fn alert_in_background(&self, alert: Alert);

    /// Disable sysrq and ctrl+alt+backspace so the locker cannot be killed
    fn disable_kill_switches(&self) -> ActionResult<()>;

    /// Take a picture of whoever is at the keyboard
    fn capture(&self) -> ActionResult<Evidence>;

    /// Upload evidence to a remote host; `None` when no host is configured
    fn publish(&self, evidence: &Evidence) -> ActionResult<Option<PublishedEvidence>>;

    /// Send an alert, with a media link when available
    fn notify(&self, alert: Alert, media: Option<&str>) -> ActionResult<()>;

    /// Wait `delay`, then delete the remote copy of the evidence
    fn retract(&self, published: &PublishedEvidence, delay: Duration) -> ActionResult<()>;

    /// Delete the local evidence file
    fn discard(&self, evidence: &Evidence) -> ActionResult<()>;

    /// Request an immediate power-off; returns only on failure
    fn power_off(&self) -> ActionResult<()>;
}

/// Which parts of the response pipeline are armed
///
/// Resolved once at startup from the config file and command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Play audio cues
    pub audio: bool,
    /// Capture webcam evidence
    pub evidence: bool,
    /// Send remote notifications
    pub notify: bool,
    /// Upload evidence to an image host before notifying
    pub image_upload: bool,
    /// Power off (and disable kill switches) in the failure-driven severe tier
    pub poweroff: bool,
    /// Treat danger keys as an immediate severe event
    pub danger_keys: bool,
    /// Power off (and disable kill switches) when a danger key is pressed
    pub danger_poweroff: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            audio: true,
            evidence: true,
            notify: true,
            image_upload: false,
            poweroff: true,
            danger_keys: true,
            danger_poweroff: true,
        }
    }
}

impl Features {
    /// Everything off; only the bell remains
    pub fn none() -> Self {
        Self {
            audio: false,
            evidence: false,
            notify: false,
            image_upload: false,
            poweroff: false,
            danger_keys: false,
            danger_poweroff: false,
        }
    }
}

/// Maps failure counts to tiers and drives the countermeasures
#[derive(Clone, Debug)]
pub struct EscalationPolicy {
    features: Features,
    /// Highest count still answered with the soft tier
    alarm_after: u32,
    /// Highest count still answered with the alarm tier
    severe_after: u32,
    /// Grace period before remote evidence is deleted
    retract_delay: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(Features::default())
    }
}

impl EscalationPolicy {
    pub fn new(features: Features) -> Self {
        Self {
            features,
            alarm_after: ALARM_AFTER,
            severe_after: SEVERE_AFTER,
            retract_delay: Duration::from_secs(5),
        }
    }

    /// Create a policy with custom tier thresholds
    ///
    /// `severe_after` is raised to `alarm_after` if given lower.
    pub fn with_thresholds(mut self, alarm_after: u32, severe_after: u32) -> Self {
        self.alarm_after = alarm_after;
        self.severe_after = severe_after.max(alarm_after);
        self
    }

    pub fn with_retract_delay(mut self, delay: Duration) -> Self {
        self.retract_delay = delay;
        self
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Tier for the given number of failed attempts
    pub fn tier(&self, attempts: u32) -> Tier {
        if attempts > self.severe_after {
            Tier::Severe
        } else if attempts > self.alarm_after {
            Tier::Alarm
        } else {
            Tier::Soft
        }
    }

    /// React to a failed submission
    pub fn on_failure<C: Countermeasures + ?Sized>(&self, attempts: u32, actions: &C) -> Tier {
        let tier = self.tier(attempts);
        info!("Failed unlock attempt {} ({:?} tier)", attempts, tier);

        match tier {
            Tier::Soft => {
                if self.features.audio {
                    actions.play(Cue::Beep);
                }
            }
            Tier::Alarm => {
                if self.features.audio {
                    actions.play(Cue::Alarm);
                }
                if self.features.evidence || self.features.notify {
                    actions.alert_in_background(Alert::BadPassword);
                }
            }
            Tier::Severe => self.severe(Alert::BadPassword, self.features.poweroff, actions),
        }

        tier
    }

    /// React to a danger key press, independent of the attempt count
    ///
    /// Evidence and notification follow the same switches as the failure
    /// path; only power-off has its own switch.
    pub fn on_danger_key<C: Countermeasures + ?Sized>(&self, actions: &C) {
        warn!("Danger key pressed");
        self.severe(Alert::DangerKey, self.features.danger_poweroff, actions);
    }

    /// Ordered severe sequence; every failure is logged and skipped
    ///
    /// Returns when the power-off request fails (or is not armed), so the
    /// input loop resumes.
    fn severe<C: Countermeasures + ?Sized>(&self, alert: Alert, poweroff: bool, actions: &C) {
        let features = &self.features;

        if poweroff {
            if let Err(e) = actions.disable_kill_switches() {
                warn!("Failed to disable kill switches: {}", e);
            }
        }

        let evidence = if features.evidence {
            actions
                .capture()
                .map_err(|e| warn!("Evidence capture failed: {}", e))
                .ok()
        } else {
            None
        };

        let published = match (&evidence, features.image_upload) {
            (Some(evidence), true) => actions
                .publish(evidence)
                .map_err(|e| warn!("Evidence upload failed: {}", e))
                .ok()
                .flatten(),
            _ => None,
        };

        if features.notify {
            let media = published.as_ref().map(|p| p.link.as_str());
            if let Err(e) = actions.notify(alert, media) {
                warn!("Notification failed: {}", e);
            }
        }

        if let Some(published) = &published {
            if let Err(e) = actions.retract(published, self.retract_delay) {
                warn!("Failed to delete remote evidence: {}", e);
            }
        }

        if let Some(evidence) = &evidence {
            if let Err(e) = actions.discard(evidence) {
                warn!("Failed to delete local evidence: {}", e);
            }
        }

        if poweroff {
            info!("Requesting power-off");
            if let Err(e) = actions.power_off() {
                warn!("Power-off failed, resuming lock: {}", e);
            }
        }
    }
}
