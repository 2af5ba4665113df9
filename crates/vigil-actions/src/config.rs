//! Settings for the countermeasure backends

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Countermeasure settings, embedded in the locker's config file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub sounds: SoundConfig,
    pub webcam: WebcamConfig,
    /// SMS/MMS notifications; notifying is skipped when absent
    pub twilio: Option<TwilioConfig>,
    /// Image host for evidence links; uploading is skipped when absent
    pub imgur: Option<ImgurConfig>,
}

/// Sound files played through `aplay`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub beep: PathBuf,
    pub alarm: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vigil");
        Self {
            beep: dir.join("beep.wav"),
            alarm: dir.join("police.wav"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebcamConfig {
    /// V4L2 capture device
    pub device: String,
    /// Directory evidence images are written to before upload
    pub evidence_dir: PathBuf,
}

impl Default for WebcamConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            evidence_dir: std::env::temp_dir(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sending number
    pub from: String,
    /// Number to alert
    pub to: String,
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImgurConfig {
    pub client_id: String,
}
