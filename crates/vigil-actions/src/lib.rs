//! Vigil Actions - System countermeasures for the screen locker
//!
//! [`SystemCountermeasures`] implements [`vigil_core::Countermeasures`] on
//! top of external programs and HTTP services:
//!
//! - audio cues through `aplay`
//! - webcam evidence through `ffmpeg`
//! - SMS/MMS alerts through Twilio
//! - evidence hosting through Imgur
//! - power-off and kill-switch lockdown through `sudo`
//!
//! The locker's input loop is synchronous. Ordered steps are driven to
//! completion with [`Handle::block_on`]; fire-and-forget work is spawned on
//! the runtime and never joined. Audio cues start their process before
//! returning, so the unlock chime survives the runtime shutting down.

pub mod audio;
pub mod command;
pub mod config;
pub mod error;
pub mod imgur;
pub mod power;
pub mod twilio;
pub mod webcam;

use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use vigil_core::{
    ActionResult, Alert, Countermeasures, Cue, Evidence, Features, PublishedEvidence,
};

pub use audio::Player;
pub use command::Invocation;
pub use config::{ActionsConfig, ImgurConfig, SoundConfig, TwilioConfig, WebcamConfig};
pub use error::{ActionError, Result};
pub use imgur::ImgurClient;
pub use twilio::TwilioClient;
pub use webcam::Webcam;

/// Timeout for every HTTP request
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Countermeasures backed by the host system
pub struct SystemCountermeasures {
    runtime: Handle,
    features: Features,
    player: Player,
    webcam: Webcam,
    twilio: Option<TwilioClient>,
    imgur: Option<ImgurClient>,
}

impl SystemCountermeasures {
    pub fn new(runtime: Handle, features: Features, config: &ActionsConfig) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        if features.notify && config.twilio.is_none() {
            warn!("Notifications are enabled but Twilio is not configured");
        }
        if features.image_upload && config.imgur.is_none() {
            warn!("Image upload is enabled but Imgur is not configured");
        }

        Ok(Self {
            runtime,
            features,
            player: Player::new(&config.sounds),
            webcam: Webcam::new(&config.webcam),
            twilio: config
                .twilio
                .clone()
                .map(|c| TwilioClient::new(client.clone(), c)),
            imgur: config.imgur.clone().map(|c| ImgurClient::new(client, c)),
        })
    }

    fn twilio(&self) -> Result<&TwilioClient> {
        self.twilio
            .as_ref()
            .ok_or(ActionError::NotConfigured("Twilio"))
    }
}

impl Countermeasures for SystemCountermeasures {
    fn play(&self, cue: Cue) {
        if let Err(e) = self.player.invocation(cue).spawn_detached(&self.runtime) {
            debug!("Could not play {:?}: {}", cue, e);
        }
    }

    fn alert_in_background(&self, alert: Alert) {
        let webcam = self.features.evidence.then(|| self.webcam.clone());
        let twilio = if self.features.notify {
            self.twilio.clone()
        } else {
            None
        };

        self.runtime.spawn(async move {
            if let Some(webcam) = webcam {
                match webcam.capture().await {
                    Ok(evidence) => {
                        if let Err(e) = tokio::fs::remove_file(&evidence.path).await {
                            debug!("Could not remove {}: {}", evidence.path.display(), e);
                        }
                    }
                    Err(e) => warn!("Background capture failed: {}", e),
                }
            }
            if let Some(twilio) = twilio {
                if let Err(e) = twilio.send(alert.message(), None).await {
                    warn!("Background alert failed: {}", e);
                }
            }
        });
    }

    fn disable_kill_switches(&self) -> ActionResult<()> {
        Ok(self.runtime.block_on(power::disable_kill_switches())?)
    }

    fn capture(&self) -> ActionResult<Evidence> {
        Ok(self.runtime.block_on(self.webcam.capture())?)
    }

    fn publish(&self, evidence: &Evidence) -> ActionResult<Option<PublishedEvidence>> {
        match &self.imgur {
            Some(imgur) => Ok(Some(self.runtime.block_on(imgur.upload(evidence))?)),
            None => Ok(None),
        }
    }

    fn notify(&self, alert: Alert, media: Option<&str>) -> ActionResult<()> {
        let twilio = self.twilio()?;
        Ok(self
            .runtime
            .block_on(twilio.send(alert.message(), media))?)
    }

    fn retract(&self, published: &PublishedEvidence, delay: Duration) -> ActionResult<()> {
        let imgur = self
            .imgur
            .as_ref()
            .ok_or(ActionError::NotConfigured("Imgur"))?;
        Ok(self.runtime.block_on(async {
            tokio::time::sleep(delay).await;
            imgur.delete(&published.delete_token).await
        })?)
    }

    fn discard(&self, evidence: &Evidence) -> ActionResult<()> {
        std::fs::remove_file(&evidence.path)?;
        Ok(())
    }

    fn power_off(&self) -> ActionResult<()> {
        Ok(self.runtime.block_on(power::power_off())?)
    }
}
