//! Single-frame webcam capture through `ffmpeg`

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use vigil_core::Evidence;

use crate::command::Invocation;
use crate::config::WebcamConfig;
use crate::error::{ActionError, Result};

#[derive(Clone, Debug)]
pub struct Webcam {
    device: String,
    dir: PathBuf,
}

impl Webcam {
    pub fn new(config: &WebcamConfig) -> Self {
        Self {
            device: config.device.clone(),
            dir: config.evidence_dir.clone(),
        }
    }

    /// Fresh file name so concurrent captures never overwrite each other
    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!(
            "vigil-{}.jpg",
            Utc::now().format("%Y%m%dT%H%M%S%.6f")
        ))
    }

    pub fn invocation(&self, output: &Path) -> Invocation {
        Invocation::new("ffmpeg")
            .args(["-y", "-loglevel", "quiet", "-f", "video4linux2", "-i"])
            .arg(self.device.as_str())
            .args(["-frames:v", "1", "-f", "image2"])
            .arg(output.to_string_lossy())
    }

    pub async fn capture(&self) -> Result<Evidence> {
        let path = self.next_path();
        self.invocation(&path).run().await?;

        // ffmpeg exits 0 on some devices without writing a frame
        if !tokio::fs::try_exists(&path).await? {
            return Err(ActionError::Command {
                program: "ffmpeg".to_string(),
                detail: format!("no image written from {}", self.device),
            });
        }

        debug!("Captured evidence to {}", path.display());
        Ok(Evidence { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webcam() -> Webcam {
        Webcam::new(&WebcamConfig {
            device: "/dev/video1".to_string(),
            evidence_dir: PathBuf::from("/var/tmp"),
        })
    }

    #[test]
    fn test_ffmpeg_arguments() {
        let inv = webcam().invocation(Path::new("/var/tmp/shot.jpg"));
        assert_eq!(inv.program, "ffmpeg");
        assert_eq!(
            inv.args,
            vec![
                "-y",
                "-loglevel",
                "quiet",
                "-f",
                "video4linux2",
                "-i",
                "/dev/video1",
                "-frames:v",
                "1",
                "-f",
                "image2",
                "/var/tmp/shot.jpg",
            ]
        );
    }

    #[test]
    fn test_evidence_lands_in_configured_dir() {
        let path = webcam().next_path();
        assert_eq!(path.parent(), Some(Path::new("/var/tmp")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }
}
