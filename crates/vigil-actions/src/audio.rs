//! Audio cues through ALSA's `aplay`

use std::path::PathBuf;

use vigil_core::Cue;

use crate::command::Invocation;
use crate::config::SoundConfig;

#[derive(Clone, Debug)]
pub struct Player {
    beep: PathBuf,
    alarm: PathBuf,
}

impl Player {
    pub fn new(sounds: &SoundConfig) -> Self {
        Self {
            beep: sounds.beep.clone(),
            alarm: sounds.alarm.clone(),
        }
    }

    pub fn invocation(&self, cue: Cue) -> Invocation {
        let file = match cue {
            Cue::Beep => &self.beep,
            Cue::Alarm => &self.alarm,
        };
        Invocation::new("aplay").arg("-q").arg(file.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Cue::Beep, "aplay -q /snd/beep.wav")]
    #[case(Cue::Alarm, "aplay -q /snd/police.wav")]
    fn test_cue_selects_file(#[case] cue: Cue, #[case] expected: &str) {
        let player = Player::new(&SoundConfig {
            beep: PathBuf::from("/snd/beep.wav"),
            alarm: PathBuf::from("/snd/police.wav"),
        });
        assert_eq!(player.invocation(cue).to_string(), expected);
    }
}
