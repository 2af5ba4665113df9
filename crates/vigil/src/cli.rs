//! Command-line interface

use clap::{ArgAction, Parser};

use crate::config::VigilConfig;

#[derive(Debug, Parser)]
#[command(name = "vigil")]
#[command(about = "Lock every screen until the unlock secret is typed", long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)] // handled by clap before parsing returns
    version: Option<bool>,

    /// Do not power off when a danger key is pressed
    #[arg(short, long)]
    pub safe: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut VigilConfig) {
        if self.safe {
            config.features.danger_poweroff = false;
        }
    }
}
