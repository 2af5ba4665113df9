//! Vigil - Main entry point
//!
//! Startup order matters: OOM protection and the account database read need
//! the elevated privileges a setuid install grants, so both happen before
//! privileges are dropped and before the display is touched. The config and
//! password files are user-chosen paths and are read as the invoking user.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil::account::{self, HelperProgram};
use vigil::{oom, Cli, Outcome, VigilConfig};
use vigil_actions::SystemCountermeasures;
use vigil_core::{CredentialVerifier, ExternalAuthenticator};
use vigil_x11::X11Display;

/// How long detached alerts may keep running after the screens unlock
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = VigilConfig::default_path();
    let loaded = account::as_invoking_user(|| VigilConfig::load_if_present(&config_path));
    let mut config = match &loaded {
        Ok(Ok(Some(config))) => config.clone(),
        _ => VigilConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(config.quiet);
    match &loaded {
        Ok(Err(e)) => warn!("Ignoring {}: {}", config_path.display(), e),
        Err(e) => warn!("Not reading {}: {}", config_path.display(), e),
        Ok(Ok(_)) => {}
    }

    match run(&config) {
        Ok(code) => code,
        Err(e) => {
            if !config.quiet {
                eprintln!("vigil: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "off" } else { "vigil=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(config: &VigilConfig) -> anyhow::Result<ExitCode> {
    info!("Starting vigil v{}", env!("CARGO_PKG_VERSION"));

    oom::protect_from_oom_killer();

    let override_secret =
        account::as_invoking_user(|| account::read_password_file(&config.password_file))
            .and_then(|read| read)
            .with_context(|| format!("cannot read {}", config.password_file.display()))?;
    let external = config
        .auth_helper
        .clone()
        .map(|program| Box::new(HelperProgram::new(program)) as Box<dyn ExternalAuthenticator>);
    let verifier = CredentialVerifier::resolve(
        override_secret.as_deref().map(|secret| secret.as_slice()),
        account::account_hash,
        external,
    )
    .context("no way to verify the unlock secret")?;
    drop(override_secret);

    account::drop_privileges()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;
    let actions = SystemCountermeasures::new(runtime.handle().clone(), config.features, &config.actions)?;

    let mut display = X11Display::connect().context("cannot open display")?;
    let policy = config.escalation_policy();

    let outcome = vigil::lock_screens(&mut display, config.grab, &verifier, &policy, &actions)?;
    drop(actions);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    Ok(match outcome {
        Outcome::Unlocked => ExitCode::SUCCESS,
        Outcome::NotLocked => ExitCode::FAILURE,
    })
}
