//! External program invocation
//!
//! Programs are always started from an argument vector, never through a
//! shell, so configured paths cannot inject commands.

use std::fmt;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::{ActionError, Result};

/// A program and its arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start the program now and reap it on `runtime` without waiting
    ///
    /// The process is already running when this returns, so it is not lost
    /// if the runtime shuts down before the reaper task is polled.
    pub fn spawn_detached(&self, runtime: &Handle) -> Result<()> {
        let _guard = runtime.enter();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ActionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let program = self.program.clone();
        runtime.spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => debug!("{} exited with {}", program, status),
                Ok(_) => {}
                Err(e) => debug!("Could not wait for {}: {}", program, e),
            }
        });
        Ok(())
    }

    /// Run to completion; a nonzero exit is an error
    pub async fn run(&self) -> Result<()> {
        self.run_with_input(None).await
    }

    /// Run to completion with `input` written to stdin
    pub async fn run_with_input(&self, input: Option<&[u8]>) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| ActionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input).await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ActionError::Command {
                program: self.program.clone(),
                detail: format!(
                    "{} {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )
                .trim_end()
                .to_string(),
            })
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
