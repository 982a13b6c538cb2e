//! External command execution.
//!
//! Everything the pipeline does outside of the compose file goes through [`CommandRunner`],
//! so the same code can drive real processes or a [`RecordingRunner`] in tests.

mod recording;
mod system;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CertSyncError, Result};

pub use recording::{RecordedCall, RecordingRunner};
pub use system::SystemRunner;

/// One command to execute: argv, working directory and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    label: Option<String>,
    /// Environment carries a secret and must not be logged.
    sensitive: bool,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            label: None,
            sensitive: false,
        }
    }

    /// Prefixes the command with `sudo` when `use_sudo` is set.
    pub fn privileged(program: &str, use_sudo: bool) -> Self {
        if use_sudo {
            Invocation::new("sudo").arg(program).label(program)
        } else {
            Invocation::new(program)
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Short name printed in front of streamed output lines.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| {
            Path::new(&self.program)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(&self.program)
        })
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

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        CommandOutput {
            success: true,
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        CommandOutput {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("STDOUT:\n{}\nSTDERR:\n{}", self.stdout, self.stderr),
            (false, true) => format!("STDOUT:\n{}", self.stdout),
            (true, false) => format!("STDERR:\n{}", self.stderr),
            (true, true) => String::new(),
        }
    }
}

/// Runs an [`Invocation`] to completion.
///
/// A non-zero exit is reported through [`CommandOutput::success`], not as an error; only
/// failing to start the process is an error here.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs the command and turns a non-zero exit into [`CertSyncError::ProcessFailure`].
pub async fn run_checked<R: CommandRunner>(
    runner: &R,
    invocation: &Invocation,
) -> Result<CommandOutput> {
    let output = runner.run(invocation).await?;
    if output.success {
        Ok(output)
    } else {
        Err(CertSyncError::ProcessFailure {
            command: invocation.to_string(),
            exit_code: output.exit_code,
            output: output.combined(),
        })
    }
}
