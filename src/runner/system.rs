use colored::Colorize;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use super::{CommandOutput, CommandRunner, Invocation};
use crate::error::{CertSyncError, Result};
use crate::utils::{clean_line, handle_stream, StreamKind};

/// Runs commands on the local machine, echoing their output as it arrives.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    quiet: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner::default()
    }

    /// Captures output without echoing it.
    pub fn quiet() -> Self {
        SystemRunner { quiet: true }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        if invocation.is_sensitive() {
            debug!(
                command = %invocation,
                cwd = ?invocation.cwd(),
                env = "[REDACTED]",
                "Executing command (sensitive)"
            );
        } else {
            debug!(
                command = %invocation,
                cwd = ?invocation.cwd(),
                env = ?invocation.get_env(),
                "Executing command"
            );
        }

        let mut command = TokioCommand::new(invocation.program());
        command
            .args(invocation.get_args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = invocation.cwd() {
            command.current_dir(cwd);
        }
        for (key, value) in invocation.get_env() {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => CertSyncError::DependencyMissing {
                tool: invocation.program().to_string(),
                hint: "Make sure it is installed and in your PATH.".to_string(),
            },
            _ => CertSyncError::Io(e),
        })?;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tasks = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            tasks.push(tokio::spawn(handle_stream(stdout, StreamKind::Stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            tasks.push(tokio::spawn(handle_stream(stderr, StreamKind::Stderr, tx.clone())));
        }
        drop(tx);

        let label = invocation.display_label().white().bold();
        let mut output = CommandOutput::default();
        while let Some((kind, line)) = rx.recv().await {
            if !self.quiet {
                println!("       {}  |   {}", label, clean_line(&line));
            }
            match kind {
                StreamKind::Stdout => output.stdout.push_str(&line),
                StreamKind::Stderr => output.stderr.push_str(&line),
            }
        }
        for task in tasks {
            let _ = task.await;
        }

        let status = child.wait().await?;
        output.success = status.success();
        output.exit_code = status.code();
        debug!(command = %invocation, exit_code = ?output.exit_code, "Command finished");
        Ok(output)
    }
}
