use std::path::PathBuf;
use std::sync::Mutex;

use super::{CommandOutput, CommandRunner, Invocation};
use crate::error::{CertSyncError, Result};

/// A command the [`RecordingRunner`] was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

enum Reply {
    Output(CommandOutput),
    NotInstalled,
}

/// Fake runner that records every invocation and answers from a script.
///
/// Rules match on a substring of the full command line; the first matching rule wins and
/// anything unmatched succeeds with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    rules: Vec<(String, Reply)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    pub fn respond_to(mut self, needle: &str, output: CommandOutput) -> Self {
        self.rules.push((needle.to_string(), Reply::Output(output)));
        self
    }

    pub fn fail_on(self, needle: &str, exit_code: i32, stderr: &str) -> Self {
        self.respond_to(needle, CommandOutput::failed(exit_code, stderr))
    }

    /// Commands whose line contains `needle` fail to start, as if the binary were missing.
    pub fn not_installed(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::NotInstalled));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.command).collect()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command = invocation.to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                command: command.clone(),
                cwd: invocation.cwd().map(|p| p.to_path_buf()),
                env: invocation.get_env().to_vec(),
            });
        }

        match self.rules.iter().find(|(needle, _)| command.contains(needle.as_str())) {
            Some((_, Reply::Output(output))) => Ok(output.clone()),
            Some((_, Reply::NotInstalled)) => Err(CertSyncError::DependencyMissing {
                tool: invocation.program().to_string(),
                hint: "Make sure it is installed and in your PATH.".to_string(),
            }),
            None => Ok(CommandOutput::ok()),
        }
    }
}
