//! Pulls the certificate directory from the node with `scp`.

use colored::Colorize;
use secrecy::ExposeSecret;
use std::path::Path;
use tracing::info;

use crate::error::{CertSyncError, Result};
use crate::node::{NodeTarget, SshAuth};
use crate::runner::{run_checked, CommandRunner, Invocation};
use crate::utils::which;

pub const PASSWORD_HELPER: &str = "sshpass";

/// Builds the scp command that copies the contents of `remote_dir` into `local_dir`.
///
/// With password auth the password travels in `SSHPASS`, and `sshpass -e` reads it from there.
pub fn scp_invocation(node: &NodeTarget, remote_dir: &str, local_dir: &Path) -> Invocation {
    let mut invocation = match &node.auth {
        SshAuth::Password(password) => Invocation::new(PASSWORD_HELPER)
            .arg("-e")
            .arg("scp")
            .env("SSHPASS", password.expose_secret())
            .label("scp")
            .sensitive(),
        SshAuth::Agent | SshAuth::KeyFile(_) => Invocation::new("scp"),
    };

    invocation = invocation.arg("-r");
    if let SshAuth::KeyFile(key) = &node.auth {
        invocation = invocation.arg("-i").arg(key.display().to_string());
    }

    invocation
        .arg(format!(
            "{}:{}/.",
            node.scp_remote(),
            remote_dir.trim_end_matches('/')
        ))
        .arg(local_dir.display().to_string())
}

/// Creates `local_dir` and copies every file under `remote_dir` on the node into it.
pub async fn copy_from_node<R: CommandRunner>(
    runner: &R,
    node: &NodeTarget,
    remote_dir: &str,
    local_dir: &Path,
    use_sudo: bool,
) -> Result<()> {
    if matches!(node.auth, SshAuth::Password(_)) && which(runner, PASSWORD_HELPER).await?.is_none() {
        return Err(CertSyncError::DependencyMissing {
            tool: PASSWORD_HELPER.to_string(),
            hint: "Install it to use password authentication (Debian/Ubuntu: sudo apt install sshpass)."
                .to_string(),
        });
    }

    println!(
        "{} {}",
        "Creating destination directory".green(),
        local_dir.display().to_string().white()
    );
    run_checked(
        runner,
        &Invocation::privileged("mkdir", use_sudo)
            .arg("-p")
            .arg(local_dir.display().to_string()),
    )
    .await?;

    if matches!(node.auth, SshAuth::Agent) {
        println!(
            "{}",
            "No SSH private key given; ssh will try the agent or default keys.".yellow()
        );
    }

    println!(
        "{} {}:{} {}",
        "Copying certificates from".green(),
        node.scp_remote().white(),
        remote_dir.white(),
        format!("to {}", local_dir.display()).green()
    );
    run_checked(runner, &scp_invocation(node, remote_dir, local_dir)).await?;
    info!(node = %node.remote(), remote_dir, local_dir = %local_dir.display(), "Certificates copied");
    Ok(())
}
