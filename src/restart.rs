//! Restarts the compose project so the new mount is picked up.

use colored::Colorize;
use std::path::Path;

use crate::error::Result;
use crate::runner::{run_checked, CommandRunner, Invocation};

fn compose(docker: &str, use_sudo: bool, compose_dir: &Path) -> Invocation {
    Invocation::privileged(docker, use_sudo)
        .arg("compose")
        .current_dir(compose_dir)
        .label("compose")
}

/// `docker compose down` followed by `docker compose up -d` in `compose_dir`.
///
/// Stops at the first failing step; a failed `up` leaves the project down.
pub async fn restart_compose<R: CommandRunner>(
    runner: &R,
    docker: &str,
    use_sudo: bool,
    compose_dir: &Path,
) -> Result<()> {
    println!("{}", "Restarting Docker Compose to apply changes...".green());
    run_checked(runner, &compose(docker, use_sudo, compose_dir).arg("down")).await?;
    run_checked(runner, &compose(docker, use_sudo, compose_dir).args(["up", "-d"])).await?;
    println!("{}", "Docker Compose restarted successfully.".green());
    Ok(())
}
