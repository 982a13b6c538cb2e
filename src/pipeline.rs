//! Copy, mount, restart: the whole run, one step after another.

use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use crate::compose::{apply_volume_mount, VolumeMount};
use crate::config::Settings;
use crate::error::Result;
use crate::node::NodeTarget;
use crate::restart::restart_compose;
use crate::runner::CommandRunner;
use crate::transfer::copy_from_node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub domain: String,
    pub panel_cert_dir: PathBuf,
    pub container_cert_dir: String,
    pub mount: VolumeMount,
    pub mount_added: bool,
}

impl RunSummary {
    pub fn key_file(&self) -> String {
        format!("{}/privkey.pem", self.container_cert_dir)
    }

    pub fn certificate_file(&self) -> String {
        format!("{}/fullchain.pem", self.container_cert_dir)
    }
}

pub struct Pipeline<'a, R: CommandRunner> {
    settings: &'a Settings,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Pipeline<'a, R> {
    pub fn new(settings: &'a Settings, runner: &'a R) -> Self {
        Pipeline { settings, runner }
    }

    pub async fn run(&self, node: &NodeTarget) -> Result<RunSummary> {
        let settings = self.settings;
        let remote_dir = settings.remote_cert_dir(&node.domain)?;
        let panel_cert_dir = settings.panel_cert_dir(&node.domain);
        let container_cert_dir = settings.container_cert_dir(&node.domain);
        let compose_path = settings.compose_path();

        println!(
            "\n{} {} ({})",
            "--- Setting up SSL certificates for node".bold(),
            node.domain.white().bold(),
            node.ip
        );
        println!("Compose Dir: {}", settings.compose_dir.display());
        println!("Panel Host Certs Dir: {}", settings.panel_cert_base.display());
        println!("Container Certs Dir: {}", settings.container_cert_base.display());

        copy_from_node(
            self.runner,
            node,
            &remote_dir,
            &panel_cert_dir,
            settings.use_sudo,
        )
        .await?;
        println!("{}", "Certificates copied successfully.".green());

        println!(
            "{} {}",
            "Updating volume mounts in".green(),
            compose_path.display().to_string().white()
        );
        let outcome = apply_volume_mount(
            &compose_path,
            &settings.service_name,
            &panel_cert_dir,
            &container_cert_dir,
        )?;
        if outcome.added {
            println!("Added new volume mount: {}", outcome.mount.to_string().white());
        } else {
            println!(
                "Volume mount already exists: {}. No changes needed.",
                outcome.mount.to_string().white()
            );
        }
        info!(
            compose = %compose_path.display(),
            service = %settings.service_name,
            mount = %outcome.mount,
            added = outcome.added,
            "Compose file updated"
        );

        restart_compose(
            self.runner,
            &settings.docker,
            settings.use_sudo,
            &settings.compose_dir,
        )
        .await?;

        Ok(RunSummary {
            domain: node.domain.clone(),
            panel_cert_dir,
            container_cert_dir: outcome.container_path().to_string(),
            mount_added: outcome.added,
            mount: outcome.mount,
        })
    }
}

pub fn print_next_steps(summary: &RunSummary) {
    println!("\n{}", "--- Automation Complete ---".green().bold());
    println!(
        "SSL certificate setup for {} is complete on the panel host.",
        summary.domain.white().bold()
    );
    println!(
        "Certificates are stored in {}.",
        summary.panel_cert_dir.display().to_string().white()
    );
    println!("Next Steps:");
    println!("1. Log in to your Remnawave Panel (Web UI).");
    println!(
        "2. When configuring the Xray Inbound for {}, set the certificate paths as follows:",
        summary.domain
    );
    println!("   \"keyFile\": \"{}\",", summary.key_file());
    println!("   \"certificateFile\": \"{}\"", summary.certificate_file());
    println!("3. Push the updated configuration to your Xray Node.");
}
