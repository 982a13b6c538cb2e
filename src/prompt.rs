//! Gathers the run parameters from flags, environment and the terminal.

use colored::Colorize;
use dialoguer::{Input, Password};
use secrecy::SecretString;
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{CertSyncError, Result};
use crate::node::{NodeTarget, SshAuth};

/// Picks the value for parameter `name`: the supplied text if it is not blank, else the
/// default if there is one.
pub fn resolve_value(name: &str, default: Option<&str>, supplied: Option<&str>) -> Result<String> {
    if let Some(value) = supplied.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    match default.filter(|d| !d.is_empty()) {
        Some(default) => Ok(default.to_string()),
        None => Err(CertSyncError::validation(name, "input cannot be empty")),
    }
}

fn prompt_text(prompt: &str, default: Option<&str>) -> String {
    match default.filter(|d| !d.is_empty()) {
        Some(default) => format!("{} (default: {})", prompt, default),
        None => prompt.to_string(),
    }
}

/// Source of raw operator input.
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Reads without echoing.
    fn read_secret(&mut self, prompt: &str) -> Result<String>;

    fn notice(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        Ok(Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }
}

/// Values that arrived through flags or environment; anything missing is prompted for.
#[derive(Debug, Default)]
pub struct ProvidedParams {
    pub compose_dir: Option<String>,
    pub panel_cert_base: Option<String>,
    pub container_cert_base: Option<String>,
    pub node_ip: Option<String>,
    pub node_domain: Option<String>,
    pub node_user: Option<String>,
    pub auth: Option<String>,
    pub ssh_key: Option<String>,
    pub ssh_password: Option<SecretString>,
}

/// Binds every run parameter, prompting for the missing ones unless `interactive` is off.
pub struct ParamCollector<'a, P: Prompter> {
    prompter: &'a mut P,
    interactive: bool,
}

impl<'a, P: Prompter> ParamCollector<'a, P> {
    pub fn new(prompter: &'a mut P, interactive: bool) -> Self {
        ParamCollector {
            prompter,
            interactive,
        }
    }

    /// Re-prompts until the answer resolves to something non-empty.
    pub fn required(
        &mut self,
        name: &str,
        prompt: &str,
        default: Option<&str>,
        supplied: Option<String>,
    ) -> Result<String> {
        if supplied.as_deref().map_or(false, |s| !s.trim().is_empty()) || !self.interactive {
            return resolve_value(name, default, supplied.as_deref());
        }

        let text = prompt_text(prompt, default);
        loop {
            let answer = self.prompter.read_line(&text)?;
            match resolve_value(name, default, Some(&answer)) {
                Ok(value) => return Ok(value),
                Err(_) => self
                    .prompter
                    .notice(&"Input cannot be empty. Please provide a value.".red().to_string()),
            }
        }
    }

    /// Asks once; blank means "not given".
    pub fn optional(&mut self, prompt: &str, supplied: Option<String>) -> Result<Option<String>> {
        let supplied = supplied.filter(|s| !s.trim().is_empty());
        if supplied.is_some() || !self.interactive {
            return Ok(supplied.map(|s| s.trim().to_string()));
        }
        let answer = self.prompter.read_line(prompt)?;
        Ok(Some(answer.trim().to_string()).filter(|s| !s.is_empty()))
    }

    pub fn secret(
        &mut self,
        name: &str,
        prompt: &str,
        supplied: Option<SecretString>,
    ) -> Result<SecretString> {
        if let Some(secret) = supplied {
            return Ok(secret);
        }
        if !self.interactive {
            return Err(CertSyncError::validation(name, "input cannot be empty"));
        }
        loop {
            let answer = self.prompter.read_secret(prompt)?;
            if !answer.is_empty() {
                return Ok(SecretString::from(answer));
            }
            self.prompter
                .notice(&"Input cannot be empty. Please provide a value.".red().to_string());
        }
    }

    /// Walks the fixed parameter list and returns the resolved settings and node.
    pub fn collect(
        &mut self,
        defaults: &Settings,
        provided: ProvidedParams,
    ) -> Result<(Settings, NodeTarget)> {
        let mut settings = defaults.clone();

        let default_compose_dir = defaults.compose_dir.display().to_string();
        settings.compose_dir = PathBuf::from(self.required(
            "compose directory",
            &format!("Enter {} directory", defaults.compose_file),
            Some(&default_compose_dir),
            provided.compose_dir,
        )?);

        let default_panel = defaults.panel_cert_base.display().to_string();
        settings.panel_cert_base = PathBuf::from(self.required(
            "panel certificate directory",
            "Enter Panel Host Base Certs Directory",
            Some(&default_panel),
            provided.panel_cert_base,
        )?);

        let default_container = defaults.container_cert_base.display().to_string();
        settings.container_cert_base = PathBuf::from(self.required(
            "container certificate directory",
            "Enter Container Base Certs Directory (for Xray config)",
            Some(&default_container),
            provided.container_cert_base,
        )?);

        let ip = self.required("node ip", "Enter Node VPS IP Address", None, provided.node_ip)?;
        let domain = self.required(
            "node domain",
            "Enter Node VPS Domain Name (e.g., node1.example.com)",
            None,
            provided.node_domain,
        )?;
        let default_user = std::env::var("USER").unwrap_or_else(|_| "root".to_string());
        let user = self.required(
            "node user",
            "Enter Node VPS SSH Username",
            Some(&default_user),
            provided.node_user,
        )?;

        if provided.auth.is_none() && self.interactive {
            self.prompter.notice(&format!(
                "\n{}\n1. Use SSH Private Key (Recommended for security)\n2. Use SSH Password (Requires 'sshpass' tool)",
                "--- SSH Authentication Method ---".bold()
            ));
        }
        let selector = self.required(
            "authentication method",
            "Choose authentication method (1 or 2)",
            Some("1"),
            provided.auth,
        )?;

        let auth = match selector.trim().to_lowercase().as_str() {
            "1" | "key" => {
                let key = self.optional(
                    "Enter SSH Private Key Path (e.g., ~/.ssh/id_rsa)",
                    provided.ssh_key,
                )?;
                SshAuth::from_selector(&selector, key, None)?
            }
            "2" | "password" => {
                let password = self.secret(
                    "ssh password",
                    "Enter SSH Password for Node VPS",
                    provided.ssh_password,
                )?;
                SshAuth::from_selector(&selector, None, Some(password))?
            }
            _ => SshAuth::from_selector(&selector, None, None)?,
        };

        let node = NodeTarget::new(&ip, &domain, &user, auth)?;
        Ok((settings, node))
    }
}
