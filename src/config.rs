use serde::Deserialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::error::{CertSyncError, Result};

pub const DEFAULT_COMPOSE_DIR: &str = "/opt/remnawave";
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
pub const DEFAULT_SERVICE_NAME: &str = "remnawave";
pub const DEFAULT_PANEL_CERT_BASE: &str = "/opt/remnawave/ssl_certs";
pub const DEFAULT_CONTAINER_CERT_BASE: &str = "/var/lib/remnawave/configs/xray/ssl";
pub const DEFAULT_REMOTE_CERT_DIR: &str = "/etc/letsencrypt/live/{{ domain }}";

/// Paths and switches the pipeline runs with.
///
/// Every field has a default, so a settings file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compose_dir: PathBuf,
    pub compose_file: String,
    pub service_name: String,
    pub panel_cert_base: PathBuf,
    pub container_cert_base: PathBuf,
    /// Tera template, rendered with `domain` in scope.
    pub remote_cert_dir: String,
    pub use_sudo: bool,
    pub docker: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            compose_dir: PathBuf::from(DEFAULT_COMPOSE_DIR),
            compose_file: DEFAULT_COMPOSE_FILE.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            panel_cert_base: PathBuf::from(DEFAULT_PANEL_CERT_BASE),
            container_cert_base: PathBuf::from(DEFAULT_CONTAINER_CERT_BASE),
            remote_cert_dir: DEFAULT_REMOTE_CERT_DIR.to_string(),
            use_sudo: true,
            docker: "docker".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CertSyncError::Config {
            message: format!("Unable to read {}: {}", path.display(), e),
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| CertSyncError::Config {
            message: format!("Error parsing settings: {}", e),
        })
    }

    pub fn compose_path(&self) -> PathBuf {
        self.compose_dir.join(&self.compose_file)
    }

    pub fn panel_cert_dir(&self, domain: &str) -> PathBuf {
        self.panel_cert_base.join(domain)
    }

    pub fn container_cert_dir(&self, domain: &str) -> PathBuf {
        self.container_cert_base.join(domain)
    }

    pub fn remote_cert_dir(&self, domain: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("domain", domain);
        Tera::one_off(&self.remote_cert_dir, &context, false).map_err(|e| {
            CertSyncError::Config {
                message: format!(
                    "Could not render remote certificate path '{}': {}",
                    self.remote_cert_dir, e
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_use_domain() {
        let settings = Settings::default();
        assert_eq!(
            settings.panel_cert_dir("node1.example.com"),
            PathBuf::from("/opt/remnawave/ssl_certs/node1.example.com")
        );
        assert_eq!(
            settings.container_cert_dir("node1.example.com"),
            PathBuf::from("/var/lib/remnawave/configs/xray/ssl/node1.example.com")
        );
        assert_eq!(
            settings.compose_path(),
            PathBuf::from("/opt/remnawave/docker-compose.yml")
        );
        assert_eq!(
            settings.remote_cert_dir("node1.example.com").unwrap(),
            "/etc/letsencrypt/live/node1.example.com"
        );
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let settings = Settings::from_yaml("compose_dir: /srv/panel\nuse_sudo: false\n").unwrap();
        assert_eq!(settings.compose_dir, PathBuf::from("/srv/panel"));
        assert!(!settings.use_sudo);
        assert_eq!(settings.service_name, DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn unknown_template_variable_is_a_config_error() {
        let settings = Settings {
            remote_cert_dir: "/certs/{{ host }}".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.remote_cert_dir("a.example.com"),
            Err(CertSyncError::Config { .. })
        ));
    }
}
