use serde_yaml::{Mapping, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use super::volume::VolumeMount;
use crate::error::{CertSyncError, Result};

const SERVICES_KEY: &str = "services";
const VOLUMES_KEY: &str = "volumes";

/// A docker compose file held as a YAML tree.
///
/// Only the target service's `volumes` list is ever touched. Everything else is carried
/// through as parsed, and mapping keys keep their original order on save.
#[derive(Debug, Clone)]
pub struct ComposeDocument {
    path: PathBuf,
    root: Value,
}

/// What a call to [`apply_volume_mount`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountOutcome {
    pub mount: VolumeMount,
    pub added: bool,
}

impl MountOutcome {
    pub fn container_path(&self) -> &str {
        self.mount.container()
    }
}

impl ComposeDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CertSyncError::Parse {
            path: path.to_path_buf(),
            message: format!("unable to read file: {}", e),
        })?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(contents).map_err(|e| CertSyncError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(ComposeDocument {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Short-syntax mounts of a service, in file order.
    pub fn volumes(&self, service: &str) -> Vec<&str> {
        self.root
            .get(SERVICES_KEY)
            .and_then(|services| services.get(service))
            .and_then(|entry| entry.get(VOLUMES_KEY))
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Appends `mount` to the service's volume list unless the exact string is already there.
    ///
    /// Returns whether the document changed.
    pub fn ensure_volume_mount(&mut self, service: &str, mount: &VolumeMount) -> Result<bool> {
        let path = self.path.clone();
        let schema_error = |message: String| CertSyncError::Schema {
            path: path.clone(),
            message,
        };

        let services = self
            .root
            .get_mut(SERVICES_KEY)
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| schema_error(format!("no '{}' mapping found", SERVICES_KEY)))?;

        let entry = services.get_mut(service).ok_or_else(|| {
            schema_error(format!(
                "service '{}' not found; make sure this is the right compose file",
                service
            ))
        })?;

        // `service:` with an empty body parses as null.
        if entry.is_null() {
            *entry = Value::Mapping(Mapping::new());
        }
        let entry = entry
            .as_mapping_mut()
            .ok_or_else(|| schema_error(format!("service '{}' is not a mapping", service)))?;

        let needs_list = match entry.get(VOLUMES_KEY) {
            None | Some(Value::Null) => true,
            Some(Value::Sequence(_)) => false,
            Some(_) => {
                return Err(schema_error(format!(
                    "'{}' of service '{}' is not a list",
                    VOLUMES_KEY, service
                )))
            }
        };
        if needs_list {
            entry.insert(Value::from(VOLUMES_KEY), Value::Sequence(Vec::new()));
        }

        let Some(Value::Sequence(volumes)) = entry.get_mut(VOLUMES_KEY) else {
            return Err(schema_error(format!(
                "'{}' of service '{}' is not a list",
                VOLUMES_KEY, service
            )));
        };

        let mount = mount.to_string();
        if volumes.iter().any(|v| v.as_str() == Some(mount.as_str())) {
            debug!(service, mount = %mount, "Volume mount already present");
            return Ok(false);
        }

        debug!(service, mount = %mount, "Appending volume mount");
        volumes.push(Value::String(mount));
        Ok(true)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.root).map_err(|e| CertSyncError::Parse {
            path: self.path.clone(),
            message: format!("unable to serialize document: {}", e),
        })
    }

    /// Stages the YAML in a sibling temp file and renames it over the original.
    pub fn save(&self) -> Result<()> {
        let contents = self.to_yaml()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        if let Ok(metadata) = std::fs::metadata(&self.path) {
            std::fs::set_permissions(staged.path(), metadata.permissions())?;
        }
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Loads the compose file, makes sure `source:destination` is mounted into `service`, and
/// writes the file back.
///
/// Nothing is written if loading or the lookup of `service` fails.
pub fn apply_volume_mount(
    path: &Path,
    service: &str,
    source: &Path,
    destination: &Path,
) -> Result<MountOutcome> {
    let mut document = ComposeDocument::load(path)?;
    let mount = VolumeMount::new(source, destination);
    let added = document.ensure_volume_mount(service, &mount)?;
    document.save()?;
    Ok(MountOutcome { mount, added })
}
