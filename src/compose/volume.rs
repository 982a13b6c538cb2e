use std::fmt;
use std::path::Path;

/// A short-syntax compose volume binding, `"<host-path>:<container-path>"`.
///
/// Two mounts are the same only if their strings are identical; no path normalization is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    host: String,
    container: String,
}

impl VolumeMount {
    pub fn new(host: impl AsRef<Path>, container: impl AsRef<Path>) -> Self {
        VolumeMount {
            host: host.as_ref().display().to_string(),
            container: container.as_ref().display().to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

impl fmt::Display for VolumeMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_host_colon_container() {
        let mount = VolumeMount::new("/certs/node1.example.com", "/ssl/node1.example.com");
        assert_eq!(mount.to_string(), "/certs/node1.example.com:/ssl/node1.example.com");
    }

    #[test]
    fn trailing_slash_is_kept_verbatim() {
        let mount = VolumeMount::new("/certs/a/", "/ssl/a");
        assert_eq!(mount.host(), "/certs/a/");
        assert_ne!(mount, VolumeMount::new("/certs/a", "/ssl/a"));
    }
}
