//! The remote node the certificates are pulled from.

use secrecy::SecretString;
use std::net::Ipv6Addr;
use std::path::PathBuf;

use crate::error::{CertSyncError, Result};

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// How scp authenticates against the node.
#[derive(Debug)]
pub enum SshAuth {
    /// No key given; ssh falls back to the agent or its default keys.
    Agent,
    KeyFile(PathBuf),
    /// Supplied to scp through `sshpass`.
    Password(SecretString),
}

impl SshAuth {
    /// Builds the auth mode from the menu selector and whatever the operator supplied for it.
    pub fn from_selector(
        selector: &str,
        key_path: Option<String>,
        password: Option<SecretString>,
    ) -> Result<Self> {
        match selector.trim().to_lowercase().as_str() {
            "1" | "key" => Ok(match key_path.filter(|p| !p.trim().is_empty()) {
                Some(path) => SshAuth::KeyFile(PathBuf::from(path.trim())),
                None => SshAuth::Agent,
            }),
            "2" | "password" => password.map(SshAuth::Password).ok_or_else(|| {
                CertSyncError::validation("ssh password", "password authentication needs a password")
            }),
            other => Err(CertSyncError::validation(
                "authentication method",
                format!("'{}' is not one of 1 (key) or 2 (password)", other),
            )),
        }
    }
}

#[derive(Debug)]
pub struct NodeTarget {
    pub ip: String,
    pub domain: String,
    pub user: String,
    pub auth: SshAuth,
}

impl NodeTarget {
    pub fn new(ip: &str, domain: &str, user: &str, auth: SshAuth) -> Result<Self> {
        let ip = ip.trim();
        let user = user.trim();
        if ip.is_empty() {
            return Err(CertSyncError::validation("node ip", "cannot be empty"));
        }
        if user.is_empty() {
            return Err(CertSyncError::validation("node user", "cannot be empty"));
        }
        let domain = validate_domain(domain.trim())?;
        Ok(NodeTarget {
            ip: ip.to_string(),
            domain: domain.to_string(),
            user: user.to_string(),
            auth,
        })
    }

    pub fn remote(&self) -> String {
        format!("{}@{}", self.user, self.ip)
    }

    /// `user@host` as scp expects it in front of a `:path`, with IPv6 literals bracketed.
    pub fn scp_remote(&self) -> String {
        if self.ip.parse::<Ipv6Addr>().is_ok() {
            format!("{}@[{}]", self.user, self.ip)
        } else {
            self.remote()
        }
    }
}

/// Checks a node domain before it is used to build local and container paths.
///
/// The domain becomes a directory name, so wildcards, slashes and empty labels are rejected.
pub fn validate_domain(domain: &str) -> Result<&str> {
    if domain.is_empty() {
        return Err(CertSyncError::validation("domain", "cannot be empty"));
    }
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(CertSyncError::validation(
            "domain",
            format!("exceeds maximum length of {} characters", MAX_DOMAIN_LENGTH),
        ));
    }
    if domain.contains('*') {
        return Err(CertSyncError::validation("domain", "wildcard domains are not allowed"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(CertSyncError::validation(
            "domain",
            "must have at least two parts (e.g., node1.example.com)",
        ));
    }

    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Err(CertSyncError::validation(
                "domain",
                format!("label '{}' must be 1-{} characters", label, MAX_LABEL_LENGTH),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(CertSyncError::validation(
                "domain",
                format!("label '{}' cannot start or end with a hyphen", label),
            ));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(CertSyncError::validation(
                "domain",
                format!("label '{}' contains invalid characters", label),
            ));
        }
    }

    Ok(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_domains() {
        assert!(validate_domain("node1.example.com").is_ok());
        assert!(validate_domain("a-b.example.co.uk").is_ok());
    }

    #[test]
    fn rejects_domains_that_would_break_paths() {
        for bad in ["", "localhost", "*.example.com", "a..com", "-a.com", "a/b.com", "../x.com"] {
            assert!(validate_domain(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn key_selector_without_path_uses_agent() {
        let auth = SshAuth::from_selector("1", Some("  ".to_string()), None).unwrap();
        assert!(matches!(auth, SshAuth::Agent));

        let auth = SshAuth::from_selector("key", Some("~/.ssh/id_rsa".to_string()), None).unwrap();
        assert!(matches!(auth, SshAuth::KeyFile(p) if p == PathBuf::from("~/.ssh/id_rsa")));
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let err = SshAuth::from_selector("3", None, None).unwrap_err();
        assert!(matches!(err, CertSyncError::Validation { .. }));
    }

    #[test]
    fn password_selector_requires_a_password() {
        assert!(SshAuth::from_selector("2", None, None).is_err());
        let auth = SshAuth::from_selector("password", None, Some(SecretString::from("pw".to_string()))).unwrap();
        assert!(matches!(auth, SshAuth::Password(_)));
    }

    #[test]
    fn node_target_trims_and_validates() {
        let node = NodeTarget::new(" 10.0.0.2 ", "node1.example.com", "root", SshAuth::Agent).unwrap();
        assert_eq!(node.remote(), "root@10.0.0.2");
        assert!(NodeTarget::new("", "node1.example.com", "root", SshAuth::Agent).is_err());
    }

    #[test]
    fn scp_remote_brackets_ipv6_only() {
        let v6 = NodeTarget::new("2001:db8::7", "node1.example.com", "root", SshAuth::Agent).unwrap();
        assert_eq!(v6.scp_remote(), "root@[2001:db8::7]");
        assert_eq!(v6.remote(), "root@2001:db8::7");

        let v4 = NodeTarget::new("10.0.0.2", "node1.example.com", "root", SshAuth::Agent).unwrap();
        assert_eq!(v4.scp_remote(), "root@10.0.0.2");

        let host = NodeTarget::new("node1.example.com", "node1.example.com", "admin", SshAuth::Agent).unwrap();
        assert_eq!(host.scp_remote(), "admin@node1.example.com");
    }
}
