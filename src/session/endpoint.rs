//! Endpoint and credential types.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::error::{Result, SmbError};
use crate::fs::path::normalize_path;

/// Default SMB direct-TCP port.
pub const DEFAULT_PORT: u16 = 445;

/// Where to connect and which share to work in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    share: String,
    base_path: String,
}

impl Endpoint {
    /// Create an endpoint for `share` on `host` (hostname or IP literal).
    pub fn new(host: impl Into<String>, share: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            share: share.into(),
            base_path: String::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Directory inside the share that relative operations start from.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_path(base_path);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn share(&self) -> &str {
        &self.share
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// UNC form, e.g. `\\10.0.10.2\Users\Administrator\shared`.
    pub fn unc(&self) -> String {
        if self.base_path.is_empty() {
            format!("\\\\{}\\{}", self.host, self.share)
        } else {
            format!("\\\\{}\\{}\\{}", self.host, self.share, self.base_path)
        }
    }

    /// Resolve the host to a socket address.
    ///
    /// IP literals are used as-is; otherwise the first DNS answer wins.
    pub async fn resolve(&self) -> Result<SocketAddr> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| SmbError::Transport(format!("Cannot resolve {}: {}", self.host, e)))?;
        addrs
            .next()
            .ok_or_else(|| SmbError::Transport(format!("No addresses for {}", self.host)))
    }
}

/// Login credentials. The password is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Domain or workgroup; empty for local accounts
    pub domain: String,
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            domain: String::new(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_builder() {
        let endpoint = Endpoint::new("10.0.10.2", "Users").with_base_path("Administrator/shared/");
        assert_eq!(endpoint.port(), DEFAULT_PORT);
        assert_eq!(endpoint.base_path(), "Administrator\\shared");
        assert_eq!(endpoint.unc(), "\\\\10.0.10.2\\Users\\Administrator\\shared");

        let bare = Endpoint::new("fileserver", "Public").with_port(1445);
        assert_eq!(bare.unc(), "\\\\fileserver\\Public");
        assert_eq!(bare.port(), 1445);
    }

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let addr = Endpoint::new("10.0.10.2", "Users").resolve().await.unwrap();
        assert_eq!(addr, "10.0.10.2:445".parse().unwrap());

        let v6 = Endpoint::new("::1", "Users").with_port(4450).resolve().await.unwrap();
        assert_eq!(v6, "[::1]:4450".parse().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_failure_is_transport_error() {
        let err = Endpoint::new("no-such-host.invalid", "Users")
            .resolve()
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2").with_domain("CORP");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(printed.contains("CORP"));
        assert!(!printed.contains("hunter2"));
        assert_eq!(creds.password(), "hunter2");
    }
}
