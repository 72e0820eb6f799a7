//! Client configuration.
//!
//! Settings are read from a JSON file shaped like
//!
//! ```json
//! {
//!   "SMB": {
//!     "host": "10.0.10.2",
//!     "sharedFolderName": "Users",
//!     "path": "administrator\\shared",
//!     "userName": "administrator",
//!     "password": "..."
//!   }
//! }
//! ```
//!
//! and can be overridden from the environment (`SMB_HOST`, `SMB_SHARE`,
//! `SMB_PATH`, `SMB_USERNAME`, `SMB_PASSWORD`, `SMB_DOMAIN`), so secrets
//! need not live in the file.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SmbError};
use crate::session::{Credentials, DEFAULT_PORT, Endpoint};

/// Name of the settings section holding the client configuration.
pub const SECTION: &str = "SMB";

/// Connection settings for one share.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Hostname or IP literal
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "sharedFolderName")]
    pub share: String,
    /// Base path inside the share
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(rename = "userName")]
    pub username: String,
    pub password: String,
    /// Chunk size for whole-file reads (server maximum if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_chunk_size: Option<u32>,
}

impl ClientConfig {
    /// Load settings from a JSON file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SmbError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json_str(&json)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse settings from JSON, either wrapped in an `"SMB"` section or bare.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        if let Some(section) = value.get_mut(SECTION) {
            value = section.take();
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize settings wrapped in an `"SMB"` section.
    pub fn to_json_string(&self) -> Result<String> {
        let mut root = serde_json::Map::new();
        root.insert(SECTION.to_string(), serde_json::to_value(self)?);
        Ok(serde_json::to_string_pretty(&Value::Object(root))?)
    }

    /// Override values from `SMB_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override values from any variable source keyed like the environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut String); 6] = [
            ("SMB_HOST", &mut self.host),
            ("SMB_SHARE", &mut self.share),
            ("SMB_PATH", &mut self.path),
            ("SMB_USERNAME", &mut self.username),
            ("SMB_PASSWORD", &mut self.password),
            ("SMB_DOMAIN", &mut self.domain),
        ];
        for (name, field) in fields {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }
    }

    /// Check that the settings are complete enough to connect.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SmbError::Config("host is required".to_string()));
        }
        if self.share.trim().is_empty() {
            return Err(SmbError::Config("sharedFolderName is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(SmbError::Config("userName is required".to_string()));
        }
        if self.read_chunk_size == Some(0) {
            return Err(SmbError::Config(
                "readChunkSize must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.trim(), self.share.trim())
            .with_port(self.port.unwrap_or(DEFAULT_PORT))
            .with_base_path(&self.path)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
            .with_domain(self.domain.clone())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("share", &self.share)
            .field("path", &self.path)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("read_chunk_size", &self.read_chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SETTINGS: &str = r#"{
        "SMB": {
            "host": "10.0.10.2",
            "sharedFolderName": "Users",
            "path": "administrator\\shared",
            "userName": "administrator",
            "password": "hunter2"
        }
    }"#;

    #[test]
    fn test_parse_wrapped_section() {
        let config = ClientConfig::from_json_str(SETTINGS).unwrap();
        assert_eq!(config.host, "10.0.10.2");
        assert_eq!(config.share, "Users");
        assert_eq!(config.path, "administrator\\shared");
        assert_eq!(config.username, "administrator");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.port, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_bare_object_with_extras() {
        let config = ClientConfig::from_json_str(
            r#"{"host": "files.local", "sharedFolderName": "Public", "userName": "bob",
                "domain": "CORP", "port": 1445, "readChunkSize": 4096}"#,
        )
        .unwrap();
        assert_eq!(config.domain, "CORP");
        assert_eq!(config.port, Some(1445));
        assert_eq!(config.read_chunk_size, Some(4096));
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_endpoint_and_credentials() {
        let config = ClientConfig::from_json_str(SETTINGS).unwrap();
        let endpoint = config.endpoint();
        assert_eq!(endpoint.host(), "10.0.10.2");
        assert_eq!(endpoint.port(), DEFAULT_PORT);
        assert_eq!(endpoint.share(), "Users");
        assert_eq!(endpoint.base_path(), "administrator\\shared");

        let credentials = config.credentials();
        assert_eq!(credentials.username, "administrator");
        assert_eq!(credentials.password(), "hunter2");
        assert!(credentials.domain.is_empty());
    }

    #[test]
    fn test_overrides() {
        let mut config = ClientConfig::from_json_str(SETTINGS).unwrap();
        let vars: HashMap<&str, &str> = [("SMB_PASSWORD", "from-env"), ("SMB_HOST", "nas")]
            .into_iter()
            .collect();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.password, "from-env");
        assert_eq!(config.host, "nas");
        assert_eq!(config.share, "Users");
    }

    #[test]
    fn test_validation() {
        let mut config = ClientConfig::from_json_str(SETTINGS).unwrap();
        config.share.clear();
        assert!(matches!(config.validate(), Err(SmbError::Config(_))));

        let mut config = ClientConfig::from_json_str(SETTINGS).unwrap();
        config.read_chunk_size = Some(0);
        assert!(matches!(config.validate(), Err(SmbError::Config(_))));

        assert!(ClientConfig::default().validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ClientConfig::from_json_str("{not json"),
            Err(SmbError::Json(_))
        ));
    }

    #[test]
    fn test_round_trip_keeps_section() {
        let config = ClientConfig::from_json_str(SETTINGS).unwrap();
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"SMB\""));
        assert!(json.contains("\"sharedFolderName\""));
        assert_eq!(ClientConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ClientConfig::from_json_str(SETTINGS).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("administrator"));
    }
}
