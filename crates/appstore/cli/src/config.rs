use appstore_core::Environment;
use appstore_crypto::{Certificate, CertificateError, SignedDataVerifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to read root certificate {path}")]
    CertificateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load root certificate {path}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: CertificateError,
    },
    #[error("Failed to build verifier")]
    Verifier(#[source] CertificateError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: Environment,
    #[serde(default)]
    pub online_checks: bool,
    /// DER or PEM files, scanned in order. Relative paths resolve against the config file.
    #[serde(default)]
    pub root_certificates: Vec<PathBuf>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml(&content, base)
    }

    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        for root in &mut config.root_certificates {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("appstore-verify")
            .join("config.toml")
    }

    pub fn load_root_certificates(&self) -> Result<Vec<Certificate>, ConfigError> {
        self.root_certificates
            .iter()
            .map(|path| load_certificate(path))
            .collect()
    }

    pub fn verifier(&self) -> Result<SignedDataVerifier, ConfigError> {
        let roots = self.load_root_certificates()?;
        tracing::info!(
            roots = roots.len(),
            environment = %self.environment,
            online_checks = self.online_checks,
            "loaded trust roots"
        );
        SignedDataVerifier::new(roots, self.environment, self.online_checks)
            .map_err(ConfigError::Verifier)
    }
}

/// Load a certificate file, PEM if it looks like PEM, DER otherwise.
pub fn load_certificate(path: &Path) -> Result<Certificate, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::CertificateRead {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = match std::str::from_utf8(&bytes) {
        Ok(text) if text.trim_start().starts_with("-----BEGIN") => Certificate::from_pem(text),
        _ => Certificate::from_der(&bytes, false),
    };

    parsed.map_err(|source| ConfigError::Certificate {
        path: path.to_path_buf(),
        source,
    })
}
