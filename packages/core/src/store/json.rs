//! Flat JSON file store.
//!
//! The file holds a single array of certificate objects:
//! `[{"name", "domain", "expiration_date", "issuer", "notes"}, ...]`.
//! A missing (or blank) file is an empty store. A file that exists but does
//! not parse is an error; it is never overwritten with an empty list.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::CertificateStore;
use crate::error::AppResult;
use crate::model::Certificate;

#[derive(Debug, Clone)]
pub struct JsonCertificateStore {
    path: PathBuf,
}

impl JsonCertificateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CertificateStore for JsonCertificateStore {
    fn backend_name(&self) -> &str {
        "json"
    }

    async fn load_all(&self) -> AppResult<Vec<Certificate>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("Storage file {} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let certificates: Vec<Certificate> = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            "Loaded {} certificates from {}",
            certificates.len(),
            self.path.display()
        );
        Ok(certificates)
    }

    /// Writes to a sibling temp file, then renames over the target.
    async fn save_all(&self, certificates: &[Certificate]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut body = serde_json::to_vec_pretty(certificates)?;
        body.push(b'\n');

        let temp = self.temp_path();
        fs::write(&temp, &body).await?;
        fs::rename(&temp, &self.path).await?;

        tracing::debug!(
            "Saved {} certificates to {}",
            certificates.len(),
            self.path.display()
        );
        Ok(())
    }
}
