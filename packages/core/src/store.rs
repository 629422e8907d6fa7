//! Certificate persistence.
//!
//! `CertificateStore` is the seam between the manager and the backing
//! storage. Two implementations exist: a flat JSON file
//! ([`JsonCertificateStore`]) and a SQLite table ([`SqliteCertificateStore`]).
//! The manager does not know which one it is talking to.
//!
//! The keyed operations have whole-collection default implementations
//! (load, modify, save back), which is all the JSON file needs. The SQLite
//! store overrides them with single-row statements.

pub mod json;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::model::Certificate;

pub use json::JsonCertificateStore;
pub use sqlite::SqliteCertificateStore;

/// Default JSON storage path, relative to the working directory.
pub const DEFAULT_STORAGE_FILE: &str = "certificates.json";

#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Short backend name for logging.
    fn backend_name(&self) -> &str;

    /// Every stored certificate, in storage order.
    async fn load_all(&self) -> AppResult<Vec<Certificate>>;

    /// Replace the stored contents with `certificates`.
    async fn save_all(&self, certificates: &[Certificate]) -> AppResult<()>;

    async fn find(&self, name: &str) -> AppResult<Option<Certificate>> {
        let certificates = self.load_all().await?;
        Ok(certificates.into_iter().find(|c| c.name == name))
    }

    /// Insert a new certificate. Fails with `Duplicate` if the name is taken.
    async fn insert(&self, certificate: &Certificate) -> AppResult<()> {
        let mut certificates = self.load_all().await?;
        if certificates.iter().any(|c| c.name == certificate.name) {
            return Err(AppError::duplicate("Certificate", &certificate.name));
        }
        certificates.push(certificate.clone());
        self.save_all(&certificates).await
    }

    /// Overwrite the record with the same name.
    /// Returns `false` if no such record exists.
    async fn update(&self, certificate: &Certificate) -> AppResult<bool> {
        let mut certificates = self.load_all().await?;
        match certificates.iter_mut().find(|c| c.name == certificate.name) {
            Some(slot) => {
                *slot = certificate.clone();
                self.save_all(&certificates).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete by name. Returns `false` if no such record exists.
    async fn delete(&self, name: &str) -> AppResult<bool> {
        let mut certificates = self.load_all().await?;
        let before = certificates.len();
        certificates.retain(|c| c.name != name);
        if certificates.len() == before {
            return Ok(false);
        }
        self.save_all(&certificates).await?;
        Ok(true)
    }
}
