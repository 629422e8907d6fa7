//! Certificate manager: the operations behind the CLI commands.
//!
//! Every call reads through the store, so two managers over the same file
//! or database see each other's writes. `today` is fixed when the manager
//! is built; all classification in one invocation uses the same date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::expiry::{is_expired, is_expiring_within, ExpiryStatus, URGENT_DAYS, WARNING_DAYS};
use crate::model::{Certificate, CertificateUpdate};
use crate::store::CertificateStore;

/// Which certificates `list` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    Expired,
    /// Expiring within `[0, n]` days.
    ExpiringSoon(i64),
}

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub expiring_in_7_days: usize,
    pub expiring_in_30_days: usize,
    pub by_status: BTreeMap<ExpiryStatus, usize>,
}

impl Statistics {
    pub fn compute(certificates: &[Certificate], today: NaiveDate) -> Self {
        let mut by_status: BTreeMap<ExpiryStatus, usize> =
            ExpiryStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut expired = 0;
        let mut expiring_in_7_days = 0;
        let mut expiring_in_30_days = 0;

        for cert in certificates {
            let days = cert.days_until_expiration(today);
            *by_status.entry(ExpiryStatus::classify(days)).or_default() += 1;

            if is_expired(days) {
                expired += 1;
            }
            if is_expiring_within(days, URGENT_DAYS) {
                expiring_in_7_days += 1;
            }
            if is_expiring_within(days, WARNING_DAYS) {
                expiring_in_30_days += 1;
            }
        }

        let total = certificates.len();
        Self {
            total,
            valid: total - expired,
            expired,
            expiring_in_7_days,
            expiring_in_30_days,
            by_status,
        }
    }
}

pub struct CertificateManager {
    store: Box<dyn CertificateStore>,
    today: NaiveDate,
}

impl CertificateManager {
    pub fn new(store: Box<dyn CertificateStore>, today: NaiveDate) -> Self {
        Self { store, today }
    }

    /// Add a new certificate. Names are unique.
    pub async fn add(&self, certificate: Certificate) -> AppResult<Certificate> {
        if certificate.name.trim().is_empty() {
            return Err(AppError::validation("Certificate name must not be empty"));
        }

        self.store.insert(&certificate).await?;
        tracing::info!(
            "Added certificate '{}' (expires {}) via {}",
            certificate.name,
            certificate.expiration_date,
            self.store.backend_name()
        );
        Ok(certificate)
    }

    pub async fn get(&self, name: &str) -> AppResult<Certificate> {
        self.store
            .find(name)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate", name))
    }

    /// Apply a partial update and return the stored result.
    pub async fn update(&self, name: &str, update: CertificateUpdate) -> AppResult<Certificate> {
        if update.is_empty() {
            return Err(AppError::validation("No updates specified"));
        }
        if update.domain.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(AppError::validation("Domain must not be empty"));
        }

        let mut certificate = self.get(name).await?;
        certificate.apply(update);

        if !self.store.update(&certificate).await? {
            return Err(AppError::not_found("Certificate", name));
        }

        tracing::info!("Updated certificate '{}'", name);
        Ok(certificate)
    }

    pub async fn remove(&self, name: &str) -> AppResult<()> {
        if !self.store.delete(name).await? {
            return Err(AppError::not_found("Certificate", name));
        }
        tracing::info!("Removed certificate '{}'", name);
        Ok(())
    }

    /// All certificates in storage order.
    pub async fn list_all(&self) -> AppResult<Vec<Certificate>> {
        self.store.load_all().await
    }

    pub async fn expired(&self) -> AppResult<Vec<Certificate>> {
        let today = self.today;
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|c| is_expired(c.days_until_expiration(today)))
            .collect())
    }

    /// Certificates expiring within `[0, window]` days. Already-expired
    /// certificates are not included.
    pub async fn expiring_soon(&self, window: i64) -> AppResult<Vec<Certificate>> {
        let today = self.today;
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|c| is_expiring_within(c.days_until_expiration(today), window))
            .collect())
    }

    /// Filtered listing, soonest expiration first (ties by name).
    pub async fn list(&self, filter: ListFilter) -> AppResult<Vec<Certificate>> {
        let mut certificates = match filter {
            ListFilter::All => self.list_all().await?,
            ListFilter::Expired => self.expired().await?,
            ListFilter::ExpiringSoon(window) => {
                if window < 0 {
                    return Err(AppError::validation("--days must not be negative"));
                }
                self.expiring_soon(window).await?
            }
        };

        certificates.sort_by(|a, b| {
            a.expiration_date
                .cmp(&b.expiration_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(certificates)
    }

    pub async fn stats(&self) -> AppResult<Statistics> {
        let certificates = self.list_all().await?;
        Ok(Statistics::compute(&certificates, self.today))
    }

    /// Days left and status band for one certificate.
    pub fn status_of(&self, certificate: &Certificate) -> (i64, ExpiryStatus) {
        let days = certificate.days_until_expiration(self.today);
        (days, ExpiryStatus::classify(days))
    }
}
