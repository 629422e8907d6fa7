//! SQLite-backed certificate store.
//!
//! Dates are stored as `YYYY-MM-DD` text so that lexical order matches
//! chronological order and the table stays readable from the sqlite shell.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::CertificateStore;
use crate::error::{AppError, AppResult};
use crate::model::{format_date, parse_date, Certificate};

pub struct SqliteCertificateStore {
    pool: SqlitePool,
}

impl SqliteCertificateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_certificate(row: &SqliteRow) -> AppResult<Certificate> {
    let expiration: String = row.try_get("expiration_date")?;
    Ok(Certificate {
        name: row.try_get("name")?,
        domain: row.try_get("domain")?,
        expiration_date: parse_date(&expiration)?,
        issuer: row.try_get("issuer")?,
        notes: row.try_get("notes")?,
    })
}

#[async_trait]
impl CertificateStore for SqliteCertificateStore {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn load_all(&self) -> AppResult<Vec<Certificate>> {
        let rows = sqlx::query(
            "SELECT name, domain, expiration_date, issuer, notes
             FROM certificates
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_certificate).collect()
    }

    /// Replace the table contents in a single transaction.
    async fn save_all(&self, certificates: &[Certificate]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM certificates")
            .execute(&mut *tx)
            .await?;

        for cert in certificates {
            sqlx::query(
                "INSERT INTO certificates (name, domain, expiration_date, issuer, notes)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&cert.name)
            .bind(&cert.domain)
            .bind(format_date(cert.expiration_date))
            .bind(&cert.issuer)
            .bind(&cert.notes)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_insert(e, "Certificate", &cert.name))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, name: &str) -> AppResult<Option<Certificate>> {
        let row = sqlx::query(
            "SELECT name, domain, expiration_date, issuer, notes
             FROM certificates
             WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_certificate).transpose()
    }

    async fn insert(&self, certificate: &Certificate) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO certificates (name, domain, expiration_date, issuer, notes)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&certificate.name)
        .bind(&certificate.domain)
        .bind(format_date(certificate.expiration_date))
        .bind(&certificate.issuer)
        .bind(&certificate.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Certificate", &certificate.name))?;

        Ok(())
    }

    async fn update(&self, certificate: &Certificate) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE certificates
             SET domain = ?, expiration_date = ?, issuer = ?, notes = ?, updated_at = datetime('now')
             WHERE name = ?",
        )
        .bind(&certificate.domain)
        .bind(format_date(certificate.expiration_date))
        .bind(&certificate.issuer)
        .bind(&certificate.notes)
        .bind(&certificate.name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM certificates WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    async fn make_store() -> SqliteCertificateStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        SqliteCertificateStore::new(pool)
    }

    fn cert(name: &str, date: &str) -> Certificate {
        Certificate::new(name, "example.com", parse_date(date).unwrap())
    }

    #[tokio::test]
    async fn insert_and_find_roundtrip() {
        let store = make_store().await;
        let original = cert("api", "2026-05-01").with_issuer("DigiCert").with_notes("EV");

        store.insert(&original).await.unwrap();
        let found = store.find("api").await.unwrap();

        assert_eq!(found, Some(original));
    }

    #[tokio::test]
    async fn insert_duplicate_name_is_rejected() {
        let store = make_store().await;
        store.insert(&cert("api", "2026-05-01")).await.unwrap();

        let err = store.insert(&cert("api", "2027-05-01")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn load_all_keeps_insertion_order() {
        let store = make_store().await;
        for (name, date) in [("c", "2026-01-01"), ("a", "2025-01-01"), ("b", "2027-01-01")] {
            store.insert(&cert(name, date)).await.unwrap();
        }

        let names: Vec<String> = store.load_all().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn update_returns_false_for_missing_name() {
        let store = make_store().await;
        assert!(!store.update(&cert("ghost", "2026-01-01")).await.unwrap());
    }

    #[tokio::test]
    async fn update_overwrites_fields() {
        let store = make_store().await;
        store.insert(&cert("api", "2026-05-01")).await.unwrap();

        let changed = cert("api", "2028-01-01").with_notes("renewed");
        assert!(store.update(&changed).await.unwrap());
        assert_eq!(store.find("api").await.unwrap(), Some(changed));
    }

    #[tokio::test]
    async fn delete_then_find_is_none() {
        let store = make_store().await;
        store.insert(&cert("api", "2026-05-01")).await.unwrap();

        assert!(store.delete("api").await.unwrap());
        assert!(!store.delete("api").await.unwrap());
        assert_eq!(store.find("api").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_all_replaces_contents() {
        let store = make_store().await;
        store.insert(&cert("old", "2026-05-01")).await.unwrap();

        store
            .save_all(&[cert("x", "2026-01-01"), cert("y", "2026-02-01")])
            .await
            .unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(store.find("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_all_with_duplicate_names_rolls_back() {
        let store = make_store().await;
        store.insert(&cert("keep", "2026-05-01")).await.unwrap();

        let err = store
            .save_all(&[cert("x", "2026-01-01"), cert("x", "2026-02-01")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
        assert!(store.find("keep").await.unwrap().is_some());
    }
}
