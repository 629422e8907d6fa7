//! Domain records: tracked certificates and the staff directory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::expiry::{days_until, ExpiryStatus};

/// Date format used on the command line, in the JSON file and in SQLite.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|source| AppError::InvalidDate {
        input: input.to_string(),
        source,
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A tracked certificate. `name` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub name: String,
    pub domain: String,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub notes: String,
}

impl Certificate {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            expiration_date,
            issuer: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn days_until_expiration(&self, today: NaiveDate) -> i64 {
        days_until(self.expiration_date, today)
    }

    pub fn status(&self, today: NaiveDate) -> ExpiryStatus {
        ExpiryStatus::for_date(self.expiration_date, today)
    }

    /// Apply the present fields of `update` in place.
    pub fn apply(&mut self, update: CertificateUpdate) {
        if let Some(domain) = update.domain {
            self.domain = domain;
        }
        if let Some(expiration_date) = update.expiration_date {
            self.expiration_date = expiration_date;
        }
        if let Some(issuer) = update.issuer {
            self.issuer = issuer;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
    }
}

/// Partial update payload for a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateUpdate {
    pub domain: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub issuer: Option<String>,
    pub notes: Option<String>,
}

impl CertificateUpdate {
    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.expiration_date.is_none()
            && self.issuer.is_none()
            && self.notes.is_none()
    }
}

// ---- Staff directory ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub name: String,
}

/// Kind of certificate an employee can hold (e.g. "First Aid").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertName {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    Active,
    Inactive,
}

impl EmploymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentStatus::Active => "active",
            EmploymentStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(EmploymentStatus::Active),
            "inactive" => Ok(EmploymentStatus::Inactive),
            other => Err(AppError::validation(format!("Invalid employment status: {}", other))),
        }
    }
}

/// A certificate held by an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertExpiration {
    pub id: i64,
    pub cert_name: CertName,
    pub expiration_date: NaiveDate,
    pub date_made: Option<NaiveDate>,
}

impl CertExpiration {
    pub fn status(&self, today: NaiveDate) -> ExpiryStatus {
        ExpiryStatus::for_date(self.expiration_date, today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    /// External identifier (badge / payroll number). Unique.
    pub employee_code: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub company: Option<Company>,
    pub position: Option<Position>,
    pub status: EmploymentStatus,
    pub included_in_mdp: bool,
    pub cert_expirations: Vec<CertExpiration>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn is_active(&self) -> bool {
        self.status == EmploymentStatus::Active
    }
}

/// Payload for creating an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_code: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
    pub position_id: Option<i64>,
    pub included_in_mdp: bool,
}
