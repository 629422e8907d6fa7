//! Text and JSON rendering for command output.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppResult;
use crate::expiry::ExpiryStatus;
use crate::manager::Statistics;
use crate::model::{format_date, Certificate, Employee};

const RULE_WIDTH: usize = 80;

/// A certificate with its computed expiry fields, for JSON output.
#[derive(Debug, Serialize)]
pub struct CertificateView<'a> {
    #[serde(flatten)]
    pub certificate: &'a Certificate,
    pub days_left: i64,
    pub status: ExpiryStatus,
}

impl<'a> CertificateView<'a> {
    pub fn new(certificate: &'a Certificate, today: NaiveDate) -> Self {
        let days_left = certificate.days_until_expiration(today);
        Self {
            certificate,
            days_left,
            status: ExpiryStatus::classify(days_left),
        }
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(RULE_WIDTH))
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Render rows as a left-aligned table with a header rule.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&format_row(headers.to_vec()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn days_left_cell(days: i64) -> String {
    if days >= 0 {
        days.to_string()
    } else {
        format!("{} (expired)", days)
    }
}

pub fn certificate_table(certificates: &[Certificate], today: NaiveDate) -> String {
    if certificates.is_empty() {
        return "No certificates found.\n".to_string();
    }

    let rows: Vec<Vec<String>> = certificates
        .iter()
        .map(|cert| {
            let days = cert.days_until_expiration(today);
            vec![
                cert.name.clone(),
                cert.domain.clone(),
                format_date(cert.expiration_date),
                days_left_cell(days),
                or_na(&cert.issuer).to_string(),
                ExpiryStatus::classify(days).to_string(),
            ]
        })
        .collect();

    table(
        &["Name", "Domain", "Expiration Date", "Days Left", "Issuer", "Status"],
        &rows,
    )
}

pub fn certificate_detail(cert: &Certificate, today: NaiveDate) -> String {
    let days = cert.days_until_expiration(today);
    let mut out = heading("Certificate Details:");
    out.push_str(&format!("Name:            {}\n", cert.name));
    out.push_str(&format!("Domain:          {}\n", cert.domain));
    out.push_str(&format!("Expiration Date: {}\n", format_date(cert.expiration_date)));
    out.push_str(&format!("Days Left:       {}\n", days));
    out.push_str(&format!("Issuer:          {}\n", or_na(&cert.issuer)));
    out.push_str(&format!("Notes:           {}\n", or_na(&cert.notes)));
    out.push_str(&format!("Status:          {}\n", ExpiryStatus::classify(days)));
    out
}

pub fn statistics(stats: &Statistics) -> String {
    let mut out = heading("Certificate Statistics:");
    out.push_str(&format!("Total Certificates:     {}\n", stats.total));
    out.push_str(&format!("Valid Certificates:     {}\n", stats.valid));
    out.push_str(&format!("Expired Certificates:   {}\n", stats.expired));
    out.push_str(&format!("Expiring in 7 Days:     {}\n", stats.expiring_in_7_days));
    out.push_str(&format!("Expiring in 30 Days:    {}\n", stats.expiring_in_30_days));
    out.push('\n');
    for (status, count) in &stats.by_status {
        out.push_str(&format!("{:<8} {}\n", status.label(), count));
    }
    out
}

/// `(id, name)` rows of a lookup table.
pub fn lookup_table(rows: &[(i64, &str)]) -> String {
    if rows.is_empty() {
        return "No entries found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(id, name)| vec![id.to_string(), name.to_string()])
        .collect();
    table(&["Id", "Name"], &rows)
}

/// Worst status across an employee's certificates, if they hold any.
fn worst_status(employee: &Employee, today: NaiveDate) -> Option<ExpiryStatus> {
    employee
        .cert_expirations
        .iter()
        .map(|x| x.status(today))
        .min()
}

pub fn employee_table(employees: &[Employee], today: NaiveDate) -> String {
    if employees.is_empty() {
        return "No employees found.\n".to_string();
    }

    let rows: Vec<Vec<String>> = employees
        .iter()
        .map(|e| {
            vec![
                e.employee_code.clone(),
                e.full_name(),
                e.company.as_ref().map(|c| c.name.clone()).unwrap_or_else(|| "N/A".into()),
                e.position.as_ref().map(|p| p.name.clone()).unwrap_or_else(|| "N/A".into()),
                e.status.as_str().to_string(),
                e.cert_expirations.len().to_string(),
                worst_status(e, today).map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();

    table(
        &["Code", "Name", "Company", "Position", "Status", "Certs", "Worst"],
        &rows,
    )
}

pub fn employee_detail(employee: &Employee, today: NaiveDate) -> String {
    let mut out = heading("Employee Details:");
    out.push_str(&format!("Code:      {}\n", employee.employee_code));
    out.push_str(&format!("Name:      {}\n", employee.full_name()));
    out.push_str(&format!("Phone:     {}\n", employee.phone.as_deref().unwrap_or("N/A")));
    out.push_str(&format!(
        "Company:   {}\n",
        employee.company.as_ref().map_or("N/A", |c| c.name.as_str())
    ));
    out.push_str(&format!(
        "Position:  {}\n",
        employee.position.as_ref().map_or("N/A", |p| p.name.as_str())
    ));
    out.push_str(&format!("Status:    {}\n", employee.status.as_str()));
    out.push_str(&format!("MDP:       {}\n", if employee.included_in_mdp { "yes" } else { "no" }));
    out.push('\n');

    if employee.cert_expirations.is_empty() {
        out.push_str("No certificates recorded.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = employee
        .cert_expirations
        .iter()
        .map(|x| {
            let days = crate::expiry::days_until(x.expiration_date, today);
            vec![
                x.id.to_string(),
                x.cert_name.name.clone(),
                x.date_made.map(format_date).unwrap_or_else(|| "N/A".into()),
                format_date(x.expiration_date),
                days_left_cell(days),
                ExpiryStatus::classify(days).to_string(),
            ]
        })
        .collect();
    out.push_str(&table(
        &["Id", "Certificate", "Issued", "Expires", "Days Left", "Status"],
        &rows,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_date, CertExpiration, CertName, EmploymentStatus};
    use chrono::Duration;

    fn today() -> NaiveDate {
        parse_date("2025-01-01").unwrap()
    }

    #[test]
    fn empty_certificate_table_says_so() {
        assert_eq!(certificate_table(&[], today()), "No certificates found.\n");
    }

    #[test]
    fn certificate_table_shows_status_and_expired_days() {
        let certs = vec![
            Certificate::new("old", "old.example.com", today() - Duration::days(3)),
            Certificate::new("new", "new.example.com", today() + Duration::days(90)).with_issuer("CA"),
        ];
        let out = certificate_table(&certs, today());
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("Name"));
        assert!(lines[1].starts_with("----"));
        assert!(lines[2].contains("-3 (expired)"));
        assert!(lines[2].contains("N/A"));
        assert!(lines[2].ends_with("EXPIRED"));
        assert!(lines[3].contains("2025-04-01"));
        assert!(lines[3].ends_with("OK"));
    }

    #[test]
    fn columns_are_aligned() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["long".to_string(), "c".to_string()],
        ];
        let out = table(&["H1", "H2"], &rows);
        assert_eq!(out, "H1    H2\n----  --\na     b\nlong  c\n");
    }

    #[test]
    fn detail_view_lists_all_fields() {
        let cert = Certificate::new("web", "example.com", today() + Duration::days(5)).with_notes("prod");
        let out = certificate_detail(&cert, today());
        assert!(out.contains("Days Left:       5"));
        assert!(out.contains("Issuer:          N/A"));
        assert!(out.contains("Notes:           prod"));
        assert!(out.contains("Status:          URGENT"));
    }

    #[test]
    fn certificate_view_json_flattens_fields() {
        let cert = Certificate::new("web", "example.com", today() + Duration::days(45));
        let json = to_json(&CertificateView::new(&cert, today())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "web");
        assert_eq!(value["days_left"], 45);
        assert_eq!(value["status"], "OK");
    }

    #[test]
    fn employee_worst_status_is_most_urgent() {
        let cert_name = CertName { id: 1, name: "First Aid".into() };
        let employee = Employee {
            id: 1,
            employee_code: "E-1".into(),
            name: "Jane".into(),
            surname: "Doe".into(),
            phone: None,
            company: None,
            position: None,
            status: EmploymentStatus::Active,
            included_in_mdp: false,
            cert_expirations: vec![
                CertExpiration {
                    id: 1,
                    cert_name: cert_name.clone(),
                    expiration_date: today() + Duration::days(100),
                    date_made: None,
                },
                CertExpiration {
                    id: 2,
                    cert_name,
                    expiration_date: today() + Duration::days(10),
                    date_made: None,
                },
            ],
        };

        assert_eq!(worst_status(&employee, today()), Some(ExpiryStatus::Warning));
        let out = employee_table(&[employee.clone()], today());
        assert!(out.lines().nth(2).unwrap().ends_with("WARNING"));

        let detail = employee_detail(&employee, today());
        assert!(detail.contains("Name:      Jane Doe"));
        assert!(detail.contains("First Aid"));
    }
}
