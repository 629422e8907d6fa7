//! Relational staff directory.
//!
//! Companies, positions and certificate names are plain lookup tables with
//! unique names. Employees reference a company and a position and own a list
//! of cert expirations. All reads and writes for these tables live here; the
//! standalone certificate list is handled by [`crate::store`].

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::expiry::{days_until, is_expiring_within};
use crate::model::{
    format_date, parse_date, CertExpiration, CertName, Company, Employee, EmploymentStatus,
    NewEmployee, Position,
};

/// The three name-only lookup tables.
#[derive(Debug, Clone, Copy)]
enum LookupTable {
    Companies,
    Positions,
    CertNames,
}

impl LookupTable {
    fn table(self) -> &'static str {
        match self {
            LookupTable::Companies => "companies",
            LookupTable::Positions => "positions",
            LookupTable::CertNames => "cert_names",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            LookupTable::Companies => "Company",
            LookupTable::Positions => "Position",
            LookupTable::CertNames => "Certificate name",
        }
    }
}

const EMPLOYEE_SELECT: &str = "SELECT e.id, e.employee_code, e.name, e.surname, e.phone,
        e.status, e.included_in_mdp,
        c.id AS company_id, c.name AS company_name,
        p.id AS position_id, p.name AS position_name
 FROM employees e
 LEFT JOIN companies c ON c.id = e.company_id
 LEFT JOIN positions p ON p.id = e.position_id";

const EXPIRATION_SELECT: &str = "SELECT x.id, x.employee_id, x.expiration_date, x.date_made,
        n.id AS cert_name_id, n.name AS cert_name
 FROM cert_expirations x
 JOIN cert_names n ON n.id = x.cert_name_id";

fn validate_name(kind: &str, name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation(format!("{} name must not be empty", kind)));
    }
    Ok(())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

fn row_to_pair(row: &SqliteRow) -> AppResult<(i64, String)> {
    Ok((row.try_get("id")?, row.try_get("name")?))
}

fn row_to_employee(row: &SqliteRow) -> AppResult<Employee> {
    let status: String = row.try_get("status")?;
    let company_id: Option<i64> = row.try_get("company_id")?;
    let company_name: Option<String> = row.try_get("company_name")?;
    let position_id: Option<i64> = row.try_get("position_id")?;
    let position_name: Option<String> = row.try_get("position_name")?;
    let included_in_mdp: i64 = row.try_get("included_in_mdp")?;

    Ok(Employee {
        id: row.try_get("id")?,
        employee_code: row.try_get("employee_code")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        phone: row.try_get("phone")?,
        company: company_id
            .zip(company_name)
            .map(|(id, name)| Company { id, name }),
        position: position_id
            .zip(position_name)
            .map(|(id, name)| Position { id, name }),
        status: EmploymentStatus::parse(&status)?,
        included_in_mdp: included_in_mdp != 0,
        cert_expirations: Vec::new(),
    })
}

fn row_to_expiration(row: &SqliteRow) -> AppResult<(i64, CertExpiration)> {
    let employee_id: i64 = row.try_get("employee_id")?;
    let expiration_date: String = row.try_get("expiration_date")?;
    let date_made: Option<String> = row.try_get("date_made")?;

    Ok((
        employee_id,
        CertExpiration {
            id: row.try_get("id")?,
            cert_name: CertName {
                id: row.try_get("cert_name_id")?,
                name: row.try_get("cert_name")?,
            },
            expiration_date: parse_date(&expiration_date)?,
            date_made: date_made.as_deref().map(parse_date).transpose()?,
        },
    ))
}

/// Repository for the staff directory tables.
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ---- Lookup tables (shared) ----

    async fn create_lookup(&self, table: LookupTable, name: &str) -> AppResult<(i64, String)> {
        validate_name(table.kind(), name)?;
        let name = name.trim();

        let sql = format!("INSERT INTO {} (name) VALUES (?)", table.table());
        let result = sqlx::query(&sql)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_insert(e, table.kind(), name))?;

        tracing::info!("Created {} '{}'", table.kind().to_lowercase(), name);
        Ok((result.last_insert_rowid(), name.to_string()))
    }

    async fn get_lookup_by_id(&self, table: LookupTable, id: i64) -> AppResult<Option<(i64, String)>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?", table.table());
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_pair).transpose()
    }

    async fn get_lookup_by_name(
        &self,
        table: LookupTable,
        name: &str,
    ) -> AppResult<Option<(i64, String)>> {
        let sql = format!("SELECT id, name FROM {} WHERE name = ?", table.table());
        let row = sqlx::query(&sql).bind(name.trim()).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_pair).transpose()
    }

    async fn list_lookup(&self, table: LookupTable) -> AppResult<Vec<(i64, String)>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name ASC", table.table());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_pair).collect()
    }

    async fn rename_lookup(&self, table: LookupTable, id: i64, name: &str) -> AppResult<()> {
        validate_name(table.kind(), name)?;
        let name = name.trim();

        let sql = format!("UPDATE {} SET name = ? WHERE id = ?", table.table());
        let result = sqlx::query(&sql)
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_insert(e, table.kind(), name))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(table.kind(), id.to_string()));
        }
        Ok(())
    }

    async fn delete_lookup(&self, table: LookupTable, id: i64) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table.table());
        let result = match sqlx::query(&sql).bind(id).execute(&self.pool).await {
            Ok(result) => result,
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(AppError::validation(format!(
                    "{} {} is still referenced and cannot be deleted",
                    table.kind(),
                    id
                )));
            }
            Err(err) => return Err(err.into()),
        };

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(table.kind(), id.to_string()));
        }
        tracing::info!("Deleted {} {}", table.kind().to_lowercase(), id);
        Ok(())
    }

    // ---- Companies ----

    pub async fn create_company(&self, name: &str) -> AppResult<Company> {
        let (id, name) = self.create_lookup(LookupTable::Companies, name).await?;
        Ok(Company { id, name })
    }

    pub async fn get_company_by_id(&self, id: i64) -> AppResult<Option<Company>> {
        let found = self.get_lookup_by_id(LookupTable::Companies, id).await?;
        Ok(found.map(|(id, name)| Company { id, name }))
    }

    pub async fn get_company_by_name(&self, name: &str) -> AppResult<Option<Company>> {
        let found = self.get_lookup_by_name(LookupTable::Companies, name).await?;
        Ok(found.map(|(id, name)| Company { id, name }))
    }

    pub async fn list_companies(&self) -> AppResult<Vec<Company>> {
        let rows = self.list_lookup(LookupTable::Companies).await?;
        Ok(rows.into_iter().map(|(id, name)| Company { id, name }).collect())
    }

    pub async fn rename_company(&self, id: i64, name: &str) -> AppResult<()> {
        self.rename_lookup(LookupTable::Companies, id, name).await
    }

    /// Employees of a deleted company keep their record with no company.
    pub async fn delete_company(&self, id: i64) -> AppResult<()> {
        self.delete_lookup(LookupTable::Companies, id).await
    }

    // ---- Positions ----

    pub async fn create_position(&self, name: &str) -> AppResult<Position> {
        let (id, name) = self.create_lookup(LookupTable::Positions, name).await?;
        Ok(Position { id, name })
    }

    pub async fn get_position_by_id(&self, id: i64) -> AppResult<Option<Position>> {
        let found = self.get_lookup_by_id(LookupTable::Positions, id).await?;
        Ok(found.map(|(id, name)| Position { id, name }))
    }

    pub async fn get_position_by_name(&self, name: &str) -> AppResult<Option<Position>> {
        let found = self.get_lookup_by_name(LookupTable::Positions, name).await?;
        Ok(found.map(|(id, name)| Position { id, name }))
    }

    pub async fn list_positions(&self) -> AppResult<Vec<Position>> {
        let rows = self.list_lookup(LookupTable::Positions).await?;
        Ok(rows.into_iter().map(|(id, name)| Position { id, name }).collect())
    }

    pub async fn rename_position(&self, id: i64, name: &str) -> AppResult<()> {
        self.rename_lookup(LookupTable::Positions, id, name).await
    }

    pub async fn delete_position(&self, id: i64) -> AppResult<()> {
        self.delete_lookup(LookupTable::Positions, id).await
    }

    // ---- Certificate names ----

    pub async fn create_cert_name(&self, name: &str) -> AppResult<CertName> {
        let (id, name) = self.create_lookup(LookupTable::CertNames, name).await?;
        Ok(CertName { id, name })
    }

    pub async fn get_cert_name_by_id(&self, id: i64) -> AppResult<Option<CertName>> {
        let found = self.get_lookup_by_id(LookupTable::CertNames, id).await?;
        Ok(found.map(|(id, name)| CertName { id, name }))
    }

    pub async fn get_cert_name_by_name(&self, name: &str) -> AppResult<Option<CertName>> {
        let found = self.get_lookup_by_name(LookupTable::CertNames, name).await?;
        Ok(found.map(|(id, name)| CertName { id, name }))
    }

    pub async fn list_cert_names(&self) -> AppResult<Vec<CertName>> {
        let rows = self.list_lookup(LookupTable::CertNames).await?;
        Ok(rows.into_iter().map(|(id, name)| CertName { id, name }).collect())
    }

    pub async fn rename_cert_name(&self, id: i64, name: &str) -> AppResult<()> {
        self.rename_lookup(LookupTable::CertNames, id, name).await
    }

    /// Fails while any employee still holds a certificate of this name.
    pub async fn delete_cert_name(&self, id: i64) -> AppResult<()> {
        self.delete_lookup(LookupTable::CertNames, id).await
    }

    // ---- Employees ----

    pub async fn create_employee(&self, new: &NewEmployee) -> AppResult<Employee> {
        validate_name("Employee", &new.name)?;
        if new.employee_code.trim().is_empty() {
            return Err(AppError::validation("Employee code must not be empty"));
        }

        let result = sqlx::query(
            "INSERT INTO employees
             (employee_code, name, surname, phone, company_id, position_id, status, included_in_mdp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.employee_code.trim())
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.phone)
        .bind(new.company_id)
        .bind(new.position_id)
        .bind(EmploymentStatus::Active.as_str())
        .bind(if new.included_in_mdp { 1i64 } else { 0i64 })
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::validation("Unknown company or position id")
            } else {
                AppError::from_insert(e, "Employee", &new.employee_code)
            }
        })?;

        let id = result.last_insert_rowid();
        tracing::info!("Created employee '{}' (id {})", new.employee_code, id);

        self.get_employee_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee", id.to_string()))
    }

    pub async fn get_employee_by_id(&self, id: i64) -> AppResult<Option<Employee>> {
        let sql = format!("{} WHERE e.id = ?", EMPLOYEE_SELECT);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        self.hydrate_one(row).await
    }

    pub async fn get_employee_by_code(&self, code: &str) -> AppResult<Option<Employee>> {
        let sql = format!("{} WHERE e.employee_code = ?", EMPLOYEE_SELECT);
        let row = sqlx::query(&sql).bind(code).fetch_optional(&self.pool).await?;
        self.hydrate_one(row).await
    }

    /// First employee whose given name, or "name surname", matches.
    pub async fn get_employee_by_name(&self, name: &str) -> AppResult<Option<Employee>> {
        let sql = format!(
            "{} WHERE e.name = ? OR (e.name || ' ' || e.surname) = ? ORDER BY e.id ASC LIMIT 1",
            EMPLOYEE_SELECT
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        self.hydrate_one(row).await
    }

    /// All employees ordered by surname, with their cert expirations.
    pub async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        let sql = format!("{} ORDER BY e.surname ASC, e.name ASC, e.id ASC", EMPLOYEE_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut employees = rows.iter().map(row_to_employee).collect::<AppResult<Vec<_>>>()?;

        let sql = format!("{} ORDER BY x.expiration_date ASC, x.id ASC", EXPIRATION_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut by_employee: HashMap<i64, Vec<CertExpiration>> = HashMap::new();
        for row in &rows {
            let (employee_id, expiration) = row_to_expiration(row)?;
            by_employee.entry(employee_id).or_default().push(expiration);
        }

        for employee in &mut employees {
            employee.cert_expirations = by_employee.remove(&employee.id).unwrap_or_default();
        }
        Ok(employees)
    }

    /// Persist every scalar field and reference of `employee`.
    /// Cert expirations are managed separately.
    pub async fn update_employee(&self, employee: &Employee) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE employees
             SET employee_code = ?, name = ?, surname = ?, phone = ?,
                 company_id = ?, position_id = ?, status = ?, included_in_mdp = ?
             WHERE id = ?",
        )
        .bind(&employee.employee_code)
        .bind(&employee.name)
        .bind(&employee.surname)
        .bind(&employee.phone)
        .bind(employee.company.as_ref().map(|c| c.id))
        .bind(employee.position.as_ref().map(|p| p.id))
        .bind(employee.status.as_str())
        .bind(if employee.included_in_mdp { 1i64 } else { 0i64 })
        .bind(employee.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Employee", &employee.employee_code))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Employee", employee.id.to_string()));
        }
        Ok(())
    }

    pub async fn set_employee_status(&self, code: &str, status: EmploymentStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE employees SET status = ? WHERE employee_code = ?")
            .bind(status.as_str())
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Employee", code));
        }
        tracing::info!("Employee '{}' is now {}", code, status.as_str());
        Ok(())
    }

    // ---- Cert expirations ----

    pub async fn add_cert_expiration(
        &self,
        employee_id: i64,
        cert_name_id: i64,
        expiration_date: NaiveDate,
        date_made: Option<NaiveDate>,
    ) -> AppResult<CertExpiration> {
        let cert_name = self
            .get_cert_name_by_id(cert_name_id)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate name", cert_name_id.to_string()))?;

        let exists = sqlx::query("SELECT 1 FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found("Employee", employee_id.to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO cert_expirations (employee_id, cert_name_id, expiration_date, date_made)
             VALUES (?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(cert_name_id)
        .bind(format_date(expiration_date))
        .bind(date_made.map(format_date))
        .execute(&self.pool)
        .await?;

        Ok(CertExpiration {
            id: result.last_insert_rowid(),
            cert_name,
            expiration_date,
            date_made,
        })
    }

    pub async fn remove_cert_expiration(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM cert_expirations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Cert expiration", id.to_string()));
        }
        Ok(())
    }

    /// Active employees holding at least one certificate that expires within
    /// `[0, window]` days of `today`.
    pub async fn employees_with_expiring_certs(
        &self,
        today: NaiveDate,
        window: i64,
    ) -> AppResult<Vec<Employee>> {
        let employees = self.list_employees().await?;
        Ok(employees
            .into_iter()
            .filter(|e| e.is_active())
            .filter(|e| {
                e.cert_expirations
                    .iter()
                    .any(|x| is_expiring_within(days_until(x.expiration_date, today), window))
            })
            .collect())
    }

    async fn fetch_expirations_for(&self, employee_id: i64) -> AppResult<Vec<CertExpiration>> {
        let sql = format!(
            "{} WHERE x.employee_id = ? ORDER BY x.expiration_date ASC, x.id ASC",
            EXPIRATION_SELECT
        );
        let rows = sqlx::query(&sql).bind(employee_id).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row_to_expiration(row).map(|(_, x)| x))
            .collect()
    }

    async fn hydrate_one(&self, row: Option<SqliteRow>) -> AppResult<Option<Employee>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut employee = row_to_employee(&row)?;
        employee.cert_expirations = self.fetch_expirations_for(employee.id).await?;
        Ok(Some(employee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use chrono::Duration;

    async fn make_repo() -> StaffRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        StaffRepository::new(pool)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn new_employee(code: &str, name: &str) -> NewEmployee {
        NewEmployee {
            employee_code: code.to_string(),
            name: name.to_string(),
            surname: "Doe".to_string(),
            phone: Some("555-0100".to_string()),
            company_id: None,
            position_id: None,
            included_in_mdp: false,
        }
    }

    // ---- lookup tables ----

    #[tokio::test]
    async fn create_and_find_company() {
        let repo = make_repo().await;
        let company = repo.create_company("Acme").await.unwrap();
        assert!(company.id > 0);

        assert_eq!(repo.get_company_by_id(company.id).await.unwrap(), Some(company.clone()));
        assert_eq!(repo.get_company_by_name("Acme").await.unwrap(), Some(company));
        assert!(repo.get_company_by_name("Globex").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_names_are_trimmed_on_create_and_find() {
        let repo = make_repo().await;
        let company = repo.create_company("Acme ").await.unwrap();
        assert_eq!(company.name, "Acme");
        assert_eq!(repo.get_company_by_name("Acme ").await.unwrap(), Some(company.clone()));
        assert_eq!(repo.get_company_by_name("  Acme").await.unwrap(), Some(company));

        let position = repo.create_position(" Welder").await.unwrap();
        assert_eq!(repo.get_position_by_name("Welder ").await.unwrap(), Some(position.clone()));
        assert_eq!(repo.get_position_by_id(position.id).await.unwrap(), Some(position));
        assert!(repo.get_position_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_lookup_names_are_rejected() {
        let repo = make_repo().await;
        repo.create_position("Welder").await.unwrap();
        let err = repo.create_position("Welder").await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { kind: "Position", .. }));
    }

    #[tokio::test]
    async fn blank_lookup_name_is_rejected() {
        let repo = make_repo().await;
        let err = repo.create_cert_name("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_lookup_is_sorted_by_name() {
        let repo = make_repo().await;
        for name in ["Zulu", "Alpha", "Mike"] {
            repo.create_company(name).await.unwrap();
        }
        let names: Vec<String> = repo.list_companies().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Alpha", "Mike", "Zulu"]);
    }

    #[tokio::test]
    async fn rename_and_delete_lookup() {
        let repo = make_repo().await;
        let a = repo.create_cert_name("First Aid").await.unwrap();
        repo.create_cert_name("Forklift").await.unwrap();

        repo.rename_cert_name(a.id, "First Aid L2").await.unwrap();
        assert_eq!(repo.get_cert_name_by_id(a.id).await.unwrap().unwrap().name, "First Aid L2");

        let dup = repo.rename_cert_name(a.id, "Forklift").await.unwrap_err();
        assert!(matches!(dup, AppError::Duplicate { .. }));

        assert!(repo.rename_cert_name(999, "X").await.unwrap_err().is_not_found());

        repo.delete_cert_name(a.id).await.unwrap();
        assert!(repo.delete_cert_name(a.id).await.unwrap_err().is_not_found());
    }

    // ---- employees ----

    #[tokio::test]
    async fn create_employee_with_company_and_position() {
        let repo = make_repo().await;
        let company = repo.create_company("Acme").await.unwrap();
        let position = repo.create_position("Electrician").await.unwrap();

        let mut new = new_employee("E-001", "Jane");
        new.company_id = Some(company.id);
        new.position_id = Some(position.id);
        new.included_in_mdp = true;

        let employee = repo.create_employee(&new).await.unwrap();
        assert_eq!(employee.employee_code, "E-001");
        assert_eq!(employee.company, Some(company));
        assert_eq!(employee.position, Some(position));
        assert_eq!(employee.status, EmploymentStatus::Active);
        assert!(employee.included_in_mdp);
        assert!(employee.cert_expirations.is_empty());
    }

    #[tokio::test]
    async fn duplicate_employee_code_is_rejected() {
        let repo = make_repo().await;
        repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();
        let err = repo.create_employee(&new_employee("E-001", "John")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { kind: "Employee", .. }));
    }

    #[tokio::test]
    async fn unknown_company_id_is_rejected() {
        let repo = make_repo().await;
        let mut new = new_employee("E-001", "Jane");
        new.company_id = Some(42);
        let err = repo.create_employee(&new).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn lookup_employee_by_code_and_name() {
        let repo = make_repo().await;
        let created = repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();

        assert_eq!(repo.get_employee_by_code("E-001").await.unwrap(), Some(created.clone()));
        assert_eq!(repo.get_employee_by_name("Jane").await.unwrap(), Some(created.clone()));
        assert_eq!(repo.get_employee_by_name("Jane Doe").await.unwrap(), Some(created));
        assert!(repo.get_employee_by_code("E-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_employee_persists_fields() {
        let repo = make_repo().await;
        let company = repo.create_company("Acme").await.unwrap();
        let mut employee = repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();

        employee.surname = "Smith".into();
        employee.phone = None;
        employee.company = Some(company.clone());
        repo.update_employee(&employee).await.unwrap();

        let reloaded = repo.get_employee_by_id(employee.id).await.unwrap().unwrap();
        assert_eq!(reloaded.surname, "Smith");
        assert_eq!(reloaded.phone, None);
        assert_eq!(reloaded.company, Some(company));
    }

    #[tokio::test]
    async fn deleting_company_detaches_employees() {
        let repo = make_repo().await;
        let company = repo.create_company("Acme").await.unwrap();
        let mut new = new_employee("E-001", "Jane");
        new.company_id = Some(company.id);
        let employee = repo.create_employee(&new).await.unwrap();

        repo.delete_company(company.id).await.unwrap();

        let reloaded = repo.get_employee_by_id(employee.id).await.unwrap().unwrap();
        assert!(reloaded.company.is_none());
    }

    #[tokio::test]
    async fn set_status_toggles_active_flag() {
        let repo = make_repo().await;
        repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();

        repo.set_employee_status("E-001", EmploymentStatus::Inactive).await.unwrap();
        let employee = repo.get_employee_by_code("E-001").await.unwrap().unwrap();
        assert!(!employee.is_active());

        let err = repo.set_employee_status("E-404", EmploymentStatus::Active).await.unwrap_err();
        assert!(err.is_not_found());
    }

    // ---- cert expirations ----

    #[tokio::test]
    async fn add_and_remove_cert_expiration() {
        let repo = make_repo().await;
        let employee = repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();
        let first_aid = repo.create_cert_name("First Aid").await.unwrap();

        let made = today() - Duration::days(700);
        let expiration = repo
            .add_cert_expiration(employee.id, first_aid.id, today() + Duration::days(30), Some(made))
            .await
            .unwrap();
        assert_eq!(expiration.cert_name, first_aid);

        let loaded = repo.get_employee_by_id(employee.id).await.unwrap().unwrap();
        assert_eq!(loaded.cert_expirations, vec![expiration.clone()]);

        repo.remove_cert_expiration(expiration.id).await.unwrap();
        assert!(repo.remove_cert_expiration(expiration.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn add_cert_expiration_requires_known_references() {
        let repo = make_repo().await;
        let employee = repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();
        let cert = repo.create_cert_name("Forklift").await.unwrap();

        let missing_cert = repo
            .add_cert_expiration(employee.id, 999, today(), None)
            .await
            .unwrap_err();
        assert!(missing_cert.is_not_found());

        let missing_employee = repo
            .add_cert_expiration(999, cert.id, today(), None)
            .await
            .unwrap_err();
        assert!(missing_employee.is_not_found());
    }

    #[tokio::test]
    async fn cert_name_in_use_cannot_be_deleted() {
        let repo = make_repo().await;
        let employee = repo.create_employee(&new_employee("E-001", "Jane")).await.unwrap();
        let cert = repo.create_cert_name("Forklift").await.unwrap();
        repo.add_cert_expiration(employee.id, cert.id, today(), None).await.unwrap();

        let err = repo.delete_cert_name(cert.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn expiring_certs_query_skips_inactive_and_out_of_window() {
        let repo = make_repo().await;
        let cert = repo.create_cert_name("First Aid").await.unwrap();

        let soon = repo.create_employee(&new_employee("E-1", "Soon")).await.unwrap();
        let later = repo.create_employee(&new_employee("E-2", "Later")).await.unwrap();
        let gone = repo.create_employee(&new_employee("E-3", "Gone")).await.unwrap();
        let lapsed = repo.create_employee(&new_employee("E-4", "Lapsed")).await.unwrap();

        repo.add_cert_expiration(soon.id, cert.id, today() + Duration::days(30), None).await.unwrap();
        repo.add_cert_expiration(later.id, cert.id, today() + Duration::days(31), None).await.unwrap();
        repo.add_cert_expiration(gone.id, cert.id, today() + Duration::days(3), None).await.unwrap();
        repo.add_cert_expiration(lapsed.id, cert.id, today() - Duration::days(1), None).await.unwrap();
        repo.set_employee_status("E-3", EmploymentStatus::Inactive).await.unwrap();

        let found: Vec<String> = repo
            .employees_with_expiring_certs(today(), 30)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.employee_code)
            .collect();
        assert_eq!(found, ["E-1"]);
    }

    #[tokio::test]
    async fn list_employees_attaches_expirations() {
        let repo = make_repo().await;
        let cert = repo.create_cert_name("First Aid").await.unwrap();
        let a = repo.create_employee(&new_employee("E-1", "Ann")).await.unwrap();
        repo.create_employee(&new_employee("E-2", "Bob")).await.unwrap();
        repo.add_cert_expiration(a.id, cert.id, today(), None).await.unwrap();

        let employees = repo.list_employees().await.unwrap();
        assert_eq!(employees.len(), 2);
        let ann = employees.iter().find(|e| e.employee_code == "E-1").unwrap();
        let bob = employees.iter().find(|e| e.employee_code == "E-2").unwrap();
        assert_eq!(ann.cert_expirations.len(), 1);
        assert!(bob.cert_expirations.is_empty());
    }
}
