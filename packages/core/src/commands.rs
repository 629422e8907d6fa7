//! Command dispatch: opens the configured storage, runs one command and
//! writes its output.

use std::io::Write;

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::cli::{AddArgs, Command, EmployeeAction, ListArgs, LookupAction, OutputFormat, UpdateArgs};
use crate::config::{Backend, Config};
use crate::db::create_pool_with;
use crate::error::{AppError, AppResult};
use crate::manager::{CertificateManager, ListFilter};
use crate::model::{parse_date, Certificate, CertificateUpdate, EmploymentStatus, NewEmployee};
use crate::render::{self, CertificateView};
use crate::repository::StaffRepository;
use crate::store::{CertificateStore, JsonCertificateStore, SqliteCertificateStore};

/// Everything a command needs, opened once per invocation.
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub today: NaiveDate,
    pool: Option<SqlitePool>,
}

impl Context {
    pub async fn open(config: Config, format: OutputFormat, today: NaiveDate) -> AppResult<Self> {
        let pool = match config.backend {
            Backend::Sqlite => {
                Some(create_pool_with(&config.database_url, config.max_connections).await?)
            }
            Backend::Json => None,
        };

        Ok(Self { config, format, today, pool })
    }

    fn manager(&self) -> CertificateManager {
        let store: Box<dyn CertificateStore> = match &self.pool {
            Some(pool) => Box::new(SqliteCertificateStore::new(pool.clone())),
            None => Box::new(JsonCertificateStore::new(self.config.storage_path.clone())),
        };
        CertificateManager::new(store, self.today)
    }

    fn staff(&self) -> AppResult<StaffRepository> {
        self.pool
            .as_ref()
            .map(|pool| StaffRepository::new(pool.clone()))
            .ok_or_else(|| {
                AppError::config("Staff commands require the sqlite backend (--backend sqlite)")
            })
    }

    /// Close the database pool, if one was opened.
    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}

pub async fn run(command: &Command, ctx: &Context, out: &mut dyn Write) -> AppResult<()> {
    tracing::debug!("Running {:?} against {:?} backend", command, ctx.config.backend);

    match command {
        Command::Add(args) => add(ctx, args, out).await,
        Command::List(args) => list(ctx, args, out).await,
        Command::Show { name } => show(ctx, name, out).await,
        Command::Update(args) => update(ctx, args, out).await,
        Command::Remove { name } => {
            ctx.manager().remove(name).await?;
            writeln!(out, "Certificate '{}' removed successfully.", name)?;
            Ok(())
        }
        Command::Stats => stats(ctx, out).await,
        Command::Company { action } => lookup(ctx, Lookup::Company, action, out).await,
        Command::Position { action } => lookup(ctx, Lookup::Position, action, out).await,
        Command::CertName { action } => lookup(ctx, Lookup::CertName, action, out).await,
        Command::Employee { action } => employee(ctx, action, out).await,
    }
}

// ---- Certificates ----

async fn add(ctx: &Context, args: &AddArgs, out: &mut dyn Write) -> AppResult<()> {
    let expiration_date = parse_date(&args.expiration_date)?;
    let certificate = Certificate::new(&args.name, &args.domain, expiration_date)
        .with_issuer(args.issuer.clone().unwrap_or_default())
        .with_notes(args.notes.clone().unwrap_or_default());

    let added = ctx.manager().add(certificate).await?;
    match ctx.format {
        OutputFormat::Table => writeln!(out, "Certificate '{}' added successfully.", added.name)?,
        OutputFormat::Json => {
            writeln!(out, "{}", render::to_json(&CertificateView::new(&added, ctx.today))?)?
        }
    }
    Ok(())
}

/// `--days` alone implies `--expiring-soon`.
fn list_filter(args: &ListArgs, default_window: i64) -> ListFilter {
    if args.expired {
        ListFilter::Expired
    } else if args.expiring_soon || args.days.is_some() {
        ListFilter::ExpiringSoon(args.days.unwrap_or(default_window))
    } else {
        ListFilter::All
    }
}

async fn list(ctx: &Context, args: &ListArgs, out: &mut dyn Write) -> AppResult<()> {
    let filter = list_filter(args, ctx.config.expiring_days);
    let certificates = ctx.manager().list(filter).await?;

    match ctx.format {
        OutputFormat::Table => {
            let title = match filter {
                ListFilter::All => "All Certificates:".to_string(),
                ListFilter::Expired => "Expired Certificates:".to_string(),
                ListFilter::ExpiringSoon(days) => format!("Certificates Expiring in {} Days:", days),
            };
            write!(out, "{}", render::heading(&title))?;
            write!(out, "{}", render::certificate_table(&certificates, ctx.today))?;
        }
        OutputFormat::Json => {
            let views: Vec<CertificateView> = certificates
                .iter()
                .map(|c| CertificateView::new(c, ctx.today))
                .collect();
            writeln!(out, "{}", render::to_json(&views)?)?;
        }
    }
    Ok(())
}

async fn show(ctx: &Context, name: &str, out: &mut dyn Write) -> AppResult<()> {
    let certificate = ctx.manager().get(name).await?;
    match ctx.format {
        OutputFormat::Table => write!(out, "{}", render::certificate_detail(&certificate, ctx.today))?,
        OutputFormat::Json => writeln!(
            out,
            "{}",
            render::to_json(&CertificateView::new(&certificate, ctx.today))?
        )?,
    }
    Ok(())
}

async fn update(ctx: &Context, args: &UpdateArgs, out: &mut dyn Write) -> AppResult<()> {
    let changes = CertificateUpdate {
        domain: args.domain.clone(),
        expiration_date: args.expiration_date.as_deref().map(parse_date).transpose()?,
        issuer: args.issuer.clone(),
        notes: args.notes.clone(),
    };

    let updated = ctx.manager().update(&args.name, changes).await?;
    match ctx.format {
        OutputFormat::Table => writeln!(out, "Certificate '{}' updated successfully.", updated.name)?,
        OutputFormat::Json => {
            writeln!(out, "{}", render::to_json(&CertificateView::new(&updated, ctx.today))?)?
        }
    }
    Ok(())
}

async fn stats(ctx: &Context, out: &mut dyn Write) -> AppResult<()> {
    let stats = ctx.manager().stats().await?;
    match ctx.format {
        OutputFormat::Table => write!(out, "{}", render::statistics(&stats))?,
        OutputFormat::Json => writeln!(out, "{}", render::to_json(&stats)?)?,
    }
    Ok(())
}

// ---- Lookup tables ----

#[derive(Debug, Clone, Copy)]
enum Lookup {
    Company,
    Position,
    CertName,
}

impl Lookup {
    fn label(self) -> &'static str {
        match self {
            Lookup::Company => "Company",
            Lookup::Position => "Position",
            Lookup::CertName => "Certificate name",
        }
    }
}

async fn lookup(ctx: &Context, kind: Lookup, action: &LookupAction, out: &mut dyn Write) -> AppResult<()> {
    let repo = ctx.staff()?;

    match action {
        LookupAction::Add { name } => {
            let id = match kind {
                Lookup::Company => repo.create_company(name).await?.id,
                Lookup::Position => repo.create_position(name).await?.id,
                Lookup::CertName => repo.create_cert_name(name).await?.id,
            };
            writeln!(out, "{} '{}' created with id {}.", kind.label(), name.trim(), id)?;
        }
        LookupAction::List => {
            let rows: Vec<(i64, String)> = match kind {
                Lookup::Company => repo.list_companies().await?.into_iter().map(|c| (c.id, c.name)).collect(),
                Lookup::Position => repo.list_positions().await?.into_iter().map(|p| (p.id, p.name)).collect(),
                Lookup::CertName => repo.list_cert_names().await?.into_iter().map(|n| (n.id, n.name)).collect(),
            };
            match ctx.format {
                OutputFormat::Table => {
                    let borrowed: Vec<(i64, &str)> = rows.iter().map(|(id, n)| (*id, n.as_str())).collect();
                    write!(out, "{}", render::lookup_table(&borrowed))?;
                }
                OutputFormat::Json => {
                    let items: Vec<serde_json::Value> = rows
                        .iter()
                        .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
                        .collect();
                    writeln!(out, "{}", render::to_json(&items)?)?;
                }
            }
        }
        LookupAction::Rename { id, name } => {
            match kind {
                Lookup::Company => repo.rename_company(*id, name).await?,
                Lookup::Position => repo.rename_position(*id, name).await?,
                Lookup::CertName => repo.rename_cert_name(*id, name).await?,
            }
            writeln!(out, "{} {} renamed to '{}'.", kind.label(), id, name.trim())?;
        }
        LookupAction::Remove { id } => {
            match kind {
                Lookup::Company => repo.delete_company(*id).await?,
                Lookup::Position => repo.delete_position(*id).await?,
                Lookup::CertName => repo.delete_cert_name(*id).await?,
            }
            writeln!(out, "{} {} removed.", kind.label(), id)?;
        }
    }
    Ok(())
}

// ---- Employees ----

async fn employee(ctx: &Context, action: &EmployeeAction, out: &mut dyn Write) -> AppResult<()> {
    let repo = ctx.staff()?;

    match action {
        EmployeeAction::Add { code, name, surname, phone, company, position, mdp } => {
            let company_id = match company {
                Some(company_name) => Some(
                    repo.get_company_by_name(company_name)
                        .await?
                        .ok_or_else(|| AppError::not_found("Company", company_name))?
                        .id,
                ),
                None => None,
            };
            let position_id = match position {
                Some(position_name) => Some(
                    repo.get_position_by_name(position_name)
                        .await?
                        .ok_or_else(|| AppError::not_found("Position", position_name))?
                        .id,
                ),
                None => None,
            };

            let employee = repo
                .create_employee(&NewEmployee {
                    employee_code: code.clone(),
                    name: name.clone(),
                    surname: surname.clone(),
                    phone: phone.clone(),
                    company_id,
                    position_id,
                    included_in_mdp: *mdp,
                })
                .await?;
            writeln!(out, "Employee '{}' ({}) added.", employee.employee_code, employee.full_name())?;
        }
        EmployeeAction::List => {
            let employees = repo.list_employees().await?;
            match ctx.format {
                OutputFormat::Table => write!(out, "{}", render::employee_table(&employees, ctx.today))?,
                OutputFormat::Json => writeln!(out, "{}", render::to_json(&employees)?)?,
            }
        }
        EmployeeAction::Show { code } => {
            let employee = repo
                .get_employee_by_code(code)
                .await?
                .ok_or_else(|| AppError::not_found("Employee", code))?;
            match ctx.format {
                OutputFormat::Table => write!(out, "{}", render::employee_detail(&employee, ctx.today))?,
                OutputFormat::Json => writeln!(out, "{}", render::to_json(&employee)?)?,
            }
        }
        EmployeeAction::Activate { code } => {
            repo.set_employee_status(code, EmploymentStatus::Active).await?;
            writeln!(out, "Employee '{}' activated.", code)?;
        }
        EmployeeAction::Deactivate { code } => {
            repo.set_employee_status(code, EmploymentStatus::Inactive).await?;
            writeln!(out, "Employee '{}' deactivated.", code)?;
        }
        EmployeeAction::AddCert { code, cert_name, expiration_date, date_made } => {
            let expiration_date = parse_date(expiration_date)?;
            let date_made = date_made.as_deref().map(parse_date).transpose()?;

            let employee = repo
                .get_employee_by_code(code)
                .await?
                .ok_or_else(|| AppError::not_found("Employee", code))?;
            let cert = repo
                .get_cert_name_by_name(cert_name)
                .await?
                .ok_or_else(|| AppError::not_found("Certificate name", cert_name))?;

            let recorded = repo
                .add_cert_expiration(employee.id, cert.id, expiration_date, date_made)
                .await?;
            writeln!(
                out,
                "Recorded '{}' for employee '{}' (id {}), expires {}.",
                recorded.cert_name.name, code, recorded.id, expiration_date
            )?;
        }
        EmployeeAction::RemoveCert { id } => {
            repo.remove_cert_expiration(*id).await?;
            writeln!(out, "Cert expiration {} removed.", id)?;
        }
        EmployeeAction::Expiring { days } => {
            let window = days.unwrap_or(ctx.config.expiring_days);
            if window < 0 {
                return Err(AppError::validation("--days must not be negative"));
            }
            let employees = repo.employees_with_expiring_certs(ctx.today, window).await?;
            match ctx.format {
                OutputFormat::Table => {
                    write!(
                        out,
                        "{}",
                        render::heading(&format!("Employees With Certificates Expiring in {} Days:", window))
                    )?;
                    write!(out, "{}", render::employee_table(&employees, ctx.today))?;
                }
                OutputFormat::Json => writeln!(out, "{}", render::to_json(&employees)?)?,
            }
        }
    }
    Ok(())
}
