use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Backend;

/// Certificate tracker CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "cert-tracker",
    version,
    about = "Track certificate expiration dates"
)]
pub struct Cli {
    /// Storage file: the JSON file, or the database file with --backend sqlite
    /// (default: certificates.json)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<Backend>,

    /// SQLite database URL (implies --backend sqlite)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new certificate
    Add(AddArgs),

    /// List certificates
    List(ListArgs),

    /// Show certificate details
    Show {
        /// Certificate name to show
        name: String,
    },

    /// Update a certificate
    Update(UpdateArgs),

    /// Remove a certificate
    Remove {
        /// Certificate name to remove
        name: String,
    },

    /// Show certificate statistics
    Stats,

    /// Manage companies (sqlite backend)
    Company {
        #[command(subcommand)]
        action: LookupAction,
    },

    /// Manage positions (sqlite backend)
    Position {
        #[command(subcommand)]
        action: LookupAction,
    },

    /// Manage certificate names held by employees (sqlite backend)
    CertName {
        #[command(subcommand)]
        action: LookupAction,
    },

    /// Manage employees and their certificates (sqlite backend)
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Certificate name/identifier
    pub name: String,

    /// Domain name
    pub domain: String,

    /// Expiration date (YYYY-MM-DD)
    pub expiration_date: String,

    /// Certificate issuer
    #[arg(long)]
    pub issuer: Option<String>,

    /// Additional notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Show only expired certificates
    #[arg(long, conflicts_with_all = ["expiring_soon", "days"])]
    pub expired: bool,

    /// Show certificates expiring soon
    #[arg(long)]
    pub expiring_soon: bool,

    /// Window for --expiring-soon, in days (implies --expiring-soon)
    #[arg(long)]
    pub days: Option<i64>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Certificate name to update
    pub name: String,

    /// New domain name
    #[arg(long)]
    pub domain: Option<String>,

    /// New expiration date (YYYY-MM-DD)
    #[arg(long)]
    pub expiration_date: Option<String>,

    /// New issuer
    #[arg(long)]
    pub issuer: Option<String>,

    /// New notes (an empty string clears them)
    #[arg(long)]
    pub notes: Option<String>,
}

/// Actions shared by the name-only lookup tables.
#[derive(Debug, Subcommand)]
pub enum LookupAction {
    /// Create an entry
    Add { name: String },
    /// List all entries
    List,
    /// Rename an entry
    Rename { id: i64, name: String },
    /// Delete an entry
    Remove { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum EmployeeAction {
    /// Register an employee
    Add {
        /// Employee code (badge / payroll number)
        code: String,
        name: String,
        surname: String,
        #[arg(long)]
        phone: Option<String>,
        /// Company name (must exist)
        #[arg(long)]
        company: Option<String>,
        /// Position name (must exist)
        #[arg(long)]
        position: Option<String>,
        /// Include in the MDP program
        #[arg(long)]
        mdp: bool,
    },
    /// List employees
    List,
    /// Show an employee and their certificates
    Show { code: String },
    /// Mark an employee active
    Activate { code: String },
    /// Mark an employee inactive
    Deactivate { code: String },
    /// Record a certificate held by an employee
    AddCert {
        code: String,
        /// Certificate name (must exist)
        cert_name: String,
        /// Expiration date (YYYY-MM-DD)
        expiration_date: String,
        /// Issuance date (YYYY-MM-DD)
        #[arg(long)]
        date_made: Option<String>,
    },
    /// Delete a recorded certificate by id
    RemoveCert { id: i64 },
    /// Active employees with certificates expiring soon
    Expiring {
        /// Window in days (default: 30)
        #[arg(long)]
        days: Option<i64>,
    },
}
