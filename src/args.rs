//! These structs provide the CLI interface for the certrecon CLI.

use crate::reconcile::MaterialFilter;
use crate::summary::SummaryKey;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// certrecon: reconcile part transactions against certification master data.
///
/// Transaction rows, uploaded from a spreadsheet or entered by hand, are joined by material code
/// to a reference catalog built from a master table and a model table. The result is written as
/// a workbook with the full merged list, radio and electrical certification summaries, and a
/// customs declaration sheet.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// This is the first command you should run. The master and model tables are copied into the
    /// home directory, so later commands keep working if the originals move.
    Init(InitArgs),
    /// Merge a transaction sheet (and optionally a manual-entry sheet) against the catalog and
    /// write the report workbook.
    Report(ReportArgs),
    /// Print the catalog entry for a material code.
    Lookup(LookupArgs),
    /// Print the material code filter options for a transaction sheet.
    Codes(CodesArgs),
    /// Fill in the certification columns of a manual-entry sheet from the catalog.
    Manual(ManualArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and reference data are held. Defaults to ~/cert-recon
    #[arg(long, env = "CERT_RECON_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `certrecon init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The master table: material code, HS code, model spec and model name per part.
    #[arg(long)]
    master: PathBuf,

    /// The model table: certification numbers, authority and rated voltage per model name.
    #[arg(long)]
    models: PathBuf,
}

impl InitArgs {
    pub fn new(master: impl Into<PathBuf>, models: impl Into<PathBuf>) -> Self {
        Self {
            master: master.into(),
            models: models.into(),
        }
    }

    pub fn master(&self) -> &Path {
        &self.master
    }

    pub fn models(&self) -> &Path {
        &self.models
    }
}

/// (Not shown): Args for the `certrecon report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The uploaded transaction sheet (xlsx, xls, ods or csv).
    #[arg(long)]
    transactions: PathBuf,

    /// The worksheet to read from the transaction file. Defaults to the first one.
    #[arg(long)]
    sheet: Option<String>,

    /// A manual-entry sheet whose rows are appended after the uploaded ones.
    #[arg(long)]
    manual: Option<PathBuf>,

    /// Restrict the report to one material code. "(all)" means no restriction.
    #[arg(long, default_value_t = MaterialFilter::All)]
    material: MaterialFilter,

    /// The code column the summaries group by: auto, customs_code or hs_code. Defaults to the
    /// configured value.
    #[arg(long)]
    key: Option<SummaryKey>,

    /// Where to write the workbook. Defaults to report.YYYY-MM-DD.xlsx in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ReportArgs {
    pub fn new(transactions: impl Into<PathBuf>) -> Self {
        Self {
            transactions: transactions.into(),
            sheet: None,
            manual: None,
            material: MaterialFilter::All,
            key: None,
            out: None,
        }
    }

    pub fn with_manual(mut self, manual: impl Into<PathBuf>) -> Self {
        self.manual = Some(manual.into());
        self
    }

    pub fn with_material(mut self, material: MaterialFilter) -> Self {
        self.material = material;
        self
    }

    pub fn with_key(mut self, key: SummaryKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = Some(out.into());
        self
    }

    pub fn transactions(&self) -> &Path {
        &self.transactions
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn manual(&self) -> Option<&Path> {
        self.manual.as_deref()
    }

    pub fn material(&self) -> &MaterialFilter {
        &self.material
    }

    pub fn key(&self) -> Option<SummaryKey> {
        self.key
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

/// (Not shown): Args for the `certrecon lookup` command.
#[derive(Debug, Parser, Clone)]
pub struct LookupArgs {
    /// The material code to look up. Matching is exact.
    code: String,
}

impl LookupArgs {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// (Not shown): Args for the `certrecon codes` command.
#[derive(Debug, Parser, Clone)]
pub struct CodesArgs {
    /// The uploaded transaction sheet.
    #[arg(long)]
    transactions: PathBuf,

    /// The worksheet to read from the transaction file. Defaults to the first one.
    #[arg(long)]
    sheet: Option<String>,

    /// A manual-entry sheet whose codes are included.
    #[arg(long)]
    manual: Option<PathBuf>,
}

impl CodesArgs {
    pub fn new(transactions: impl Into<PathBuf>, manual: Option<PathBuf>) -> Self {
        Self {
            transactions: transactions.into(),
            sheet: None,
            manual,
        }
    }

    pub fn transactions(&self) -> &Path {
        &self.transactions
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn manual(&self) -> Option<&Path> {
        self.manual.as_deref()
    }
}

/// (Not shown): Args for the `certrecon manual` command.
#[derive(Debug, Parser, Clone)]
pub struct ManualArgs {
    /// A sheet with material code, quantity, unit price, total amount and origin columns.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the enriched manual-entry workbook.
    #[arg(long)]
    out: PathBuf,
}

impl ManualArgs {
    pub fn new(input: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            out: out.into(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn out(&self) -> &Path {
        &self.out
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cert-recon"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or CERT_RECON_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("cert-recon")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
