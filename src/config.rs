//! Configuration file handling.
//!
//! The configuration file is stored at `$CERT_RECON_HOME/config.json`. It names the two reference
//! files that the catalog is built from, the summary key, and optionally overrides the header
//! texts and output sheet names.

use crate::catalog::ReferenceCatalog;
use crate::model::HeaderNames;
use crate::report::SheetNames;
use crate::source::read_table;
use crate::summary::SummaryKey;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "cert-recon";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const REFERENCE: &str = "reference";
const MASTER: &str = "master";
const MODELS: &str = "models";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$CERT_RECON_HOME` and from there it loads `$CERT_RECON_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory and:
    /// - Copies `master` and `models` into `reference/` in the home directory
    /// - Writes an initial `config.json` that points at the copies, with default settings
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub fn create(dir: impl Into<PathBuf>, master: &Path, models: &Path) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative).context("Unable to create the home directory")?;
        let root = utils::canonicalize(&maybe_relative)?;

        let reference_dir = root.join(REFERENCE);
        utils::make_dir(&reference_dir)?;
        let master_path = PathBuf::from(REFERENCE).join(file_name(MASTER, master));
        let model_path = PathBuf::from(REFERENCE).join(file_name(MODELS, models));
        utils::copy(master, root.join(&master_path))?;
        utils::copy(models, root.join(&model_path))?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            master_path,
            model_path,
            ..ConfigFile::default()
        };
        config_file.save(&config_path)?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - return the loaded configuration object
    pub fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative).context("The home directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path)?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The master table file. Relative paths in the config file are resolved against the home
    /// directory.
    pub fn master_path(&self) -> PathBuf {
        self.resolve(&self.config_file.master_path)
    }

    /// The model table file, resolved like `master_path`.
    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.config_file.model_path)
    }

    pub fn summary_key(&self) -> SummaryKey {
        self.config_file.summary_key
    }

    pub fn headers(&self) -> &HeaderNames {
        &self.config_file.headers
    }

    pub fn sheets(&self) -> &SheetNames {
        &self.config_file.sheets
    }

    /// Reads both reference files and builds the catalog.
    pub fn load_catalog(&self) -> Result<ReferenceCatalog> {
        let master_path = self.master_path();
        let model_path = self.model_path();
        debug!(
            "Loading reference data from {} and {}",
            master_path.display(),
            model_path.display()
        );
        let master = read_table(&master_path, None)?;
        let models = read_table(&model_path, None)?;
        let catalog = ReferenceCatalog::build(&master, &models, self.headers())
            .context("Unable to build the reference catalog")?;
        Ok(catalog)
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            return p.to_path_buf();
        }
        self.root.join(p)
    }
}

/// `master.xlsx` for a source named `Parts List.xlsx`: keeps the extension, which decides how
/// the file is read.
fn file_name(stem: &str, source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
        None => stem.to_string(),
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "cert-recon",
///   "config_version": 1,
///   "master_path": "reference/master.xlsx",
///   "model_path": "reference/models.xlsx",
///   "summary_key": "auto"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "cert-recon"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the master table (relative to the home directory or absolute)
    master_path: PathBuf,

    /// Path to the model table (relative to the home directory or absolute)
    model_path: PathBuf,

    /// Which code column the certification summaries group by
    #[serde(default)]
    summary_key: SummaryKey,

    /// Header texts, when the spreadsheets use different ones than the defaults
    #[serde(default)]
    headers: HeaderNames,

    /// Output sheet names
    #[serde(default)]
    sheets: SheetNames,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            master_path: PathBuf::from(REFERENCE).join(MASTER),
            model_path: PathBuf::from(REFERENCE).join(MODELS),
            summary_key: SummaryKey::default(),
            headers: HeaderNames::default(),
            sheets: SheetNames::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data).context("Unable to write config file")
    }
}
