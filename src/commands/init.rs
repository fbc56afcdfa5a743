use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory and its `config.json`, copying the two reference tables into it.
///
/// The catalog is built once as a check, so that a master or model table with a missing join
/// column is reported now rather than on the first report.
///
/// # Arguments
/// - `home` - The directory that will be the home directory, e.g. `$HOME/cert-recon`
/// - `master` - The master table, keyed by material code
/// - `models` - The model table, keyed by model name
///
/// # Errors
/// - Returns an error if any file operations fail or the tables cannot be joined.
pub fn init(home: &Path, master: &Path, models: &Path) -> Result<Out<()>> {
    let config = Config::create(home, master, models)
        .context("Unable to create the home directory and config")?;
    let catalog = config
        .load_catalog()
        .context("The reference tables were copied but cannot be joined")?;
    Ok(format!(
        "Created {} with {} catalog record(s)",
        config.root().display(),
        catalog.len()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{MASTER_CSV, MODEL_CSV};
    use tempfile::TempDir;

    #[test]
    fn test_init() {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("master.csv");
        let models = dir.path().join("models.csv");
        std::fs::write(&master, MASTER_CSV).unwrap();
        std::fs::write(&models, MODEL_CSV).unwrap();
        let home = dir.path().join("home");

        let out = init(&home, &master, &models).unwrap();
        assert!(out.message().contains("3 catalog record(s)"));
        assert!(home.join("config.json").is_file());
        assert!(Config::load(&home).is_ok());
    }

    #[test]
    fn test_init_rejects_unjoinable_master() {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("master.csv");
        let models = dir.path().join("models.csv");
        std::fs::write(&master, "자재코드\nA1\n").unwrap();
        std::fs::write(&models, MODEL_CSV).unwrap();
        let err = init(&dir.path().join("home"), &master, &models).unwrap_err();
        let recon = err.downcast_ref::<crate::ReconError>();
        assert!(matches!(recon, Some(crate::ReconError::Schema { .. })));
    }
}
