//! Shared test fixtures.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::catalog::ReferenceCatalog;
use crate::config::Config;
use crate::model::{HeaderNames, Table, Transactions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub(crate) const MASTER_CSV: &str = "\
자재코드,HS코드,모델규격,모델명
A1,8517,SPEC-1,M1
C3,8504,SPEC-3,M3
D4,8504,SPEC-4,ORPHAN
";

pub(crate) const MODEL_CSV: &str = "\
모델명,전파인증번호,전기인증기관,전기인증번호,정격전압
M1,R-001,,,
M3,,KC,E-100,220V
";

pub(crate) const TRANSACTIONS_CSV: &str = "\
자재코드,수량,단가,총금액,원산지
A1,5,10,50,KR
B2,2,20,40,CN
";

/// Parses CSV text into a `Table`.
pub(crate) fn csv_table(text: &str) -> Table {
    crate::source::parse_csv(text.as_bytes()).unwrap()
}

/// Master rows A1, C3 and D4. D4's model is not in the model table.
pub(crate) fn master_table() -> Table {
    csv_table(MASTER_CSV)
}

/// Model M1 has a radio certification only; M3 has an electrical certification only.
pub(crate) fn model_table() -> Table {
    csv_table(MODEL_CSV)
}

pub(crate) fn catalog() -> ReferenceCatalog {
    ReferenceCatalog::build(&master_table(), &model_table(), &HeaderNames::default()).unwrap()
}

/// A1 x5 at 10 from KR, which is in the catalog, and B2 x2 at 20 from CN, which is not.
pub(crate) fn scenario_transactions() -> Transactions {
    Transactions::from_table(&csv_table(TRANSACTIONS_CSV), &HeaderNames::default()).unwrap()
}

/// A home directory with the reference files written and `Config` created.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let master = temp_dir.path().join("master.csv");
        let models = temp_dir.path().join("models.csv");
        std::fs::write(&master, MASTER_CSV).unwrap();
        std::fs::write(&models, MODEL_CSV).unwrap();
        let config = Config::create(temp_dir.path().join("cert-recon"), &master, &models).unwrap();
        Self { temp_dir, config }
    }

    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    /// Writes `contents` to a file named `name` in the temp dir and returns its path.
    pub(crate) fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub(crate) fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
