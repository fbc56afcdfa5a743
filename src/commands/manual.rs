use crate::args::ManualArgs;
use crate::commands::Out;
use crate::report::ReportWorkbook;
use crate::session::Session;
use crate::source::read_table;
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

const MANUAL_SHEET: &str = "Manual entries";

#[derive(Debug, Clone, Serialize)]
pub struct ManualOutput {
    pub path: PathBuf,
    pub entries: usize,
    pub unmatched: usize,
}

/// Reads a manual-entry sheet, copies the catalog's certification fields onto each row and
/// writes the result as the manual-input workbook. The output can be fed back in with
/// `report --manual`.
pub fn manual(config: &Config, args: &ManualArgs) -> Result<Out<ManualOutput>> {
    let mut session = Session::from_config(config)?;
    let table = read_table(args.input(), None)?;
    let entries = session
        .add_manual_table(&table)
        .with_context(|| format!("Unable to read {}", args.input().display()))?;

    let store = session.manual();
    let unmatched = store
        .entries()
        .iter()
        .filter(|e| session.catalog().lookup(e.transaction().material_code()).is_none())
        .count();

    let workbook = ReportWorkbook::from_rows(MANUAL_SHEET, store.to_rows(session.names()));
    utils::write(args.out(), workbook.to_xlsx()?).context("Unable to save the manual entries")?;

    let output = ManualOutput {
        path: args.out().to_path_buf(),
        entries,
        unmatched,
    };
    Ok(Out::new(
        format!(
            "Wrote {} manual entr(ies) to {}, {} without a catalog entry",
            entries,
            args.out().display(),
            unmatched
        ),
        output,
    ))
}
