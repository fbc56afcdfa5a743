use crate::args::ReportArgs;
use crate::commands::Out;
use crate::reconcile::MaterialFilter;
use crate::session::Session;
use crate::source::read_table;
use crate::summary::KeyColumn;
use crate::{utils, Config, Result};
use anyhow::Context;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// What `report` did, for structured output.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub path: PathBuf,
    pub filter: MaterialFilter,
    pub key: KeyColumn,
    pub rows: usize,
    pub quantity: u64,
    pub amount: Decimal,
    pub unmatched_codes: Vec<String>,
}

/// Reads the transaction sheet, appends the optional manual-entry sheet, and writes the report
/// workbook.
pub fn report(config: &Config, args: &ReportArgs) -> Result<Out<ReportOutput>> {
    let mut session = Session::from_config(config)?;
    if let Some(key) = args.key() {
        session.set_summary_key(key);
    }

    let table = read_table(args.transactions(), args.sheet())?;
    let admitted = session
        .upload(&table)
        .with_context(|| format!("Unable to read {}", args.transactions().display()))?;
    debug!("Admitted {admitted} uploaded row(s)");

    if let Some(manual) = args.manual() {
        let table = read_table(manual, None)?;
        let added = session
            .add_manual_table(&table)
            .with_context(|| format!("Unable to read {}", manual.display()))?;
        debug!("Added {added} manual entr(ies)");
    }

    let report = session.report(args.material())?;
    let bytes = report.workbook.to_xlsx()?;
    let path = match args.out() {
        Some(p) => p.to_path_buf(),
        None => default_out(),
    };
    utils::write(&path, bytes).context("Unable to save the report")?;

    let unmatched_codes: Vec<String> = report
        .merged
        .unmatched_codes()
        .into_iter()
        .map(String::from)
        .collect();
    if !unmatched_codes.is_empty() {
        warn!(
            "{} material code(s) have no catalog entry: {}",
            unmatched_codes.len(),
            unmatched_codes.join(", ")
        );
    }

    let output = ReportOutput {
        path: path.clone(),
        filter: args.material().clone(),
        key: report.key,
        rows: report.merged.len(),
        quantity: report.totals.quantity,
        amount: report.totals.amount,
        unmatched_codes,
    };
    Ok(Out::new(
        format!(
            "Wrote {}: {} row(s), total quantity {}, total amount {}",
            path.display(),
            output.rows,
            output.quantity,
            output.amount
        ),
        output,
    ))
}

fn default_out() -> PathBuf {
    PathBuf::from(format!(
        "report.{}.xlsx",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}
