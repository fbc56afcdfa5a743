//! One processing session: the catalog, the uploaded transactions and the manual entries that a
//! report is generated from.

use crate::catalog::ReferenceCatalog;
use crate::config::Config;
use crate::error::ReconResult;
use crate::manual::{ManualEntryStore, NewEntry};
use crate::model::{HeaderNames, MergedSet, Table, Totals, Transactions};
use crate::reconcile::{filter_by_material_code, merge, totals, MaterialFilter};
use crate::report::{export, ReportWorkbook, SheetNames};
use crate::summary::{customs_projection, electrical_summary, radio_summary, KeyColumn, SummaryKey};
use crate::Result;
use serde::Serialize;
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Owns everything a report is built from. Nothing here outlives the session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    catalog: ReferenceCatalog,
    uploaded: Option<Transactions>,
    manual: ManualEntryStore,
    key: SummaryKey,
    names: HeaderNames,
    sheets: SheetNames,
}

/// The outcome of `Session::report`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// The merged records after filtering.
    pub merged: MergedSet,
    pub totals: Totals,
    /// The code column the summaries were grouped by.
    pub key: KeyColumn,
    pub workbook: ReportWorkbook,
}

impl Session {
    pub fn new(catalog: ReferenceCatalog, names: HeaderNames, sheets: SheetNames) -> Self {
        Self {
            id: Uuid::new_v4(),
            catalog,
            uploaded: None,
            manual: ManualEntryStore::new(),
            key: SummaryKey::default(),
            names,
            sheets,
        }
    }

    /// Builds the catalog from the configured reference files and starts a session with the
    /// configured headers, sheet names and summary key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = config.load_catalog()?;
        let mut session = Self::new(catalog, config.headers().clone(), config.sheets().clone());
        session.set_summary_key(config.summary_key());
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn names(&self) -> &HeaderNames {
        &self.names
    }

    pub fn summary_key(&self) -> SummaryKey {
        self.key
    }

    pub fn set_summary_key(&mut self, key: SummaryKey) {
        self.key = key;
    }

    pub fn uploaded(&self) -> Option<&Transactions> {
        self.uploaded.as_ref()
    }

    /// Parses `table` as the uploaded transaction sheet, replacing any earlier upload. Returns
    /// the number of admitted rows.
    pub fn upload(&mut self, table: &Table) -> ReconResult<usize> {
        let transactions = Transactions::from_table(table, &self.names)?;
        let count = transactions.len();
        debug!("Session {}: uploaded {count} transaction row(s)", self.id);
        self.uploaded = Some(transactions);
        Ok(count)
    }

    pub fn clear_upload(&mut self) {
        self.uploaded = None;
    }

    pub fn manual(&self) -> &ManualEntryStore {
        &self.manual
    }

    pub fn manual_mut(&mut self) -> &mut ManualEntryStore {
        &mut self.manual
    }

    /// Adds a manual entry, enriched against this session's catalog.
    pub fn add_manual(&mut self, entry: NewEntry) -> ReconResult<usize> {
        self.manual.add(entry, &self.catalog)
    }

    /// Adds every row of a manual-entry sheet. Returns the number of entries added.
    pub fn add_manual_table(&mut self, table: &Table) -> ReconResult<usize> {
        self.manual.add_table(table, &self.names, &self.catalog)
    }

    /// Merges the uploaded rows and a snapshot of the manual entries against the catalog.
    pub fn reconcile(&self) -> ReconResult<MergedSet> {
        merge(
            self.uploaded.as_ref(),
            self.manual.entries(),
            &self.catalog,
            &self.names,
        )
    }

    /// Runs the whole pipeline: merge, filter, summarize and export. The manual entries are left
    /// in place, so the report can be generated again after further edits.
    pub fn report(&self, filter: &MaterialFilter) -> ReconResult<Report> {
        let span = info_span!("session", id = %self.id);
        let _guard = span.enter();

        let merged = filter_by_material_code(&self.reconcile()?, filter);
        let totals = totals(merged.records())?;
        let key = KeyColumn::resolve(self.key, merged.columns());
        let radio = radio_summary(&merged, key)?;
        let electrical = electrical_summary(&merged, key)?;
        let customs = customs_projection(&merged);
        let workbook = export(
            &merged,
            &radio,
            &electrical,
            &customs,
            &self.names,
            &self.sheets,
        );

        info!(
            "Report for {filter}: {} row(s), {} unmatched, quantity {}, amount {}",
            merged.len(),
            merged.unmatched().count(),
            totals.quantity,
            totals.amount
        );

        Ok(Report {
            merged,
            totals,
            key,
            workbook,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconError;
    use crate::test::{catalog, csv_table, TestEnv, TRANSACTIONS_CSV};
    use rust_decimal::Decimal;

    fn session() -> Session {
        let mut session = Session::new(catalog(), HeaderNames::default(), SheetNames::default());
        session.upload(&csv_table(TRANSACTIONS_CSV)).unwrap();
        session
    }

    #[test]
    fn test_scenario_report() {
        let report = session().report(&MaterialFilter::All).unwrap();
        assert_eq!(report.merged.len(), 2);
        assert_eq!(report.totals.quantity, 7);
        assert_eq!(report.totals.amount, Decimal::from(90));
        assert_eq!(report.key, KeyColumn::HsCode);
        assert_eq!(report.merged.unmatched_codes(), vec!["B2"]);
        assert_eq!(report.workbook.sheets().len(), 4);
    }

    #[test]
    fn test_filtered_report() {
        let report = session()
            .report(&MaterialFilter::Code("B2".into()))
            .unwrap();
        assert_eq!(report.totals.quantity, 2);
        assert_eq!(report.totals.amount, Decimal::from(40));
        let full = report.workbook.sheet("Full list").unwrap();
        assert_eq!(full.rows().len(), 1);
    }

    #[test]
    fn test_report_keeps_manual_entries() {
        let mut session = session();
        session
            .add_manual(NewEntry::new("C3", 4, Decimal::from(3), "VN"))
            .unwrap();
        let first = session.report(&MaterialFilter::All).unwrap();
        assert_eq!(first.merged.len(), 3);
        assert_eq!(session.manual().len(), 1);

        let again = session.report(&MaterialFilter::All).unwrap();
        assert_eq!(again.merged, first.merged);
        assert_eq!(again.workbook, first.workbook);

        session.manual_mut().clear();
        assert_eq!(session.report(&MaterialFilter::All).unwrap().merged.len(), 2);
    }

    #[test]
    fn test_manual_only_session() {
        let mut session = Session::new(catalog(), HeaderNames::default(), SheetNames::default());
        assert!(session.reconcile().unwrap().is_empty());
        session
            .add_manual_table(&csv_table("자재코드,수량,단가\nA1,1,10\n"))
            .unwrap();
        let report = session.report(&MaterialFilter::All).unwrap();
        assert_eq!(report.totals.amount, Decimal::from(10));
    }

    #[test]
    fn test_overflowing_quantities_fail_report() {
        let mut session = Session::new(catalog(), HeaderNames::default(), SheetNames::default());
        session
            .upload(&csv_table("자재코드,수량\nB2,18446744073709551615\nB2,1\n"))
            .unwrap();
        let err = session.report(&MaterialFilter::All).unwrap_err();
        assert!(matches!(err, ReconError::Overflow { .. }));
        assert_eq!(
            session
                .report(&MaterialFilter::Code("nope".into()))
                .unwrap()
                .totals
                .quantity,
            0
        );
    }

    #[test]
    fn test_upload_without_code_column_fails_report() {
        let mut session = Session::new(catalog(), HeaderNames::default(), SheetNames::default());
        session.upload(&csv_table("수량\n1\n")).unwrap();
        let err = session.report(&MaterialFilter::All).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
        session.clear_upload();
        assert!(session.report(&MaterialFilter::All).is_ok());
    }

    #[test]
    fn test_forced_summary_key() {
        let mut session = session();
        session.set_summary_key(SummaryKey::CustomsCode);
        let report = session.report(&MaterialFilter::All).unwrap();
        assert_eq!(report.key, KeyColumn::CustomsCode);
        // the data has no customs code column, so the summaries lose their code column
        let radio = report.workbook.sheet("Radio cert summary").unwrap();
        assert_eq!(radio.headers()[0], "원산지");
    }

    #[test]
    fn test_from_config() {
        let env = TestEnv::new();
        let session = Session::from_config(&env.config()).unwrap();
        assert_eq!(session.catalog().len(), 3);
        assert_eq!(session.summary_key(), SummaryKey::Auto);
        assert_ne!(session.id(), Session::from_config(&env.config()).unwrap().id());
    }
}
