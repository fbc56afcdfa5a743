//! Joins transaction rows to the reference catalog and works with the merged result.

use crate::catalog::ReferenceCatalog;
use crate::error::{ReconError, ReconResult};
use crate::manual::ManualEntry;
use crate::model::{
    Columns, Field, HeaderNames, MergedRecord, MergedSet, Totals, TransactionRecord, Transactions,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// The text shown for the "no filter" choice of the material code selector.
pub const ALL_STR: &str = "(all)";

/// Left-joins the uploaded rows followed by the manual entries onto `catalog`.
///
/// Every transaction row yields exactly one `MergedRecord`, in input order: uploaded rows first,
/// then manual entries. Records whose material code is not in the catalog are kept with
/// `matched == false` and blank certification fields.
///
/// # Errors
/// - `ReconError::MissingColumn` if `uploaded` has no material code column. The whole merge is
///   refused rather than dropping rows.
pub fn merge(
    uploaded: Option<&Transactions>,
    manual: &[ManualEntry],
    catalog: &ReferenceCatalog,
    names: &HeaderNames,
) -> ReconResult<MergedSet> {
    let mut columns = Columns::new();
    if let Some(uploaded) = uploaded {
        if !uploaded.has_material_code() {
            return Err(ReconError::MissingColumn {
                column: names.header(Field::MaterialCode).to_string(),
            });
        }
        columns.extend(uploaded.columns());
    }
    if !manual.is_empty() {
        let manual_columns: Columns = Field::TRANSACTION.into_iter().collect();
        columns.extend(&manual_columns);
    }
    columns.extend(catalog.columns());

    let rows = uploaded
        .map(|u| u.data())
        .unwrap_or_default()
        .iter()
        .chain(manual.iter().map(|m| m.transaction()));

    let records: Vec<MergedRecord> = rows.map(|txn| join(txn, catalog)).collect();

    let matched = records.iter().filter(|r| r.is_matched()).count();
    debug!(
        "Merged {} transaction row(s): {} matched, {} unmatched",
        records.len(),
        matched,
        records.len() - matched
    );

    Ok(MergedSet { columns, records })
}

fn join(txn: &TransactionRecord, catalog: &ReferenceCatalog) -> MergedRecord {
    match catalog.lookup(txn.material_code()) {
        Some(reference) => MergedRecord {
            transaction: txn.clone(),
            customs_code: reference.customs_code().map(String::from),
            cert: reference.cert().clone(),
            matched: true,
        },
        None => MergedRecord {
            transaction: txn.clone(),
            customs_code: None,
            cert: Default::default(),
            matched: false,
        },
    }
}

/// A choice from the material code selector.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MaterialFilter {
    #[default]
    All,
    Code(String),
}

impl Display for MaterialFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialFilter::All => f.write_str(ALL_STR),
            MaterialFilter::Code(code) => f.write_str(code),
        }
    }
}

impl FromStr for MaterialFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            ALL_STR => MaterialFilter::All,
            code => MaterialFilter::Code(code.to_string()),
        })
    }
}

impl Serialize for MaterialFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MaterialFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}

/// Keeps the records whose material code equals the filter exactly. `MaterialFilter::All`
/// returns the input unchanged.
pub fn filter_by_material_code(merged: &MergedSet, filter: &MaterialFilter) -> MergedSet {
    match filter {
        MaterialFilter::All => merged.clone(),
        MaterialFilter::Code(code) => MergedSet {
            columns: merged.columns.clone(),
            records: merged
                .records
                .iter()
                .filter(|r| r.material_code() == code.as_str())
                .cloned()
                .collect(),
        },
    }
}

/// Sums quantity and total amount over `records`.
///
/// # Errors
/// - `ReconError::Overflow` if either sum leaves the range of its type.
pub fn totals(records: &[MergedRecord]) -> ReconResult<Totals> {
    records.iter().try_fold(Totals::default(), |acc, r| {
        Ok(Totals {
            quantity: acc
                .quantity
                .checked_add(r.quantity())
                .ok_or_else(|| ReconError::overflow("total quantity"))?,
            amount: acc
                .amount
                .checked_add(r.transaction().total_amount())
                .ok_or_else(|| ReconError::overflow("total amount"))?,
        })
    })
}

/// The options of the material code selector: `(all)` followed by the distinct material codes
/// of `merged`, sorted.
pub fn material_codes(merged: &MergedSet) -> Vec<MaterialFilter> {
    let distinct: BTreeSet<&str> = merged.records.iter().map(|r| r.material_code()).collect();
    std::iter::once(MaterialFilter::All)
        .chain(distinct.into_iter().map(|c| MaterialFilter::Code(c.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::{ManualEntryStore, NewEntry};
    use crate::model::Table;
    use crate::test::{catalog, scenario_transactions};
    use rust_decimal::Decimal;

    #[test]
    fn test_scenario_merge() {
        let catalog = catalog();
        let txns = scenario_transactions();
        let merged = merge(Some(&txns), &[], &catalog, &HeaderNames::default()).unwrap();
        assert_eq!(merged.len(), 2);

        let first = &merged.records()[0];
        assert!(first.is_matched());
        assert_eq!(first.cert().hs_code.as_deref(), Some("8517"));
        assert_eq!(first.cert().radio_cert.as_deref(), Some("R-001"));

        let second = &merged.records()[1];
        assert!(!second.is_matched());
        assert!(second.cert().is_blank());
        assert_eq!(second.customs_code(), None);
        assert_eq!(merged.unmatched_codes(), vec!["B2"]);
    }

    #[test]
    fn test_cardinality_and_matched_flag() {
        let catalog = catalog();
        let names = HeaderNames::default();
        let table = Table::parse(vec![
            vec!["자재코드", "수량"],
            vec!["A1", "1"],
            vec!["A1", "2"],
            vec!["C3", "3"],
            vec!["X", "4"],
            vec!["D4", "5"],
        ])
        .unwrap();
        let txns = Transactions::from_table(&table, &names).unwrap();
        let merged = merge(Some(&txns), &[], &catalog, &names).unwrap();
        assert_eq!(merged.len(), txns.len());
        for r in merged.records() {
            assert_eq!(r.is_matched(), catalog.lookup(r.material_code()).is_some());
        }
    }

    #[test]
    fn test_manual_rows_follow_uploaded_rows() {
        let catalog = catalog();
        let mut store = ManualEntryStore::new();
        store
            .add(NewEntry::new("C3", 1, Decimal::from(5), "VN"), &catalog)
            .unwrap();
        store
            .add(NewEntry::new("Q7", 1, Decimal::from(5), "VN"), &catalog)
            .unwrap();
        let txns = scenario_transactions();
        let merged = merge(
            Some(&txns),
            &store.snapshot(),
            &catalog,
            &HeaderNames::default(),
        )
        .unwrap();
        let codes: Vec<&str> = merged.records().iter().map(|r| r.material_code()).collect();
        assert_eq!(codes, vec!["A1", "B2", "C3", "Q7"]);
        assert!(merged.records()[2].is_matched());
        assert!(!merged.records()[3].is_matched());
    }

    #[test]
    fn test_manual_only() {
        let catalog = catalog();
        let mut store = ManualEntryStore::new();
        store
            .add(NewEntry::new("A1", 2, Decimal::from(5), "KR"), &catalog)
            .unwrap();
        let merged = merge(None, store.entries(), &catalog, &HeaderNames::default()).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(merged.columns().contains(Field::Quantity));
    }

    #[test]
    fn test_missing_material_code_column_aborts() {
        let names = HeaderNames::default();
        let table = Table::parse(vec![vec!["수량"], vec!["1"]]).unwrap();
        let txns = Transactions::from_table(&table, &names).unwrap();
        let err = merge(Some(&txns), &[], &catalog(), &names).unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingColumn {
                column: String::from("자재코드")
            }
        );
    }

    #[test]
    fn test_filter_and_totals() {
        let catalog = catalog();
        let txns = scenario_transactions();
        let merged = merge(Some(&txns), &[], &catalog, &HeaderNames::default()).unwrap();

        let all = totals(merged.records()).unwrap();
        assert_eq!(all.quantity, 7);
        assert_eq!(all.amount, Decimal::from(90));

        let only_b2 = filter_by_material_code(&merged, &MaterialFilter::Code("B2".into()));
        assert_eq!(only_b2.len(), 1);
        let b2 = totals(only_b2.records()).unwrap();
        assert_eq!(b2.quantity, 2);
        assert_eq!(b2.amount, Decimal::from(40));

        // filtering leaves the earlier totals and the source set alone
        assert_eq!(all.quantity, 7);
        assert_eq!(merged.len(), 2);

        let unfiltered = filter_by_material_code(&merged, &MaterialFilter::All);
        assert_eq!(unfiltered, merged);
    }

    #[test]
    fn test_filter_unknown_code_is_empty() {
        let merged = merge(
            Some(&scenario_transactions()),
            &[],
            &catalog(),
            &HeaderNames::default(),
        )
        .unwrap();
        let none = filter_by_material_code(&merged, &MaterialFilter::Code("nope".into()));
        assert!(none.is_empty());
        assert_eq!(totals(none.records()).unwrap(), Totals::default());
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let names = HeaderNames::default();
        let table = Table::parse(vec![
            vec!["자재코드", "수량"],
            vec!["A1", "18446744073709551615"],
            vec!["A1", "1"],
        ])
        .unwrap();
        let txns = Transactions::from_table(&table, &names).unwrap();
        let merged = merge(Some(&txns), &[], &catalog(), &names).unwrap();
        let err = totals(merged.records()).unwrap_err();
        assert_eq!(err, ReconError::overflow("total quantity"));
    }

    #[test]
    fn test_material_codes_selector() {
        let names = HeaderNames::default();
        let table = Table::parse(vec![
            vec!["자재코드"],
            vec!["C3"],
            vec!["A1"],
            vec!["C3"],
        ])
        .unwrap();
        let txns = Transactions::from_table(&table, &names).unwrap();
        let merged = merge(Some(&txns), &[], &catalog(), &names).unwrap();
        let options: Vec<String> = material_codes(&merged)
            .iter()
            .map(|o| o.to_string())
            .collect();
        assert_eq!(options, vec!["(all)", "A1", "C3"]);
    }

    #[test]
    fn test_material_filter_parse() {
        assert_eq!("(all)".parse::<MaterialFilter>().unwrap(), MaterialFilter::All);
        assert_eq!(
            "A1".parse::<MaterialFilter>().unwrap(),
            MaterialFilter::Code("A1".into())
        );
    }
}
