use crate::model::{CertFields, Columns, Field, TransactionRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transaction row joined with the catalog entry for its material code.
///
/// `matched` is the single source of truth for whether a catalog entry existed; when it is
/// `false` every certification field is `None`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MergedRecord {
    pub(crate) transaction: TransactionRecord,
    pub(crate) customs_code: Option<String>,
    pub(crate) cert: CertFields,
    pub(crate) matched: bool,
}

impl MergedRecord {
    pub fn transaction(&self) -> &TransactionRecord {
        &self.transaction
    }

    pub fn material_code(&self) -> &str {
        self.transaction.material_code()
    }

    pub fn customs_code(&self) -> Option<&str> {
        self.customs_code.as_deref()
    }

    pub fn cert(&self) -> &CertFields {
        &self.cert
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn quantity(&self) -> u64 {
        self.transaction.quantity()
    }

    pub fn origin(&self) -> &str {
        self.transaction.origin()
    }

    /// Text value of any field, empty when absent.
    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::MaterialCode => self.transaction.material_code(),
            Field::Origin => self.transaction.origin(),
            Field::CustomsCode => self.customs_code().unwrap_or_default(),
            other => self.cert.get(other).unwrap_or_default(),
        }
    }
}

/// The outcome of a merge: the merged rows plus the union of the fields that the transaction
/// and catalog data had columns for.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MergedSet {
    pub(crate) columns: Columns,
    pub(crate) records: Vec<MergedRecord>,
}

impl MergedSet {
    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records that found no catalog entry.
    pub fn unmatched(&self) -> impl Iterator<Item = &MergedRecord> {
        self.records.iter().filter(|r| !r.is_matched())
    }

    /// The distinct material codes of unmatched records, in first-seen order.
    pub fn unmatched_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for record in self.unmatched() {
            if !codes.contains(&record.material_code()) {
                codes.push(record.material_code());
            }
        }
        codes
    }
}

/// Quantity and amount sums over a set of merged records.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    pub quantity: u64,
    pub amount: Decimal,
}
