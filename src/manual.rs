//! Manually entered transaction rows, kept for the length of one session.

use crate::catalog::ReferenceCatalog;
use crate::error::{ReconError, ReconResult};
use crate::model::items::{optional, parse_items, parse_quantity};
use crate::model::{
    parse_amount, Amount, CertFields, Columns, Field, HeaderNames, Item, Table, TransactionRecord,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// The values a user submits to add a manual entry.
///
/// `total_amount` is an override: when it is `None` the stored total defaults to
/// `quantity * unit_price`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewEntry {
    pub material_code: String,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub total_amount: Option<Decimal>,
    pub origin: String,
}

impl NewEntry {
    pub fn new(
        material_code: impl Into<String>,
        quantity: u64,
        unit_price: Decimal,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            material_code: material_code.into(),
            quantity,
            unit_price,
            total_amount: None,
            origin: origin.into(),
        }
    }

    /// Sets an explicit total that is kept even if it differs from `quantity * unit_price`.
    pub fn with_total(mut self, total_amount: Decimal) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    fn total(&self) -> ReconResult<Decimal> {
        match self.total_amount {
            Some(total) => Ok(total),
            None => Decimal::from(self.quantity)
                .checked_mul(self.unit_price)
                .ok_or_else(|| ReconError::overflow("total amount")),
        }
    }
}

/// Pre-fills an edit form from an entry taken out with [`ManualEntryStore::replace_for_edit`].
/// The stored total is carried over as an override.
impl From<&ManualEntry> for NewEntry {
    fn from(entry: &ManualEntry) -> Self {
        let txn = &entry.transaction;
        Self {
            material_code: txn.material_code().to_string(),
            quantity: txn.quantity(),
            unit_price: txn.unit_price(),
            total_amount: Some(txn.total_amount()),
            origin: txn.origin().to_string(),
        }
    }
}

impl Item for NewEntry {
    fn set_field(&mut self, field: Field, value: String, row: usize) -> ReconResult<()> {
        match field {
            Field::MaterialCode => self.material_code = value,
            Field::Quantity => self.quantity = parse_quantity(&value, row)?,
            Field::UnitPrice => self.unit_price = parse_amount(field, &value, row)?.value(),
            Field::TotalAmount => {
                self.total_amount = match optional(value) {
                    Some(v) => Some(parse_amount(field, &v, row)?.value()),
                    None => None,
                }
            }
            Field::Origin => self.origin = value,
            _ => {}
        }
        Ok(())
    }

    fn get_field(&self, field: Field) -> String {
        match field {
            Field::MaterialCode => self.material_code.clone(),
            Field::Quantity => self.quantity.to_string(),
            Field::UnitPrice => self.unit_price.normalize().to_string(),
            Field::TotalAmount => self
                .total_amount
                .map(|t| t.normalize().to_string())
                .unwrap_or_default(),
            Field::Origin => self.origin.clone(),
            _ => String::new(),
        }
    }
}

/// A stored manual entry: the transaction plus the certification fields copied from the catalog
/// when it was added. The copy is not refreshed afterwards.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ManualEntry {
    pub(crate) transaction: TransactionRecord,
    pub(crate) cert: CertFields,
}

impl ManualEntry {
    pub fn transaction(&self) -> &TransactionRecord {
        &self.transaction
    }

    pub fn cert(&self) -> &CertFields {
        &self.cert
    }
}

/// An ordered, in-memory buffer of manual entries owned by one session.
#[derive(Default, Debug, Clone)]
pub struct ManualEntryStore {
    entries: Vec<ManualEntry>,
}

impl ManualEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry`, enriched with the catalog's certification fields for its material code,
    /// and returns its index. A material code the catalog does not know is not an error; the
    /// certification fields are left blank.
    ///
    /// # Errors
    /// - `ReconError::EmptyMaterialCode` if the material code is blank.
    /// - `ReconError::Overflow` if the default total `quantity * unit_price` is out of range.
    pub fn add(&mut self, entry: NewEntry, catalog: &ReferenceCatalog) -> ReconResult<usize> {
        let material_code = entry.material_code.trim().to_string();
        if material_code.is_empty() {
            return Err(ReconError::EmptyMaterialCode);
        }

        let total = entry.total()?;
        let cert = catalog
            .lookup(&material_code)
            .map(|r| r.cert().clone())
            .unwrap_or_default();
        if cert.is_blank() {
            debug!("Manual entry '{material_code}' has no certification data in the catalog");
        }

        let transaction = TransactionRecord::new(
            material_code,
            entry.quantity,
            Amount::new(entry.unit_price),
            Amount::new(total),
            entry.origin,
        );
        self.entries.push(ManualEntry { transaction, cert });
        let index = self.entries.len() - 1;
        trace!("Added manual entry at index {index}");
        Ok(index)
    }

    /// Removes the entry at `index`.
    ///
    /// # Errors
    /// - `ReconError::NotFound` if `index` is out of range; the store is unchanged.
    pub fn remove_at(&mut self, index: usize) -> ReconResult<ManualEntry> {
        if index >= self.entries.len() {
            return Err(ReconError::NotFound {
                indices: vec![index],
            });
        }
        Ok(self.entries.remove(index))
    }

    /// Removes every entry in `indices`. Duplicates are ignored.
    ///
    /// This operation is all-or-nothing: if any index is out of range nothing is removed and
    /// `ReconError::NotFound` lists the offending indices.
    pub fn remove_many(&mut self, indices: &[usize]) -> ReconResult<usize> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let missing: Vec<usize> = sorted
            .iter()
            .copied()
            .filter(|&ix| ix >= self.entries.len())
            .collect();
        if !missing.is_empty() {
            return Err(ReconError::NotFound { indices: missing });
        }

        for &ix in sorted.iter().rev() {
            self.entries.remove(ix);
        }
        Ok(sorted.len())
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Removes and returns the entry at `index` so that a modified version can be submitted
    /// again with [`ManualEntryStore::add`]. Use `NewEntry::from(&entry)` to pre-fill the form.
    ///
    /// # Errors
    /// - `ReconError::NotFound` if `index` is out of range.
    pub fn replace_for_edit(&mut self, index: usize) -> ReconResult<ManualEntry> {
        self.remove_at(index)
    }

    /// A copy of the current entries, in insertion order.
    pub fn snapshot(&self) -> Vec<ManualEntry> {
        self.entries.clone()
    }

    pub fn entries(&self) -> &[ManualEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds every row of a manual-entry sheet, such as one produced by
    /// [`ManualEntryStore::to_rows`]. Blank total cells get the `quantity * unit_price` default.
    /// Returns the number of entries added.
    pub fn add_table(
        &mut self,
        table: &Table,
        names: &HeaderNames,
        catalog: &ReferenceCatalog,
    ) -> ReconResult<usize> {
        let (entries, columns): (Vec<NewEntry>, Columns) = parse_items(table, names)?;
        if !columns.contains(Field::MaterialCode) {
            return Err(ReconError::MissingColumn {
                column: names.header(Field::MaterialCode).to_string(),
            });
        }
        let count = entries.len();
        for entry in entries {
            self.add(entry, catalog)?;
        }
        Ok(count)
    }

    /// The manual-entry sheet: the transaction fields followed by the seven certification
    /// fields, with the header row first.
    pub fn to_rows(&self, names: &HeaderNames) -> Vec<Vec<String>> {
        let fields = manual_sheet_fields();
        let mut rows = Vec::with_capacity(self.entries.len() + 1);
        rows.push(fields.iter().map(|&f| names.header(f).to_string()).collect());
        for entry in &self.entries {
            rows.push(
                fields
                    .iter()
                    .map(|&f| match entry.cert.get(f) {
                        Some(v) => v.to_string(),
                        None if Field::CERT.contains(&f) => String::new(),
                        None => entry.transaction.get_field(f),
                    })
                    .collect(),
            );
        }
        rows
    }
}

pub(crate) fn manual_sheet_fields() -> Vec<Field> {
    Field::TRANSACTION
        .into_iter()
        .chain(Field::CERT)
        .collect()
}
