use crate::error::{ReconError, ReconResult};
use crate::model::items::{parse_items, parse_quantity};
use crate::model::{Amount, Columns, Field, HeaderNames, Item, Table};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// The transaction rows of one uploaded sheet, together with the fields that sheet has columns
/// for.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transactions {
    columns: Columns,
    data: Vec<TransactionRecord>,
}

impl Transactions {
    /// Parses the uploaded transaction table.
    ///
    /// Rows with a blank material code are not admitted; they are counted and logged. A table
    /// with no material code column at all parses successfully, with `has_material_code()`
    /// returning `false`, so that the merge can refuse it.
    pub fn from_table(table: &Table, names: &HeaderNames) -> ReconResult<Self> {
        let (rows, columns): (Vec<TransactionRecord>, Columns) = parse_items(table, names)?;
        if !columns.contains(Field::MaterialCode) {
            return Ok(Self {
                columns,
                data: rows,
            });
        }

        let total = rows.len();
        let data: Vec<TransactionRecord> = rows
            .into_iter()
            .filter(|r| !r.material_code.is_empty())
            .collect();
        let skipped = total - data.len();
        if skipped > 0 {
            warn!("Skipped {skipped} transaction row(s) with no material code");
        }
        Ok(Self { columns, data })
    }

    /// Creates a `Transactions` object from already-built records.
    pub fn from_records(data: Vec<TransactionRecord>, columns: Columns) -> Self {
        Self { columns, data }
    }

    pub fn data(&self) -> &[TransactionRecord] {
        &self.data
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn has_material_code(&self) -> bool {
        self.columns.contains(Field::MaterialCode)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single part transaction: what was bought, how many, at what price, and from where.
///
/// `total_amount` is stored as given and is not required to equal `quantity * unit_price`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionRecord {
    pub(crate) material_code: String,
    pub(crate) quantity: u64,
    pub(crate) unit_price: Amount,
    pub(crate) total_amount: Amount,
    pub(crate) origin: String,
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl TransactionRecord {
    pub fn new(
        material_code: impl Into<String>,
        quantity: u64,
        unit_price: impl Into<Amount>,
        total_amount: impl Into<Amount>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            material_code: material_code.into(),
            quantity,
            unit_price: unit_price.into(),
            total_amount: total_amount.into(),
            origin: origin.into(),
            other_fields: BTreeMap::new(),
        }
    }

    pub fn material_code(&self) -> &str {
        &self.material_code
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price.value()
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount.value()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn other_fields(&self) -> &BTreeMap<String, String> {
        &self.other_fields
    }
}

impl Item for TransactionRecord {
    fn set_field(&mut self, field: Field, value: String, row: usize) -> ReconResult<()> {
        match field {
            Field::MaterialCode => self.material_code = value,
            Field::Quantity => self.quantity = parse_quantity(&value, row)?,
            Field::UnitPrice => self.unit_price = parse_amount(field, &value, row)?,
            Field::TotalAmount => self.total_amount = parse_amount(field, &value, row)?,
            Field::Origin => self.origin = value,
            _ => {}
        }
        Ok(())
    }

    fn set_other(&mut self, header: &str, value: String) {
        let _ = self.other_fields.insert(header.to_string(), value);
    }

    fn get_field(&self, field: Field) -> String {
        match field {
            Field::MaterialCode => self.material_code.clone(),
            Field::Quantity => self.quantity.to_string(),
            Field::UnitPrice => self.unit_price.to_string(),
            Field::TotalAmount => self.total_amount.to_string(),
            Field::Origin => self.origin.clone(),
            _ => String::new(),
        }
    }
}

pub(crate) fn parse_amount(field: Field, value: &str, row: usize) -> ReconResult<Amount> {
    Amount::from_str(value).map_err(|_| ReconError::InvalidValue {
        row,
        column: field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table::parse(rows).unwrap()
    }

    #[test]
    fn test_from_table() {
        let t = table(vec![
            vec!["자재코드", "수량", "단가", "총금액", "원산지", "비고"],
            vec!["A1", "5", "10", "50", "KR", "urgent"],
            vec!["B2", "2.0", "20", "40", "CN", ""],
        ]);
        let txns = Transactions::from_table(&t, &HeaderNames::default()).unwrap();
        assert_eq!(txns.len(), 2);
        let first = &txns.data()[0];
        assert_eq!(first.material_code(), "A1");
        assert_eq!(first.quantity(), 5);
        assert_eq!(first.unit_price(), Decimal::from(10));
        assert_eq!(first.total_amount(), Decimal::from(50));
        assert_eq!(first.origin(), "KR");
        assert_eq!(first.other_fields().get("비고").unwrap(), "urgent");
        assert_eq!(txns.data()[1].quantity(), 2);
        assert!(txns.has_material_code());
        assert!(txns.columns().contains(Field::Origin));
        assert!(!txns.columns().contains(Field::HsCode));
    }

    #[test]
    fn test_blank_material_code_not_admitted() {
        let t = table(vec![
            vec!["자재코드", "수량"],
            vec!["A1", "5"],
            vec!["", "3"],
        ]);
        let txns = Transactions::from_table(&t, &HeaderNames::default()).unwrap();
        assert_eq!(txns.len(), 1);
    }

    #[test]
    fn test_missing_material_code_column_is_recorded() {
        let t = table(vec![vec!["수량", "단가"], vec!["5", "10"]]);
        let txns = Transactions::from_table(&t, &HeaderNames::default()).unwrap();
        assert!(!txns.has_material_code());
        assert_eq!(txns.len(), 1);
    }

    #[test]
    fn test_bad_price_reports_row() {
        let t = table(vec![
            vec!["자재코드", "단가"],
            vec!["A1", "10"],
            vec!["A2", "cheap"],
        ]);
        let err = Transactions::from_table(&t, &HeaderNames::default()).unwrap_err();
        assert_eq!(
            err,
            ReconError::InvalidValue {
                row: 2,
                column: Field::UnitPrice,
                value: String::from("cheap"),
            }
        );
    }

    #[test]
    fn test_to_row() {
        let record = TransactionRecord::new("A1", 5, Decimal::from(10), Decimal::from(50), "KR");
        assert_eq!(
            record.to_row(&Field::TRANSACTION),
            vec!["A1", "5", "10", "50", "KR"]
        );
    }
}
