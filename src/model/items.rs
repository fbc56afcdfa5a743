use crate::error::{ReconError, ReconResult};
use crate::model::{Columns, Field, HeaderNames, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// A record that can be filled in from one row of a [`Table`].
pub trait Item: Default {
    /// Given a recognised `field` and the cell `value`, set the appropriate struct field. `row`
    /// is the 1-based data row number, used in error messages.
    fn set_field(&mut self, field: Field, value: String, row: usize) -> ReconResult<()>;

    /// Store a cell whose header is not one of the known fields. The default drops it.
    fn set_other(&mut self, _header: &str, _value: String) {}

    /// Given a `field`, retrieve the struct field value as text.
    fn get_field(&self, field: Field) -> String;

    /// Convert the struct field values to a `Vec<String>` in the order of `fields`.
    fn to_row(&self, fields: &[Field]) -> Vec<String> {
        fields.iter().map(|&f| self.get_field(f)).collect()
    }
}

/// Parses every row of `table` into `T`, matching headers to fields through `names`.
///
/// Returns the parsed items together with the set of known fields that the table has a
/// column for.
pub(crate) fn parse_items<T: Item>(
    table: &Table,
    names: &HeaderNames,
) -> ReconResult<(Vec<T>, Columns)> {
    let resolved: Vec<(Option<Field>, &str)> = table
        .mapping()
        .headers()
        .iter()
        .map(|h| (names.field(h), h.as_ref()))
        .collect();
    let columns: Columns = resolved.iter().filter_map(|(f, _)| *f).collect();

    let mut items = Vec::with_capacity(table.len());
    for (row_ix, values) in table.rows().iter().enumerate() {
        let mut item = T::default();
        for (col_ix, value) in values.iter().enumerate() {
            match resolved.get(col_ix) {
                Some((Some(field), _)) => {
                    item.set_field(*field, value.trim().to_string(), row_ix + 1)?
                }
                Some((None, header)) if !header.is_empty() => {
                    item.set_other(header, value.clone())
                }
                _ => {}
            }
        }
        items.push(item);
    }
    Ok((items, columns))
}

/// Empty text becomes `None`.
pub(crate) fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses a quantity. Spreadsheet readers hand over numbers as floats, so `5.0` is accepted, but
/// the value must be a non-negative whole number. Empty text is zero.
pub(crate) fn parse_quantity(value: &str, row: usize) -> ReconResult<u64> {
    let trimmed = value.trim().replace(',', "");
    if trimmed.is_empty() {
        return Ok(0);
    }
    let invalid = || ReconError::InvalidValue {
        row,
        column: Field::Quantity,
        value: value.to_string(),
    };
    let number = Decimal::from_str(&trimmed)
        .or_else(|_| Decimal::from_scientific(&trimmed))
        .map_err(|_| invalid())?;
    if (number.is_sign_negative() && !number.is_zero()) || !number.fract().is_zero() {
        return Err(invalid());
    }
    number.to_u64().ok_or_else(invalid)
}
