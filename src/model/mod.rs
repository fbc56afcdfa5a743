//! Types that represent the core data model, such as `Table`, `ReferenceRecord` and
//! `MergedRecord`.
mod amount;
mod field;
pub(crate) mod items;
mod mapping;
mod merged;
mod reference;
mod transaction;

pub use amount::{Amount, AmountError};
pub use field::{Columns, Field, HeaderNames};
pub use items::Item;
pub use mapping::{Header, Mapping, MappingError, Table};
pub use merged::{MergedRecord, MergedSet, Totals};
pub(crate) use reference::{MasterRow, ModelRow};
pub use reference::{CertFields, ReferenceRecord};
pub(crate) use transaction::parse_amount;
pub use transaction::{TransactionRecord, Transactions};
