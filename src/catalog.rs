//! The reference catalog: master data joined with model data, indexed by material code.

use crate::error::{ReconError, ReconResult};
use crate::model::items::parse_items;
use crate::model::{Columns, Field, HeaderNames, MasterRow, ModelRow, ReferenceRecord, Table};
use std::collections::HashMap;
use tracing::{debug, warn};

const MASTER: &str = "master";
const MODEL: &str = "model";

/// Certification metadata for every known material code.
///
/// Built once per session by left-joining the master table onto the model table on model name.
/// Every master row is kept, with blank certification fields when its model is not in the model
/// table. The catalog is read-only after construction.
#[derive(Default, Debug, Clone)]
pub struct ReferenceCatalog {
    records: Vec<ReferenceRecord>,
    index: HashMap<String, usize>,
    columns: Columns,
}

impl ReferenceCatalog {
    /// Joins `master` and `models` into a catalog.
    ///
    /// # Errors
    /// - `ReconError::Schema` if `master` lacks the material code or model name column, or if
    ///   `models` lacks the model name column.
    /// - `ReconError::InvalidValue` / `ReconError::Mapping` if a table cannot be parsed.
    ///
    /// A master row whose model is missing from `models` is not an error.
    pub fn build(master: &Table, models: &Table, names: &HeaderNames) -> ReconResult<Self> {
        require(master, MASTER, names, Field::MaterialCode)?;
        require(master, MASTER, names, Field::ModelName)?;
        require(models, MODEL, names, Field::ModelName)?;

        let (master_rows, master_columns): (Vec<MasterRow>, Columns) =
            parse_items(master, names)?;
        let (model_rows, model_columns): (Vec<ModelRow>, Columns) = parse_items(models, names)?;

        let mut by_model: HashMap<&str, &ModelRow> = HashMap::new();
        for row in &model_rows {
            if by_model.contains_key(row.model_name.as_str()) {
                warn!(
                    "Model '{}' appears more than once in the model table; the first row is used",
                    row.model_name
                );
                continue;
            }
            by_model.insert(row.model_name.as_str(), row);
        }

        let mut records = Vec::with_capacity(master_rows.len());
        let mut index = HashMap::with_capacity(master_rows.len());
        let mut unmodelled = 0_usize;
        for row in master_rows {
            if row.material_code.is_empty() {
                debug!("Skipping a master row with no material code");
                continue;
            }
            let model = row
                .model_name
                .as_deref()
                .and_then(|name| by_model.get(name).copied());
            if model.is_none() {
                unmodelled += 1;
            }
            let record = ReferenceRecord::join(row, model);
            if index.contains_key(record.material_code()) {
                warn!(
                    "Material code '{}' appears more than once in the master table; the first \
                    row is used for lookups",
                    record.material_code()
                );
            } else {
                index.insert(record.material_code().to_string(), records.len());
            }
            records.push(record);
        }

        let mut columns = master_columns;
        columns.extend(&model_columns);
        for field in Field::TRANSACTION {
            if field != Field::MaterialCode {
                columns.remove(field);
            }
        }

        debug!(
            "Built reference catalog with {} record(s), {} without a model match",
            records.len(),
            unmodelled
        );

        Ok(Self {
            records,
            index,
            columns,
        })
    }

    /// The catalog entry for `material_code`. Matching is exact, with no trimming or case folding.
    pub fn lookup(&self, material_code: &str) -> Option<&ReferenceRecord> {
        self.index.get(material_code).map(|&ix| &self.records[ix])
    }

    /// Every catalog entry, in master table order.
    pub fn all(&self) -> &[ReferenceRecord] {
        &self.records
    }

    /// The fields that the master and model tables had columns for.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn require(table: &Table, name: &str, names: &HeaderNames, field: Field) -> ReconResult<()> {
    let header = names.header(field);
    if table.mapping().contains(header) {
        Ok(())
    } else {
        Err(ReconError::Schema {
            table: name.to_string(),
            column: header.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{master_table, model_table};

    #[test]
    fn test_build_and_lookup() {
        let catalog =
            ReferenceCatalog::build(&master_table(), &model_table(), &HeaderNames::default())
                .unwrap();
        assert_eq!(catalog.len(), 3);

        let a1 = catalog.lookup("A1").unwrap();
        assert_eq!(a1.cert().hs_code.as_deref(), Some("8517"));
        assert_eq!(a1.cert().radio_cert.as_deref(), Some("R-001"));
        assert_eq!(a1.cert().electrical_cert, None);

        let c3 = catalog.lookup("C3").unwrap();
        assert_eq!(c3.cert().electrical_authority.as_deref(), Some("KC"));
        assert_eq!(c3.cert().electrical_cert.as_deref(), Some("E-100"));
        assert_eq!(c3.cert().rated_voltage.as_deref(), Some("220V"));

        assert!(catalog.lookup("B2").is_none());
    }

    #[test]
    fn test_master_row_without_model_is_kept() {
        let catalog =
            ReferenceCatalog::build(&master_table(), &model_table(), &HeaderNames::default())
                .unwrap();
        let d4 = catalog.lookup("D4").unwrap();
        assert_eq!(d4.cert().model_name.as_deref(), Some("ORPHAN"));
        assert_eq!(d4.cert().hs_code.as_deref(), Some("8504"));
        assert_eq!(d4.cert().radio_cert, None);
        assert_eq!(d4.cert().electrical_cert, None);
    }

    #[test]
    fn test_lookup_is_exact() {
        let catalog =
            ReferenceCatalog::build(&master_table(), &model_table(), &HeaderNames::default())
                .unwrap();
        assert!(catalog.lookup("a1").is_none());
        assert!(catalog.lookup(" A1").is_none());
    }

    #[test]
    fn test_missing_model_name_column() {
        let master = Table::parse(vec![vec!["자재코드", "HS코드"], vec!["A1", "8517"]]).unwrap();
        let err =
            ReferenceCatalog::build(&master, &model_table(), &HeaderNames::default()).unwrap_err();
        assert_eq!(
            err,
            ReconError::Schema {
                table: String::from("master"),
                column: String::from("모델명"),
            }
        );
    }

    #[test]
    fn test_model_table_needs_model_name() {
        let models = Table::parse(vec![vec!["전파인증번호"], vec!["R-1"]]).unwrap();
        let err =
            ReferenceCatalog::build(&master_table(), &models, &HeaderNames::default()).unwrap_err();
        assert!(matches!(err, ReconError::Schema { ref table, .. } if table == "model"));
    }

    #[test]
    fn test_duplicate_material_code_first_wins() {
        let master = Table::parse(vec![
            vec!["자재코드", "HS코드", "모델명"],
            vec!["A1", "8517", "M1"],
            vec!["A1", "9999", "M1"],
        ])
        .unwrap();
        let catalog =
            ReferenceCatalog::build(&master, &model_table(), &HeaderNames::default()).unwrap();
        assert_eq!(catalog.all().len(), 2);
        assert_eq!(
            catalog.lookup("A1").unwrap().cert().hs_code.as_deref(),
            Some("8517")
        );
    }

    #[test]
    fn test_duplicate_model_name_first_wins() {
        let models = Table::parse(vec![
            vec!["모델명", "전파인증번호"],
            vec!["M1", "R-001"],
            vec!["M1", "R-999"],
        ])
        .unwrap();
        let catalog =
            ReferenceCatalog::build(&master_table(), &models, &HeaderNames::default()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.lookup("A1").unwrap().cert().radio_cert.as_deref(),
            Some("R-001")
        );
    }

    #[test]
    fn test_master_row_without_material_code_is_skipped() {
        let master = Table::parse(vec![
            vec!["자재코드", "HS코드", "모델명"],
            vec!["A1", "8517", "M1"],
            vec!["", "8504", "M3"],
            vec!["C3", "8504", "M3"],
        ])
        .unwrap();
        let catalog =
            ReferenceCatalog::build(&master, &model_table(), &HeaderNames::default()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.lookup("").is_none());
        let codes: Vec<&str> = catalog.all().iter().map(|r| r.material_code()).collect();
        assert_eq!(codes, vec!["A1", "C3"]);
    }

    #[test]
    fn test_model_value_overrides_master_value() {
        let master = Table::parse(vec![
            vec!["자재코드", "HS코드", "모델규격", "모델명"],
            vec!["A1", "8517", "SPEC-1", "M1"],
            vec!["C3", "8504", "SPEC-3", "M3"],
        ])
        .unwrap();
        let models = Table::parse(vec![
            vec!["모델명", "HS코드", "전파인증번호"],
            vec!["M1", "8517.62", "R-001"],
            vec!["M3", "", ""],
        ])
        .unwrap();
        let catalog =
            ReferenceCatalog::build(&master, &models, &HeaderNames::default()).unwrap();

        let a1 = catalog.lookup("A1").unwrap().cert();
        assert_eq!(a1.hs_code.as_deref(), Some("8517.62"));
        assert_eq!(a1.model_spec.as_deref(), Some("SPEC-1"));

        // a blank model cell does not hide the master value
        let c3 = catalog.lookup("C3").unwrap().cert();
        assert_eq!(c3.hs_code.as_deref(), Some("8504"));
    }

    #[test]
    fn test_columns() {
        let catalog =
            ReferenceCatalog::build(&master_table(), &model_table(), &HeaderNames::default())
                .unwrap();
        let columns = catalog.columns();
        assert!(columns.contains(Field::MaterialCode));
        assert!(columns.contains(Field::RadioCert));
        assert!(columns.contains(Field::RatedVoltage));
        assert!(!columns.contains(Field::CustomsCode));
        assert!(!columns.contains(Field::Quantity));
    }
}
