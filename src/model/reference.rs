use crate::error::ReconResult;
use crate::model::items::optional;
use crate::model::{Field, Item};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The seven certification fields that the catalog supplies for a material code. Every field is
/// optional: a blank cell, a master row without a model match, or an unmatched transaction all
/// leave them `None`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CertFields {
    pub hs_code: Option<String>,
    pub model_spec: Option<String>,
    pub model_name: Option<String>,
    pub radio_cert: Option<String>,
    pub electrical_authority: Option<String>,
    pub electrical_cert: Option<String>,
    pub rated_voltage: Option<String>,
}

impl CertFields {
    /// Returns the value of one of the seven certification fields. Other fields are `None`.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::HsCode => self.hs_code.as_deref(),
            Field::ModelSpec => self.model_spec.as_deref(),
            Field::ModelName => self.model_name.as_deref(),
            Field::RadioCert => self.radio_cert.as_deref(),
            Field::ElectricalAuthority => self.electrical_authority.as_deref(),
            Field::ElectricalCert => self.electrical_cert.as_deref(),
            Field::RatedVoltage => self.rated_voltage.as_deref(),
            _ => None,
        }
    }

    /// True when all seven fields are blank.
    pub fn is_blank(&self) -> bool {
        Field::CERT.iter().all(|&f| self.get(f).is_none())
    }
}

/// One entry of the reference catalog, keyed by material code.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReferenceRecord {
    pub(crate) material_code: String,
    pub(crate) customs_code: Option<String>,
    pub(crate) cert: CertFields,
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl ReferenceRecord {
    pub fn material_code(&self) -> &str {
        &self.material_code
    }

    pub fn customs_code(&self) -> Option<&str> {
        self.customs_code.as_deref()
    }

    pub fn cert(&self) -> &CertFields {
        &self.cert
    }

    /// Columns of the master or model table that are not one of the known fields.
    pub fn other_fields(&self) -> &BTreeMap<String, String> {
        &self.other_fields
    }
}

/// A row of the master table: material code, HS code, model spec and the model name that joins
/// it to the model table.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub(crate) struct MasterRow {
    pub(crate) material_code: String,
    pub(crate) hs_code: Option<String>,
    pub(crate) customs_code: Option<String>,
    pub(crate) model_spec: Option<String>,
    pub(crate) model_name: Option<String>,
    /// Certification columns that the master table carries itself. The model table wins when
    /// both have a value.
    pub(crate) cert: CertFields,
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Item for MasterRow {
    fn set_field(&mut self, field: Field, value: String, _row: usize) -> ReconResult<()> {
        match field {
            Field::MaterialCode => self.material_code = value,
            Field::HsCode => self.hs_code = optional(value),
            Field::CustomsCode => self.customs_code = optional(value),
            Field::ModelSpec => self.model_spec = optional(value),
            Field::ModelName => self.model_name = optional(value),
            Field::RadioCert => self.cert.radio_cert = optional(value),
            Field::ElectricalAuthority => self.cert.electrical_authority = optional(value),
            Field::ElectricalCert => self.cert.electrical_cert = optional(value),
            Field::RatedVoltage => self.cert.rated_voltage = optional(value),
            Field::Origin | Field::Quantity | Field::UnitPrice | Field::TotalAmount => {}
        }
        Ok(())
    }

    fn set_other(&mut self, header: &str, value: String) {
        let _ = self.other_fields.insert(header.to_string(), value);
    }

    fn get_field(&self, field: Field) -> String {
        match field {
            Field::MaterialCode => self.material_code.clone(),
            Field::HsCode => self.hs_code.clone().unwrap_or_default(),
            Field::CustomsCode => self.customs_code.clone().unwrap_or_default(),
            Field::ModelSpec => self.model_spec.clone().unwrap_or_default(),
            Field::ModelName => self.model_name.clone().unwrap_or_default(),
            other => self.cert.get(other).unwrap_or_default().to_string(),
        }
    }
}

/// A row of the model table: the certification data for one model name.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub(crate) struct ModelRow {
    pub(crate) model_name: String,
    pub(crate) hs_code: Option<String>,
    pub(crate) model_spec: Option<String>,
    pub(crate) radio_cert: Option<String>,
    pub(crate) electrical_authority: Option<String>,
    pub(crate) electrical_cert: Option<String>,
    pub(crate) rated_voltage: Option<String>,
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Item for ModelRow {
    fn set_field(&mut self, field: Field, value: String, _row: usize) -> ReconResult<()> {
        match field {
            Field::ModelName => self.model_name = value,
            Field::HsCode => self.hs_code = optional(value),
            Field::ModelSpec => self.model_spec = optional(value),
            Field::RadioCert => self.radio_cert = optional(value),
            Field::ElectricalAuthority => self.electrical_authority = optional(value),
            Field::ElectricalCert => self.electrical_cert = optional(value),
            Field::RatedVoltage => self.rated_voltage = optional(value),
            _ => {}
        }
        Ok(())
    }

    fn set_other(&mut self, header: &str, value: String) {
        let _ = self.other_fields.insert(header.to_string(), value);
    }

    fn get_field(&self, field: Field) -> String {
        let value = match field {
            Field::ModelName => Some(&self.model_name),
            Field::HsCode => self.hs_code.as_ref(),
            Field::ModelSpec => self.model_spec.as_ref(),
            Field::RadioCert => self.radio_cert.as_ref(),
            Field::ElectricalAuthority => self.electrical_authority.as_ref(),
            Field::ElectricalCert => self.electrical_cert.as_ref(),
            Field::RatedVoltage => self.rated_voltage.as_ref(),
            _ => None,
        };
        value.cloned().unwrap_or_default()
    }
}

impl ReferenceRecord {
    /// Joins a master row with its model row, if one was found. Values from the model table take
    /// precedence over the same column in the master table.
    pub(crate) fn join(master: MasterRow, model: Option<&ModelRow>) -> Self {
        let MasterRow {
            material_code,
            hs_code,
            customs_code,
            model_spec,
            model_name,
            cert,
            mut other_fields,
        } = master;

        let pick = |from_model: Option<&Option<String>>, from_master: Option<String>| {
            from_model.cloned().flatten().or(from_master)
        };

        let cert = CertFields {
            hs_code: pick(model.map(|m| &m.hs_code), hs_code),
            model_spec: pick(model.map(|m| &m.model_spec), model_spec),
            model_name,
            radio_cert: pick(model.map(|m| &m.radio_cert), cert.radio_cert),
            electrical_authority: pick(
                model.map(|m| &m.electrical_authority),
                cert.electrical_authority,
            ),
            electrical_cert: pick(model.map(|m| &m.electrical_cert), cert.electrical_cert),
            rated_voltage: pick(model.map(|m| &m.rated_voltage), cert.rated_voltage),
        };

        if let Some(model) = model {
            for (k, v) in &model.other_fields {
                other_fields.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        Self {
            material_code,
            customs_code,
            cert,
            other_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, radio: Option<&str>) -> ModelRow {
        ModelRow {
            model_name: name.to_string(),
            radio_cert: radio.map(String::from),
            ..ModelRow::default()
        }
    }

    #[test]
    fn test_join_with_model() {
        let master = MasterRow {
            material_code: String::from("A1"),
            hs_code: Some(String::from("8517")),
            model_name: Some(String::from("M1")),
            ..MasterRow::default()
        };
        let record = ReferenceRecord::join(master, Some(&model("M1", Some("R-001"))));
        assert_eq!(record.material_code(), "A1");
        assert_eq!(record.cert().hs_code.as_deref(), Some("8517"));
        assert_eq!(record.cert().radio_cert.as_deref(), Some("R-001"));
        assert_eq!(record.cert().electrical_cert, None);
    }

    #[test]
    fn test_join_without_model_keeps_master_values() {
        let master = MasterRow {
            material_code: String::from("A1"),
            model_spec: Some(String::from("100x200")),
            model_name: Some(String::from("GONE")),
            ..MasterRow::default()
        };
        let record = ReferenceRecord::join(master, None);
        assert_eq!(record.cert().model_spec.as_deref(), Some("100x200"));
        assert_eq!(record.cert().model_name.as_deref(), Some("GONE"));
        assert_eq!(record.cert().radio_cert, None);
    }

    #[test]
    fn test_cert_fields_blank() {
        assert!(CertFields::default().is_blank());
        let cert = CertFields {
            rated_voltage: Some(String::from("220V")),
            ..CertFields::default()
        };
        assert!(!cert.is_blank());
        assert_eq!(cert.get(Field::RatedVoltage), Some("220V"));
        assert_eq!(cert.get(Field::Origin), None);
    }
}
