use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Every logical column the engine knows about, across the master, model and transaction tables.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    MaterialCode,
    HsCode,
    CustomsCode,
    ModelSpec,
    ModelName,
    RadioCert,
    ElectricalAuthority,
    ElectricalCert,
    RatedVoltage,
    Origin,
    Quantity,
    UnitPrice,
    TotalAmount,
}

serde_plain::derive_display_from_serialize!(Field);
serde_plain::derive_fromstr_from_deserialize!(Field);

impl Field {
    pub const ALL: [Field; 13] = [
        Field::MaterialCode,
        Field::HsCode,
        Field::CustomsCode,
        Field::ModelSpec,
        Field::ModelName,
        Field::RadioCert,
        Field::ElectricalAuthority,
        Field::ElectricalCert,
        Field::RatedVoltage,
        Field::Origin,
        Field::Quantity,
        Field::UnitPrice,
        Field::TotalAmount,
    ];

    /// The seven certification fields that are copied from the catalog onto a record.
    pub const CERT: [Field; 7] = [
        Field::HsCode,
        Field::ModelSpec,
        Field::ModelName,
        Field::RadioCert,
        Field::ElectricalAuthority,
        Field::ElectricalCert,
        Field::RatedVoltage,
    ];

    /// The fields a transaction row carries.
    pub const TRANSACTION: [Field; 5] = [
        Field::MaterialCode,
        Field::Quantity,
        Field::UnitPrice,
        Field::TotalAmount,
        Field::Origin,
    ];
}

/// The set of fields actually present in a data source. Exporters use it to leave out columns
/// that the source never had.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Columns(BTreeSet<Field>);

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn insert(&mut self, field: Field) {
        self.0.insert(field);
    }

    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Adds every field in `other` to `self`.
    pub fn extend(&mut self, other: &Columns) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Field> for Columns {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The header text used for each field in the input spreadsheets and in the exported report.
///
/// The defaults are the Korean headers used by the master, model and transaction sheets. Any of
/// them can be overridden in `config.json`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HeaderNames {
    pub material_code: String,
    pub hs_code: String,
    pub customs_code: String,
    pub model_spec: String,
    pub model_name: String,
    pub radio_cert: String,
    pub electrical_authority: String,
    pub electrical_cert: String,
    pub rated_voltage: String,
    pub origin: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_amount: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            material_code: MATERIAL_CODE_STR.to_string(),
            hs_code: HS_CODE_STR.to_string(),
            customs_code: CUSTOMS_CODE_STR.to_string(),
            model_spec: MODEL_SPEC_STR.to_string(),
            model_name: MODEL_NAME_STR.to_string(),
            radio_cert: RADIO_CERT_STR.to_string(),
            electrical_authority: ELECTRICAL_AUTHORITY_STR.to_string(),
            electrical_cert: ELECTRICAL_CERT_STR.to_string(),
            rated_voltage: RATED_VOLTAGE_STR.to_string(),
            origin: ORIGIN_STR.to_string(),
            quantity: QUANTITY_STR.to_string(),
            unit_price: UNIT_PRICE_STR.to_string(),
            total_amount: TOTAL_AMOUNT_STR.to_string(),
        }
    }
}

impl HeaderNames {
    /// The header text for `field`.
    pub fn header(&self, field: Field) -> &str {
        match field {
            Field::MaterialCode => &self.material_code,
            Field::HsCode => &self.hs_code,
            Field::CustomsCode => &self.customs_code,
            Field::ModelSpec => &self.model_spec,
            Field::ModelName => &self.model_name,
            Field::RadioCert => &self.radio_cert,
            Field::ElectricalAuthority => &self.electrical_authority,
            Field::ElectricalCert => &self.electrical_cert,
            Field::RatedVoltage => &self.rated_voltage,
            Field::Origin => &self.origin,
            Field::Quantity => &self.quantity,
            Field::UnitPrice => &self.unit_price,
            Field::TotalAmount => &self.total_amount,
        }
    }

    /// Finds the field whose header is `header`. Surrounding whitespace is ignored.
    pub fn field(&self, header: impl AsRef<str>) -> Option<Field> {
        let header = header.as_ref().trim();
        Field::ALL
            .into_iter()
            .find(|&f| self.header(f).trim() == header)
    }
}

pub(crate) const MATERIAL_CODE_STR: &str = "자재코드";
pub(crate) const HS_CODE_STR: &str = "HS코드";
pub(crate) const CUSTOMS_CODE_STR: &str = "세번부호";
pub(crate) const MODEL_SPEC_STR: &str = "모델규격";
pub(crate) const MODEL_NAME_STR: &str = "모델명";
pub(crate) const RADIO_CERT_STR: &str = "전파인증번호";
pub(crate) const ELECTRICAL_AUTHORITY_STR: &str = "전기인증기관";
pub(crate) const ELECTRICAL_CERT_STR: &str = "전기인증번호";
pub(crate) const RATED_VOLTAGE_STR: &str = "정격전압";
pub(crate) const ORIGIN_STR: &str = "원산지";
pub(crate) const QUANTITY_STR: &str = "수량";
pub(crate) const UNIT_PRICE_STR: &str = "단가";
pub(crate) const TOTAL_AMOUNT_STR: &str = "총금액";
