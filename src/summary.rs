//! Grouped certification summaries and the customs declaration projection.

use crate::error::{ReconError, ReconResult};
use crate::model::{Columns, Field, MergedRecord, MergedSet};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The literal unit label written on every customs projection row.
pub const UNIT_LABEL: &str = "EA";

/// How the customs/HS code column of the summaries is chosen, as configured.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKey {
    /// Use the customs code when the merged data has that column, else the HS code.
    #[default]
    Auto,
    CustomsCode,
    HsCode,
}

serde_plain::derive_display_from_serialize!(SummaryKey);
serde_plain::derive_fromstr_from_deserialize!(SummaryKey);

/// The code column that the summaries group by, resolved once per aggregation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyColumn {
    CustomsCode,
    HsCode,
}

impl KeyColumn {
    pub fn resolve(key: SummaryKey, columns: &Columns) -> Self {
        match key {
            SummaryKey::CustomsCode => KeyColumn::CustomsCode,
            SummaryKey::HsCode => KeyColumn::HsCode,
            SummaryKey::Auto if columns.contains(Field::CustomsCode) => KeyColumn::CustomsCode,
            SummaryKey::Auto => KeyColumn::HsCode,
        }
    }

    pub fn field(self) -> Field {
        match self {
            KeyColumn::CustomsCode => Field::CustomsCode,
            KeyColumn::HsCode => Field::HsCode,
        }
    }

    fn value(self, record: &MergedRecord) -> Option<String> {
        match self {
            KeyColumn::CustomsCode => record.customs_code().map(String::from),
            KeyColumn::HsCode => record.cert().hs_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertKind {
    Radio,
    Electrical,
}

/// One group of a certification summary, with the summed quantity of its records.
/// `authority` and `rated_voltage` are only part of the key for electrical summaries.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CertSummaryRow {
    pub authority: Option<String>,
    pub code: Option<String>,
    pub origin: String,
    pub model_name: Option<String>,
    pub cert_number: String,
    pub rated_voltage: Option<String>,
    pub quantity: u64,
}

/// A radio or electrical certification summary.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CertSummary {
    pub(crate) kind: CertKind,
    pub(crate) key: KeyColumn,
    pub(crate) columns: Columns,
    pub(crate) rows: Vec<CertSummaryRow>,
}

impl CertSummary {
    pub fn kind(&self) -> CertKind {
        self.kind
    }

    pub fn key(&self) -> KeyColumn {
        self.key
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn rows(&self) -> &[CertSummaryRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_quantity(&self) -> ReconResult<u64> {
        self.rows.iter().try_fold(0u64, |acc, r| {
            acc.checked_add(r.quantity)
                .ok_or_else(|| ReconError::overflow("summary quantity"))
        })
    }
}

type GroupKey = (
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    String,
    Option<String>,
);

/// Groups by (code, origin, model name, radio cert) over the records that have a radio
/// certification number. Groups appear in first-seen order.
///
/// # Errors
/// - `ReconError::Overflow` if a group's quantity leaves the `u64` range.
pub fn radio_summary(merged: &MergedSet, key: KeyColumn) -> ReconResult<CertSummary> {
    summarize(merged, key, CertKind::Radio, |r| {
        let cert = r.cert().radio_cert.clone()?;
        Some((
            None,
            key.value(r),
            r.origin().to_string(),
            r.cert().model_name.clone(),
            cert,
            None,
        ))
    })
}

/// Groups by (authority, code, origin, model name, electrical cert, rated voltage) over the
/// records that have an electrical certification number. Groups appear in first-seen order.
pub fn electrical_summary(merged: &MergedSet, key: KeyColumn) -> ReconResult<CertSummary> {
    summarize(merged, key, CertKind::Electrical, |r| {
        let cert = r.cert().electrical_cert.clone()?;
        Some((
            r.cert().electrical_authority.clone(),
            key.value(r),
            r.origin().to_string(),
            r.cert().model_name.clone(),
            cert,
            r.cert().rated_voltage.clone(),
        ))
    })
}

fn summarize<F>(
    merged: &MergedSet,
    key: KeyColumn,
    kind: CertKind,
    group_key: F,
) -> ReconResult<CertSummary>
where
    F: Fn(&MergedRecord) -> Option<GroupKey>,
{
    let mut groups: IndexMap<GroupKey, u64> = IndexMap::new();
    for record in merged.records() {
        if let Some(k) = group_key(record) {
            let sum = groups.entry(k).or_insert(0);
            *sum = sum
                .checked_add(record.quantity())
                .ok_or_else(|| ReconError::overflow("summary quantity"))?;
        }
    }

    let rows = groups
        .into_iter()
        .map(
            |((authority, code, origin, model_name, cert_number, rated_voltage), quantity)| {
                CertSummaryRow {
                    authority,
                    code,
                    origin,
                    model_name,
                    cert_number,
                    rated_voltage,
                    quantity,
                }
            },
        )
        .collect();

    Ok(CertSummary {
        kind,
        key,
        columns: merged.columns().clone(),
        rows,
    })
}

/// A merged record reformatted for the customs declaration sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomsProjectionRow {
    pub hs_code: Option<String>,
    pub origin: String,
    pub quantity: u64,
    pub unit: &'static str,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub material_code: String,
}

/// The ungrouped customs declaration projection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomsProjection {
    pub(crate) columns: Columns,
    pub(crate) rows: Vec<CustomsProjectionRow>,
}

impl CustomsProjection {
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn rows(&self) -> &[CustomsProjectionRow] {
        &self.rows
    }
}

/// Projects every record, matched or not, row for row.
pub fn customs_projection(merged: &MergedSet) -> CustomsProjection {
    let rows = merged
        .records()
        .iter()
        .map(|r| CustomsProjectionRow {
            hs_code: r.cert().hs_code.clone(),
            origin: r.origin().to_string(),
            quantity: r.quantity(),
            unit: UNIT_LABEL,
            unit_price: r.transaction().unit_price(),
            total_amount: r.transaction().total_amount(),
            material_code: r.material_code().to_string(),
        })
        .collect();
    CustomsProjection {
        columns: merged.columns().clone(),
        rows,
    }
}
