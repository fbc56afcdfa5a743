//! Packages the merged table and the three summaries into a four-sheet workbook.
//!
//! The in-memory `ReportWorkbook` is built first; `to_xlsx` serializes it. Writing the bytes
//! anywhere is left to the caller.

use crate::model::{Columns, Field, HeaderNames, MergedSet};
use crate::summary::{CertSummary, CertSummaryRow, CustomsProjection, KeyColumn};
use crate::Result;
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Color, Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Header of the unit label column in the customs sheet.
pub const UNIT_HEADER: &str = "단위";

/// Fill colour for unmatched rows of the full list.
const UNMATCHED_FILL: u32 = 0xFFC7CE;

/// The names of the four report sheets. Excel limits sheet names to 31 characters.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SheetNames {
    pub full_list: String,
    pub radio_summary: String,
    pub electrical_summary: String,
    pub customs: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            full_list: String::from("Full list"),
            radio_summary: String::from("Radio cert summary"),
            electrical_summary: String::from("Electrical cert summary"),
            customs: String::from("Customs declaration"),
        }
    }
}

/// A column of an output sheet.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum SheetColumn {
    Field(Field),
    Blank,
    Unit,
}

impl SheetColumn {
    fn is_present(self, columns: &Columns) -> bool {
        match self {
            SheetColumn::Field(f) => columns.contains(f),
            SheetColumn::Blank | SheetColumn::Unit => true,
        }
    }

    fn header(self, names: &HeaderNames) -> String {
        match self {
            SheetColumn::Field(f) => names.header(f).to_string(),
            SheetColumn::Blank => String::new(),
            SheetColumn::Unit => UNIT_HEADER.to_string(),
        }
    }
}

const FULL_LIST: [SheetColumn; 12] = [
    SheetColumn::Field(Field::MaterialCode),
    SheetColumn::Field(Field::HsCode),
    SheetColumn::Field(Field::ModelSpec),
    SheetColumn::Field(Field::ModelName),
    SheetColumn::Field(Field::RadioCert),
    SheetColumn::Field(Field::ElectricalAuthority),
    SheetColumn::Field(Field::ElectricalCert),
    SheetColumn::Field(Field::RatedVoltage),
    SheetColumn::Field(Field::Origin),
    SheetColumn::Field(Field::Quantity),
    SheetColumn::Field(Field::UnitPrice),
    SheetColumn::Field(Field::TotalAmount),
];

const CUSTOMS: [SheetColumn; 8] = [
    SheetColumn::Field(Field::HsCode),
    SheetColumn::Field(Field::Origin),
    SheetColumn::Blank,
    SheetColumn::Field(Field::Quantity),
    SheetColumn::Unit,
    SheetColumn::Field(Field::UnitPrice),
    SheetColumn::Field(Field::TotalAmount),
    SheetColumn::Field(Field::MaterialCode),
];

fn radio_columns(key: KeyColumn) -> [SheetColumn; 5] {
    [
        SheetColumn::Field(key.field()),
        SheetColumn::Field(Field::Origin),
        SheetColumn::Field(Field::ModelName),
        SheetColumn::Field(Field::RadioCert),
        SheetColumn::Field(Field::Quantity),
    ]
}

fn electrical_columns(key: KeyColumn) -> [SheetColumn; 7] {
    [
        SheetColumn::Field(Field::ElectricalAuthority),
        SheetColumn::Field(key.field()),
        SheetColumn::Field(Field::Origin),
        SheetColumn::Field(Field::ModelName),
        SheetColumn::Field(Field::ElectricalCert),
        SheetColumn::Field(Field::RatedVoltage),
        SheetColumn::Field(Field::Quantity),
    ]
}

/// A single cell value of a report sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(u64),
    Number(Decimal),
    Empty,
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Cell::Text(v.to_string()),
            _ => Cell::Empty,
        }
    }
}

impl Cell {
    /// The cell as an `f64` when the float prints back as the same text. Values past f64
    /// precision yield `None` and are written as text.
    fn exact_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Integer(n) => *n as f64,
            Cell::Number(d) => d.to_f64()?,
            Cell::Text(_) | Cell::Empty => return None,
        };
        (value.to_string() == self.to_string()).then_some(value)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(n) => write!(f, "{n}"),
            Cell::Number(d) => write!(f, "{}", d.normalize()),
            Cell::Empty => Ok(()),
        }
    }
}

/// A data row of a sheet. `highlight` marks unmatched rows of the full list.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReportRow {
    pub cells: Vec<Cell>,
    pub highlight: bool,
}

/// One named sheet: a header row and data rows.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReportSheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<ReportRow>,
}

impl ReportSheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// The sheet as text, header row first.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.headers.clone())
            .chain(
                self.rows
                    .iter()
                    .map(|r| r.cells.iter().map(|c| c.to_string()).collect()),
            )
            .collect()
    }
}

/// The report: full list, radio summary, electrical summary and customs projection, in that
/// order.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReportWorkbook {
    sheets: Vec<ReportSheet>,
}

impl ReportWorkbook {
    /// A single-sheet workbook of text rows, the first of which is the header row.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let rows = rows
            .map(|r| ReportRow {
                cells: r.into_iter().map(|v| Cell::text(Some(&v))).collect(),
                highlight: false,
            })
            .collect();
        Self {
            sheets: vec![ReportSheet {
                name: name.into(),
                headers,
                rows,
            }],
        }
    }

    pub fn sheets(&self) -> &[ReportSheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&ReportSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Serializes the workbook to xlsx bytes. Header rows are bold and frozen; highlighted rows
    /// get a red fill.
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let plain = Format::new();
        let highlight = Format::new().set_background_color(Color::RGB(UNMATCHED_FILL));

        for sheet in &self.sheets {
            let worksheet = workbook
                .add_worksheet()
                .set_name(&sheet.name)
                .with_context(|| format!("Failed to create sheet '{}'", sheet.name))?;

            for (col, header) in sheet.headers.iter().enumerate() {
                worksheet
                    .write_string_with_format(0, col as u16, header, &header_format)
                    .context("Failed to write header row")?;
            }
            worksheet
                .set_freeze_panes(1, 0)
                .context("Failed to freeze header row")?;

            for (ix, row) in sheet.rows.iter().enumerate() {
                let r = (ix + 1) as u32;
                let format = if row.highlight { &highlight } else { &plain };
                for (col, cell) in row.cells.iter().enumerate() {
                    let c = col as u16;
                    let written = match cell {
                        Cell::Text(s) => worksheet.write_string_with_format(r, c, s, format),
                        Cell::Integer(_) | Cell::Number(_) => match cell.exact_f64() {
                            Some(n) => worksheet.write_number_with_format(r, c, n, format),
                            None => {
                                worksheet.write_string_with_format(r, c, cell.to_string(), format)
                            }
                        },
                        Cell::Empty => worksheet.write_blank(r, c, format),
                    };
                    written.with_context(|| {
                        format!("Failed to write cell ({r}, {c}) of '{}'", sheet.name)
                    })?;
                }
            }
            worksheet.autofit();
        }

        workbook
            .save_to_buffer()
            .context("Failed to serialize the report workbook")
    }
}

/// Builds the four-sheet report. Columns whose field is absent from the underlying data are
/// left out of the sheet.
pub fn export(
    merged: &MergedSet,
    radio: &CertSummary,
    electrical: &CertSummary,
    customs: &CustomsProjection,
    names: &HeaderNames,
    sheets: &SheetNames,
) -> ReportWorkbook {
    let full_list = build_sheet(
        &sheets.full_list,
        &FULL_LIST,
        merged.columns(),
        names,
        merged.records().iter().map(|r| {
            let cells = move |col: SheetColumn| match col {
                SheetColumn::Field(Field::Quantity) => Cell::Integer(r.quantity()),
                SheetColumn::Field(Field::UnitPrice) => {
                    Cell::Number(r.transaction().unit_price())
                }
                SheetColumn::Field(Field::TotalAmount) => {
                    Cell::Number(r.transaction().total_amount())
                }
                SheetColumn::Field(f) => Cell::text(Some(r.text(f))),
                SheetColumn::Blank | SheetColumn::Unit => Cell::Empty,
            };
            (cells, !r.is_matched())
        }),
    );

    let radio_sheet = summary_sheet(
        &sheets.radio_summary,
        &radio_columns(radio.key()),
        radio,
        names,
    );
    let electrical_sheet = summary_sheet(
        &sheets.electrical_summary,
        &electrical_columns(electrical.key()),
        electrical,
        names,
    );

    let customs_sheet = build_sheet(
        &sheets.customs,
        &CUSTOMS,
        customs.columns(),
        names,
        customs.rows().iter().map(|r| {
            let cells = move |col: SheetColumn| match col {
                SheetColumn::Field(Field::HsCode) => Cell::text(r.hs_code.as_deref()),
                SheetColumn::Field(Field::Origin) => Cell::text(Some(&r.origin)),
                SheetColumn::Field(Field::Quantity) => Cell::Integer(r.quantity),
                SheetColumn::Field(Field::UnitPrice) => Cell::Number(r.unit_price),
                SheetColumn::Field(Field::TotalAmount) => Cell::Number(r.total_amount),
                SheetColumn::Field(Field::MaterialCode) => Cell::text(Some(&r.material_code)),
                SheetColumn::Unit => Cell::Text(r.unit.to_string()),
                SheetColumn::Field(_) | SheetColumn::Blank => Cell::Empty,
            };
            (cells, false)
        }),
    );

    ReportWorkbook {
        sheets: vec![full_list, radio_sheet, electrical_sheet, customs_sheet],
    }
}

fn summary_sheet(
    name: &str,
    layout: &[SheetColumn],
    summary: &CertSummary,
    names: &HeaderNames,
) -> ReportSheet {
    build_sheet(
        name,
        layout,
        summary.columns(),
        names,
        summary.rows().iter().map(|r: &CertSummaryRow| {
            let cells = move |col: SheetColumn| match col {
                SheetColumn::Field(Field::ElectricalAuthority) => Cell::text(r.authority.as_deref()),
                SheetColumn::Field(Field::HsCode | Field::CustomsCode) => {
                    Cell::text(r.code.as_deref())
                }
                SheetColumn::Field(Field::Origin) => Cell::text(Some(&r.origin)),
                SheetColumn::Field(Field::ModelName) => Cell::text(r.model_name.as_deref()),
                SheetColumn::Field(Field::RadioCert | Field::ElectricalCert) => {
                    Cell::text(Some(&r.cert_number))
                }
                SheetColumn::Field(Field::RatedVoltage) => Cell::text(r.rated_voltage.as_deref()),
                SheetColumn::Field(Field::Quantity) => Cell::Integer(r.quantity),
                _ => Cell::Empty,
            };
            (cells, false)
        }),
    )
}

fn build_sheet<I, F>(
    name: &str,
    layout: &[SheetColumn],
    columns: &Columns,
    names: &HeaderNames,
    rows: I,
) -> ReportSheet
where
    I: Iterator<Item = (F, bool)>,
    F: Fn(SheetColumn) -> Cell,
{
    let present: Vec<SheetColumn> = layout
        .iter()
        .copied()
        .filter(|c| c.is_present(columns))
        .collect();
    ReportSheet {
        name: name.to_string(),
        headers: present.iter().map(|c| c.header(names)).collect(),
        rows: rows
            .map(|(cells, highlight)| ReportRow {
                cells: present.iter().map(|&c| cells(c)).collect(),
                highlight,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::merge;
    use crate::summary::{customs_projection, electrical_summary, radio_summary};
    use crate::test::{catalog, scenario_transactions};

    fn scenario_workbook() -> ReportWorkbook {
        let names = HeaderNames::default();
        let merged = merge(Some(&scenario_transactions()), &[], &catalog(), &names).unwrap();
        let key = KeyColumn::HsCode;
        export(
            &merged,
            &radio_summary(&merged, key).unwrap(),
            &electrical_summary(&merged, key).unwrap(),
            &customs_projection(&merged),
            &names,
            &SheetNames::default(),
        )
    }

    #[test]
    fn test_sheet_order_and_names() {
        let wb = scenario_workbook();
        let names: Vec<&str> = wb.sheets().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "Full list",
                "Radio cert summary",
                "Electrical cert summary",
                "Customs declaration"
            ]
        );
        for name in names {
            assert!(name.chars().count() <= 31);
        }
    }

    #[test]
    fn test_full_list_layout() {
        let wb = scenario_workbook();
        let full = wb.sheet("Full list").unwrap();
        assert_eq!(
            full.headers(),
            &[
                "자재코드",
                "HS코드",
                "모델규격",
                "모델명",
                "전파인증번호",
                "전기인증기관",
                "전기인증번호",
                "정격전압",
                "원산지",
                "수량",
                "단가",
                "총금액"
            ]
        );
        let rows = full.to_rows();
        assert_eq!(
            rows[1],
            vec!["A1", "8517", "SPEC-1", "M1", "R-001", "", "", "", "KR", "5", "10", "50"]
        );
        assert_eq!(
            rows[2],
            vec!["B2", "", "", "", "", "", "", "", "CN", "2", "20", "40"]
        );
        assert!(!full.rows()[0].highlight);
        assert!(full.rows()[1].highlight);
    }

    #[test]
    fn test_summary_and_customs_sheets() {
        let wb = scenario_workbook();
        let radio = wb.sheet("Radio cert summary").unwrap().to_rows();
        assert_eq!(radio[0], vec!["HS코드", "원산지", "모델명", "전파인증번호", "수량"]);
        assert_eq!(radio[1], vec!["8517", "KR", "M1", "R-001", "5"]);
        assert_eq!(radio.len(), 2);

        let elec = wb.sheet("Electrical cert summary").unwrap().to_rows();
        assert_eq!(elec.len(), 1);
        assert_eq!(elec[0].len(), 7);

        let customs = wb.sheet("Customs declaration").unwrap().to_rows();
        assert_eq!(
            customs[0],
            vec!["HS코드", "원산지", "", "수량", "단위", "단가", "총금액", "자재코드"]
        );
        assert_eq!(customs[1], vec!["8517", "KR", "", "5", "EA", "10", "50", "A1"]);
        assert_eq!(customs[2], vec!["", "CN", "", "2", "EA", "20", "40", "B2"]);
    }

    #[test]
    fn test_absent_columns_are_omitted() {
        let names = HeaderNames::default();
        let table = crate::model::Table::parse(vec![vec!["자재코드", "수량"], vec!["A1", "5"]])
            .unwrap();
        let txns = crate::model::Transactions::from_table(&table, &names).unwrap();
        let merged = merge(Some(&txns), &[], &catalog(), &names).unwrap();
        let key = KeyColumn::HsCode;
        let wb = export(
            &merged,
            &radio_summary(&merged, key).unwrap(),
            &electrical_summary(&merged, key).unwrap(),
            &customs_projection(&merged),
            &names,
            &SheetNames::default(),
        );
        let full = wb.sheet("Full list").unwrap();
        assert!(!full.headers().iter().any(|h| h == "원산지"));
        assert!(!full.headers().iter().any(|h| h == "단가"));
        let customs = wb.sheet("Customs declaration").unwrap();
        assert_eq!(
            customs.headers(),
            &["HS코드", "", "수량", "단위", "자재코드"]
        );
    }

    #[test]
    fn test_to_xlsx_produces_zip() {
        let bytes = scenario_workbook().to_xlsx().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_from_rows() {
        let wb = ReportWorkbook::from_rows(
            "Manual entries",
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["1".to_string(), String::new()],
            ],
        );
        let sheet = wb.sheet("Manual entries").unwrap();
        assert_eq!(sheet.headers(), &["a", "b"]);
        assert_eq!(sheet.rows()[0].cells, vec![Cell::Text("1".into()), Cell::Empty]);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(Decimal::new(1250, 2)).to_string(), "12.5");
        assert_eq!(Cell::Integer(7).to_string(), "7");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_exact_f64() {
        assert_eq!(Cell::Integer(5).exact_f64(), Some(5.0));
        assert_eq!(Cell::Number(Decimal::new(15, 1)).exact_f64(), Some(1.5));
        assert_eq!(Cell::Integer(u64::MAX).exact_f64(), None);
        let wide = Decimal::from_str_exact("12345678901234567.89").unwrap();
        assert_eq!(Cell::Number(wide).exact_f64(), None);
        assert_eq!(Cell::Text("5".into()).exact_f64(), None);
    }

    #[test]
    fn test_wide_numbers_survive_xlsx() {
        let names = HeaderNames::default();
        let table = crate::model::Table::parse(vec![
            vec!["자재코드", "수량", "단가", "총금액"],
            vec!["A1", "18446744073709551615", "12345678901234567.89", "1.5"],
        ])
        .unwrap();
        let txns = crate::model::Transactions::from_table(&table, &names).unwrap();
        let merged = merge(Some(&txns), &[], &catalog(), &names).unwrap();
        let wb = export(
            &merged,
            &radio_summary(&merged, KeyColumn::HsCode).unwrap(),
            &electrical_summary(&merged, KeyColumn::HsCode).unwrap(),
            &customs_projection(&merged),
            &names,
            &SheetNames::default(),
        );
        let bytes = wb.to_xlsx().unwrap();
        let full = wb.sheet("Full list").unwrap();
        let read = crate::source::read_xlsx_bytes(&bytes, Some(full.name())).unwrap();
        assert_eq!(read.rows(), &full.to_rows()[1..]);
        assert_eq!(read.get(0, "수량"), Some("18446744073709551615"));
        assert_eq!(read.get(0, "단가"), Some("12345678901234567.89"));
        assert_eq!(read.get(0, "총금액"), Some("1.5"));
    }
}
