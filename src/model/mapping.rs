use serde::de::Error as SerdeError;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The header row of a table, with a reverse index from header text to column position.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<Header>,
    header_map: HashMap<Header, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from a list of header strings. Headers are trimmed. Blank headers
    /// are allowed (spreadsheets often have unnamed trailing columns) but any other duplicate is
    /// an error.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<Header> = headers
            .into_iter()
            .map(|s| Header::from(s.into().trim()))
            .collect();

        let mut header_map = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if header.is_blank() {
                continue;
            }
            if header_map.insert(header.to_owned(), idx).is_some() {
                return Err(MappingError(format!(
                    "Encountered a duplicate header '{}'",
                    header.as_ref()
                )));
            }
        }

        Ok(Self {
            headers,
            header_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn header_index(&self, header: impl Into<Header>) -> Option<usize> {
        let h = header.into();
        self.header_map.get(&h).cloned()
    }

    pub fn contains(&self, header: &str) -> bool {
        self.header_index(header.trim()).is_some()
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.headers.len()))?;
        for header in &self.headers {
            seq.serialize_element(header.as_ref())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items: Vec<String> = Vec::deserialize(deserializer)?;
        let mapping = Mapping::new(items).map_err(D::Error::custom)?;
        Ok(mapping)
    }
}

/// Represents a header in a sheet, for example, `자재코드`
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(String);

impl Header {
    fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for Header {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl FromStr for Header {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

/// Tabular data as handed over by whatever read the spreadsheet: a header row and string cells.
///
/// Rows shorter than the header row are treated as having empty trailing cells. Rows in which
/// every cell is blank are dropped on construction.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Table {
    mapping: Mapping,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Given rows where the first row is the header row, build a `Table`.
    pub fn parse<S, R, I>(data: I) -> Result<Self, MappingError>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let mut rows = data.into_iter();
        let mapping = match rows.next() {
            Some(header_row) => Mapping::new(header_row)?,
            None => {
                return Err(MappingError(String::from(
                    "An empty data set has no header row",
                )))
            }
        };
        let width = mapping.len();

        let mut data = Vec::new();
        for (row_ix, row) in rows.enumerate() {
            let values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            if values.len() > width && values[width..].iter().any(|v| !v.trim().is_empty()) {
                return Err(MappingError(format!(
                    "A row longer than the headers list was encountered at row {}",
                    row_ix + 2
                )));
            }
            data.push(values);
        }

        Ok(Self {
            mapping,
            rows: data,
        })
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The value in row `row` under `header`, if both exist.
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.mapping.header_index(header.trim())?;
        self.rows
            .get(row)
            .map(|r| r.get(col).map(|s| s.as_str()).unwrap_or(""))
    }
}
