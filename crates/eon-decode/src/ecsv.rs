//! Enhanced CSV (ECSV) decoding.
//!
//! An ECSV file is a delimited table preceded by `# `-prefixed metadata
//! lines. The first metadata line is `%ECSV <version>`; the rest form a YAML
//! mapping which must declare the column `datatype` list and may override the
//! `delimiter` (a single space by default) and carry free-form `meta`.
//!
//! See <https://github.com/astropy/astropy-APEs/blob/main/APE6.rst>.

use std::collections::{BTreeMap, HashMap, HashSet};

use eon_common::{EonResult, FormatError};
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::compressed::decode_utf8;
use crate::dsv::parse_dsv;
use crate::group::GroupKey;
use crate::table::{DecodedTable, Row};
use crate::{Decoder, RawAsset};

/// Default primary key column of focal-plane summaries.
pub const DEFAULT_INDEX_COLUMN: &str = "LOCATION";

/// One entry of the header's `datatype` list.
///
/// Entries are read leniently: scalar attributes of any type are kept as
/// text and unknown attributes are ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnSpec {
    fn from_value(value: &Value) -> Option<Self> {
        let Value::Mapping(entry) = value else {
            return None;
        };
        let field = |name: &str| entry.get(name).and_then(scalar_to_string);
        Some(Self {
            name: field("name").unwrap_or_default(),
            datatype: field("datatype"),
            subtype: field("subtype"),
            unit: field("unit"),
            format: field("format"),
            description: field("description"),
        })
    }
}

fn parse_columns(value: &Value) -> Vec<ColumnSpec> {
    let Value::Sequence(entries) = value else {
        warn!("ECSV datatype is not a list, no columns declared");
        return Vec::new();
    };
    let columns: Vec<ColumnSpec> = entries.iter().filter_map(ColumnSpec::from_value).collect();
    if columns.len() != entries.len() {
        warn!(
            skipped = entries.len() - columns.len(),
            "Skipped ECSV datatype entries that are not mappings"
        );
    }
    columns
}

/// Validated ECSV header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcsvHeader {
    pub datatype: Vec<ColumnSpec>,
    pub delimiter: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Any other top-level header fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EcsvHeader {
    /// Parse and validate the YAML header text.
    pub fn parse(yaml: &str) -> EonResult<Self> {
        let value: Value = if yaml.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(yaml).map_err(|e| FormatError::MalformedMetadata(e.to_string()))?
        };

        let mapping = match value {
            Value::Null => return Err(FormatError::MissingDatatype.into()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(FormatError::MalformedMetadata("header is not a mapping".into()).into())
            }
        };

        let mut datatype = None;
        let mut delimiter = ' ';
        let mut meta = None;
        let mut schema = None;
        let mut extra = BTreeMap::new();

        for (key, value) in mapping {
            let Value::String(key) = key else {
                continue;
            };
            match key.as_str() {
                "datatype" if !value.is_null() => datatype = Some(parse_columns(&value)),
                "delimiter" => delimiter = parse_delimiter(&value)?,
                "meta" => meta = Some(value),
                "schema" => schema = value.as_str().map(str::to_string),
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        Ok(Self {
            datatype: datatype.ok_or(FormatError::MissingDatatype)?,
            delimiter,
            meta,
            schema,
            extra,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.datatype.iter().find(|c| c.name == name)
    }
}

fn parse_delimiter(value: &Value) -> EonResult<char> {
    let text = value
        .as_str()
        .ok_or_else(|| FormatError::MalformedMetadata("delimiter must be a string".into()))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FormatError::MalformedMetadata(format!(
            "delimiter must be a single character, got {:?}",
            text
        ))
        .into()),
    }
}

/// A decoded ECSV document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScientificTable {
    pub version: f64,
    /// Raw header text (every metadata line after `%ECSV`)
    pub comments: String,
    #[serde(flatten)]
    pub header: EcsvHeader,
    pub rows: DecodedTable,
    #[serde(skip)]
    index: RowIndex,
}

impl ScientificTable {
    /// Row whose index column equals `key`.
    pub fn lookup(&self, key: &GroupKey) -> Option<&Row> {
        self.index
            .positions
            .get(key)
            .map(|&i| &self.rows.rows()[i])
    }

    /// Column used for [`ScientificTable::lookup`].
    pub fn index_column(&self) -> &str {
        &self.index.column
    }

    /// Number of indexed rows.
    pub fn index_len(&self) -> usize {
        self.index.positions.len()
    }

    /// Typed view of the summary metadata, if the header has `meta`.
    pub fn summary_meta(&self) -> Option<SummaryMeta> {
        self.header.meta.as_ref().map(SummaryMeta::from_meta)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct RowIndex {
    column: String,
    positions: HashMap<GroupKey, usize>,
}

impl RowIndex {
    fn build(rows: &DecodedTable, column: &str) -> EonResult<Self> {
        let mut positions = HashMap::with_capacity(rows.len());
        if !rows.has_column(column) {
            warn!(column = %column, "Index column missing from table, index left empty");
            return Ok(Self {
                column: column.to_string(),
                positions,
            });
        }
        for (i, row) in rows.rows().iter().enumerate() {
            let key = row.get(column).map(GroupKey::from).unwrap_or(GroupKey::Null);
            if positions.insert(key.clone(), i).is_some() {
                return Err(FormatError::DuplicateKey {
                    column: column.to_string(),
                    key: key.to_string(),
                }
                .into());
            }
        }
        Ok(Self {
            column: column.to_string(),
            positions,
        })
    }
}

/// Version number following `%ECSV`: 0 when absent, NaN when unreadable.
fn parse_version(rest: &str) -> f64 {
    let rest = rest.trim();
    if rest.is_empty() {
        warn!("ECSV marker carries no version");
        return 0.0;
    }
    rest.parse().unwrap_or_else(|_| {
        warn!(version = rest, "Unreadable ECSV version");
        f64::NAN
    })
}

/// Parse ECSV text, indexing rows by `index_column`.
pub fn parse_ecsv(text: &str, index_column: &str) -> EonResult<ScientificTable> {
    let lines: Vec<&str> = text.lines().collect();

    let mut comments = lines.iter().filter_map(|line| line.strip_prefix("# "));
    let first = comments.next().ok_or(FormatError::MissingFormatHeader)?;
    let marker = first.trim();
    let Some(rest) = marker.strip_prefix("%ECSV") else {
        return Err(FormatError::MissingFormatHeader.into());
    };
    let version = parse_version(rest);
    let comments = comments.collect::<Vec<_>>().join("\n");

    let header = EcsvHeader::parse(&comments)?;

    let body = lines
        .iter()
        .filter(|line| !line.starts_with('#'))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    let rows = parse_dsv(&body, header.delimiter);

    let declared: HashSet<&str> = header.datatype.iter().map(|c| c.name.as_str()).collect();
    let present: HashSet<&str> = rows.columns().iter().map(String::as_str).collect();
    if declared != present {
        warn!(
            declared = declared.len(),
            present = present.len(),
            "ECSV datatype does not match data columns"
        );
    }

    let index = RowIndex::build(&rows, index_column)?;
    debug!(version = version, rows = rows.len(), "Parsed ECSV table");

    Ok(ScientificTable {
        version,
        comments,
        header,
        rows,
        index,
    })
}

/// Enhanced CSV decoder producing a [`ScientificTable`].
#[derive(Debug, Clone)]
pub struct ScientificTableDecoder {
    index_column: String,
}

impl ScientificTableDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index rows by a different primary key column.
    pub fn with_index_column(column: impl Into<String>) -> Self {
        Self {
            index_column: column.into(),
        }
    }
}

impl Default for ScientificTableDecoder {
    fn default() -> Self {
        Self {
            index_column: DEFAULT_INDEX_COLUMN.to_string(),
        }
    }
}

impl Decoder for ScientificTableDecoder {
    type Output = ScientificTable;

    fn decode(&self, asset: &RawAsset) -> EonResult<ScientificTable> {
        let text = decode_utf8(&asset.body)?;
        parse_ecsv(&text, &self.index_column)
    }
}

/// Night summary facts carried in the summary's `meta` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryMeta {
    pub setup_id: Option<String>,
    pub setup_time: Option<String>,
    pub park_id: Option<String>,
    pub park_time: Option<String>,
    pub index_name: Option<String>,
    pub snapshot: Option<String>,
}

impl SummaryMeta {
    /// Extract known keys from a plain mapping or an ordered `!!omap` list.
    pub fn from_meta(meta: &Value) -> Self {
        let field = |key: &str| meta_lookup(meta, key).and_then(scalar_to_string);
        Self {
            setup_id: field("setup_id"),
            setup_time: field("setup_time"),
            park_id: field("park_id"),
            park_time: field("park_time"),
            index_name: field("index_name"),
            snapshot: field("snapshot"),
        }
    }
}

fn meta_lookup<'a>(meta: &'a Value, key: &str) -> Option<&'a Value> {
    match meta {
        Value::Mapping(mapping) => mapping.get(key),
        Value::Tagged(tagged) => meta_lookup(&tagged.value, key),
        Value::Sequence(items) => items.iter().find_map(|item| meta_lookup(item, key)),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}
