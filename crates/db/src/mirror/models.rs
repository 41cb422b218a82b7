use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crmsync_common::error::{CrmError, CrmResult};

/// Surrogate key column every target table carries.
pub const SURROGATE_COLUMN: &str = "id";
/// Load-order column every staging table carries.
pub const STAGED_SEQ_COLUMN: &str = "staged_seq";
/// Suffix appended to the target table name to form the staging table name.
pub const STAGING_SUFFIX: &str = "_staging";

const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Varchar(u16),
    Text,
    /// `numeric(15,2)` monetary amount.
    Amount,
    Timestamp,
}

impl ColumnKind {
    pub fn sql_type(&self) -> String {
        match self {
            ColumnKind::Varchar(len) => format!("varchar({len})"),
            ColumnKind::Text => "text".to_owned(),
            ColumnKind::Amount => "numeric(15,2)".to_owned(),
            ColumnKind::Timestamp => "timestamptz".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn varchar(name: &'static str, len: u16) -> Self {
        Self {
            name,
            kind: ColumnKind::Varchar(len),
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
        }
    }

    pub const fn amount(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Amount,
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Timestamp,
        }
    }
}

/// A single coerced field value headed for a staging row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Amount(Decimal),
    Timestamp(DateTime<Utc>),
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(CellValue::Null, CellValue::Text)
    }
}

impl From<Option<Decimal>> for CellValue {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(CellValue::Null, CellValue::Amount)
    }
}

impl From<Option<DateTime<Utc>>> for CellValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(CellValue::Null, CellValue::Timestamp)
    }
}

/// A typed record that can be mirrored into its own table.
///
/// `cells` must yield one value per entry of `COLUMNS`, in the same order.
pub trait MirrorRecord {
    const TABLE: &'static str;
    const KEY: ColumnSpec;
    const COLUMNS: &'static [ColumnSpec];

    fn natural_key(&self) -> Option<&str>;

    fn cells(&self) -> Vec<CellValue>;
}

/// Where and how a record type is mirrored: namespace schema, target table,
/// natural key and tracked columns. Every identifier is validated once here so
/// the SQL builders can quote without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    schema: String,
    table: &'static str,
    key: ColumnSpec,
    columns: &'static [ColumnSpec],
}

impl TableSpec {
    pub fn new(
        schema: &str,
        table: &'static str,
        key: ColumnSpec,
        columns: &'static [ColumnSpec],
    ) -> CrmResult<Self> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        validate_identifier(&format!("{table}{STAGING_SUFFIX}"))?;

        let mut seen = HashSet::new();
        for name in std::iter::once(key.name).chain(columns.iter().map(|c| c.name)) {
            validate_identifier(name)?;
            if name == SURROGATE_COLUMN || name == STAGED_SEQ_COLUMN {
                return Err(CrmError::Validation(format!(
                    "column name {name} is reserved"
                )));
            }
            if !seen.insert(name) {
                return Err(CrmError::Validation(format!(
                    "column {name} is declared twice on {table}"
                )));
            }
        }

        Ok(Self {
            schema: schema.to_owned(),
            table,
            key,
            columns,
        })
    }

    pub fn for_record<T: MirrorRecord>(schema: &str) -> CrmResult<Self> {
        Self::new(schema, T::TABLE, T::KEY, T::COLUMNS)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn key(&self) -> &ColumnSpec {
        &self.key
    }

    /// Tracked non-key columns.
    pub fn columns(&self) -> &'static [ColumnSpec] {
        self.columns
    }

    pub fn qualified_target(&self) -> String {
        format!("\"{}\".\"{}\"", self.schema, self.table)
    }

    pub fn qualified_staging(&self) -> String {
        format!("\"{}\".\"{}{}\"", self.schema, self.table, STAGING_SUFFIX)
    }
}

/// Accept lowercase Postgres identifiers that never need escaping.
pub fn validate_identifier(name: &str) -> CrmResult<()> {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !starts_ok || !rest_ok || name.len() > MAX_IDENTIFIER_LEN {
        return Err(CrmError::Validation(format!(
            "invalid identifier {name:?}: expected lowercase [a-z_][a-z0-9_]* up to {MAX_IDENTIFIER_LEN} bytes"
        )));
    }
    Ok(())
}

/// One staging row: the natural key followed by the tracked column values.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRow {
    pub key: String,
    pub cells: Vec<CellValue>,
}

/// The loadable part of a batch, in batch order. Records without a natural
/// key are dropped and counted.
#[derive(Debug, Clone, Default)]
pub struct StagingBatch {
    rows: Vec<StagedRow>,
    discarded: usize,
}

impl StagingBatch {
    pub fn from_records<T: MirrorRecord>(records: &[T]) -> Self {
        let mut rows = Vec::with_capacity(records.len());
        let mut discarded = 0;

        for record in records {
            let key = match record.natural_key().map(str::trim) {
                Some(k) if !k.is_empty() => k.to_owned(),
                _ => {
                    discarded += 1;
                    continue;
                }
            };

            let cells = record.cells();
            debug_assert_eq!(cells.len(), T::COLUMNS.len(), "cell count for {}", T::TABLE);
            rows.push(StagedRow { key, cells });
        }

        Self { rows, discarded }
    }

    pub fn rows(&self) -> &[StagedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn distinct_keys(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.key.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Counts from one successful mirror run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorOutcome {
    pub table: String,
    pub staged: u64,
    pub discarded: usize,
    pub upserted: u64,
    pub pruned: u64,
}

impl MirrorOutcome {
    /// Target rows inserted, changed or deleted.
    pub fn rows_affected(&self) -> u64 {
        self.upserted + self.pruned
    }
}
