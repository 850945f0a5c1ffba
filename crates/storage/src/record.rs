use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// How a column's cells are typed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// A named, typed column of a snapshot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    /// Value substituted for an empty text cell when loading a persisted snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_placeholder: Option<String>,
}

impl Column {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Text,
            empty_placeholder: None,
        }
    }

    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
            empty_placeholder: None,
        }
    }

    pub fn with_empty_placeholder(mut self, placeholder: &str) -> Self {
        self.empty_placeholder = Some(placeholder.to_string());
        self
    }

    /// Two columns are compatible when they share a name and a kind.
    pub fn is_compatible(&self, other: &Column) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

/// The expected layout of a persisted snapshot: the identifier column
/// followed by the typed value columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub key_column: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(key_column: &str, columns: Vec<Column>) -> Self {
        Self {
            key_column: key_column.to_string(),
            columns,
        }
    }

    /// Look up a value column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One typed table cell.
///
/// A missing numeric value is `Numeric(None)`; NaN never appears inside a
/// cell because [`Cell::number`] folds it into `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Numeric(Option<f64>),
    Text(String),
}

impl Cell {
    pub fn number(value: f64) -> Self {
        if value.is_nan() {
            Cell::Numeric(None)
        } else {
            Cell::Numeric(Some(value))
        }
    }

    pub fn missing() -> Self {
        Cell::Numeric(None)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Parse a persisted textual cell according to `column`.
    ///
    /// Unparsable numeric text coerces to missing, never to zero.
    pub fn parse(raw: &str, column: &Column) -> Self {
        match column.kind {
            ColumnKind::Numeric => match raw.trim().parse::<f64>() {
                Ok(v) => Cell::number(v),
                Err(_) => Cell::missing(),
            },
            ColumnKind::Text => match (&column.empty_placeholder, raw.is_empty()) {
                (Some(placeholder), true) => Cell::Text(placeholder.clone()),
                _ => Cell::Text(raw.to_string()),
            },
        }
    }

    /// Persisted textual form; missing numbers are written as an empty cell.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Numeric(Some(v)) => v.to_string(),
            Cell::Numeric(None) => String::new(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Numeric(Some(v)) => serializer.serialize_f64(*v),
            Cell::Numeric(None) => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Numeric(Some(v)) => write!(f, "{}", v),
            Cell::Numeric(None) => write!(f, "NaN"),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A point-in-time table keyed by identifier, holding exactly one row per
/// identifier in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    key_column: String,
    columns: Vec<Column>,
    rows: IndexMap<String, Vec<Cell>>,
}

impl Snapshot {
    /// An empty snapshot laid out per `schema`.
    pub fn new(schema: &TableSchema) -> Self {
        Self::with_columns(&schema.key_column, schema.columns.clone())
    }

    pub fn with_columns(key_column: &str, columns: Vec<Column>) -> Self {
        Self {
            key_column: key_column.to_string(),
            columns,
            rows: IndexMap::new(),
        }
    }

    /// Build a snapshot from rows whose identifiers are already unique.
    ///
    /// Fails if any row's width does not match `columns`.
    pub fn from_rows(
        key_column: &str,
        columns: Vec<Column>,
        rows: IndexMap<String, Vec<Cell>>,
    ) -> Result<Self, SnapshotError> {
        if let Some((id, cells)) = rows.iter().find(|(_, cells)| cells.len() != columns.len()) {
            return Err(SnapshotError::Arity {
                id: id.clone(),
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self {
            key_column: key_column.to_string(),
            columns,
            rows,
        })
    }

    /// Append a row. Identifiers must be unique.
    pub fn insert(&mut self, id: impl Into<String>, cells: Vec<Cell>) -> Result<(), SnapshotError> {
        let id = id.into();
        if cells.len() != self.columns.len() {
            return Err(SnapshotError::Arity {
                id,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        if self.rows.contains_key(&id) {
            return Err(SnapshotError::DuplicateIdentifier(id));
        }
        self.rows.insert(id, cells);
        Ok(())
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn row(&self, id: &str) -> Option<&[Cell]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    /// The named cell of one row.
    pub fn cell(&self, id: &str, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(id).and_then(|cells| cells.get(idx))
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.rows.iter().map(|(id, cells)| (id.as_str(), cells.as_slice()))
    }

    /// A new snapshot with the same columns holding only the rows whose
    /// identifier satisfies `keep`, in the original order.
    pub fn filter_ids<F>(&self, mut keep: F) -> Snapshot
    where
        F: FnMut(&str) -> bool,
    {
        Snapshot {
            key_column: self.key_column.clone(),
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(id, _)| keep(id))
                .map(|(id, cells)| (id.clone(), cells.clone()))
                .collect(),
        }
    }
}
