//! Provider specifications.
//!
//! A provider is the unit a data layer attaches to the OID tree: either a
//! scalar, with a single instance at `oid.0`, or a conceptual table, whose
//! cells live at `oid.column.index...`. Specs are plain data. They come from
//! [`ModuleSet::derive_providers`](crate::ModuleSet::derive_providers) or
//! are built by hand, and only become live when registered with a
//! [`MibTree`](crate::MibTree).

mod derive;

use crate::error::ProviderKind;
use crate::tree::Oid;
use crate::types::ValueType;

/// A single-instance object.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarProvider {
    pub name: String,
    pub oid: Oid,
    pub scalar_type: Option<ValueType>,
}

impl ScalarProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, oid: Oid, scalar_type: Option<ValueType>) -> Self {
        Self {
            name: name.into(),
            oid,
            scalar_type,
        }
    }
}

/// A column of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableColumn {
    /// Sub-identifier below the entry OID.
    pub number: u32,
    pub name: String,
    pub value_type: Option<ValueType>,
}

/// One component of a table index.
///
/// Before registration an entry may name only the column or only its
/// number. Registration fills in the rest, plus `foreign` when the column
/// belongs to another table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexEntry {
    pub column_name: Option<String>,
    pub column_number: Option<u32>,
    pub value_type: Option<ValueType>,
    /// Variable-length value encoded without its length prefix.
    pub implied: bool,
    /// Fixed length of a string or OID value; also suppresses the prefix.
    pub length: Option<usize>,
    /// Table that owns the column, if not this one.
    pub foreign: Option<String>,
}

impl IndexEntry {
    /// Index on a column by name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            column_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Index on a column by number.
    #[must_use]
    pub fn by_number(number: u32) -> Self {
        Self {
            column_number: Some(number),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn implied(mut self) -> Self {
        self.implied = true;
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Look the column up in `table` instead of searching.
    #[must_use]
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.foreign = Some(table.into());
        self
    }

    /// Label for error messages.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.column_name, self.column_number) {
            (Some(name), _) => name.clone(),
            (None, Some(number)) => number.to_string(),
            (None, None) => String::from("?"),
        }
    }

    /// Whether the encoded value carries a length prefix.
    #[must_use]
    pub fn is_prefixed(&self) -> bool {
        !self.implied && self.length.is_none()
    }
}

impl From<u32> for IndexEntry {
    fn from(number: u32) -> Self {
        Self::by_number(number)
    }
}

impl From<&str> for IndexEntry {
    fn from(name: &str) -> Self {
        Self::by_name(name)
    }
}

impl From<String> for IndexEntry {
    fn from(name: String) -> Self {
        Self::by_name(name)
    }
}

/// A conceptual table, addressed by its entry OID.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableProvider {
    /// Entry (row) object name; the provider name.
    pub name: String,
    /// Table object name, when derived from a module.
    pub table_name: Option<String>,
    /// Entry OID.
    pub oid: Oid,
    pub columns: Vec<TableColumn>,
    pub index: Vec<IndexEntry>,
    /// Entry this table augments; its index is inherited at registration.
    pub augments: Option<String>,
}

impl TableProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            oid,
            columns: Vec::new(),
            index: Vec::new(),
            augments: None,
        }
    }

    #[must_use]
    pub fn with_column(
        mut self,
        number: u32,
        name: impl Into<String>,
        value_type: Option<ValueType>,
    ) -> Self {
        self.columns.push(TableColumn {
            number,
            name: name.into(),
            value_type,
        });
        self
    }

    #[must_use]
    pub fn with_index(mut self, entry: impl Into<IndexEntry>) -> Self {
        self.index.push(entry.into());
        self
    }

    #[must_use]
    pub fn augmenting(mut self, base: impl Into<String>) -> Self {
        self.augments = Some(base.into());
        self
    }

    #[must_use]
    pub fn column(&self, number: u32) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.number == number)
    }

    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column in declaration order.
    #[must_use]
    pub fn column_position(&self, number: u32) -> Option<usize> {
        self.columns.iter().position(|c| c.number == number)
    }

    /// Index entries owned by other tables, in declaration order.
    pub fn foreign_index(&self) -> impl Iterator<Item = &IndexEntry> {
        self.index.iter().filter(|e| e.foreign.is_some())
    }

    /// Index entries on this table's own columns, in declaration order.
    pub fn local_index(&self) -> impl Iterator<Item = &IndexEntry> {
        self.index.iter().filter(|e| e.foreign.is_none())
    }
}

/// A scalar or table provider.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProviderSpec {
    Scalar(ScalarProvider),
    Table(TableProvider),
}

impl ProviderSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Table(t) => &t.name,
        }
    }

    /// Attachment OID.
    #[must_use]
    pub fn oid(&self) -> &Oid {
        match self {
            Self::Scalar(s) => &s.oid,
            Self::Table(t) => &t.oid,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Scalar(_) => ProviderKind::Scalar,
            Self::Table(_) => ProviderKind::Table,
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarProvider> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Table(_) => None,
        }
    }

    #[must_use]
    pub fn as_table(&self) -> Option<&TableProvider> {
        match self {
            Self::Table(t) => Some(t),
            Self::Scalar(_) => None,
        }
    }
}

impl From<ScalarProvider> for ProviderSpec {
    fn from(spec: ScalarProvider) -> Self {
        Self::Scalar(spec)
    }
}

impl From<TableProvider> for ProviderSpec {
    fn from(spec: TableProvider) -> Self {
        Self::Table(spec)
    }
}
