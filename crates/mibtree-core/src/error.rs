//! Error types for OID validation, provider registration and tree access.
//!
//! The tokenizer and compiler never fail; everything that can go wrong at
//! the tree level is a [`MibError`]. Each variant belongs to one of four
//! categories reported by [`MibError::kind`].

use core::fmt;

/// Result alias used throughout the crate.
pub type Result<T, E = MibError> = core::result::Result<T, E>;

/// Broad classification of a [`MibError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: bad OIDs, undecodable index values, mis-sized rows.
    Validation,
    /// Something named does not exist: provider, table, column, row, module.
    Reference,
    /// An operation was applied to the wrong kind of provider.
    Type,
    /// The operation would break the shape of the tree or the index.
    Structural,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Reference => "reference",
            Self::Type => "type",
            Self::Structural => "structural",
        };
        f.write_str(name)
    }
}

/// Kind of provider, used in type errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProviderKind {
    /// A single-instance value.
    Scalar,
    /// A conceptual table of rows.
    Table,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::Table => f.write_str("table"),
        }
    }
}

/// Errors raised by OID parsing, the provider registry and table access.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MibError {
    // -- validation --
    /// No components remained after dropping empty ones.
    #[error("object identifier is empty")]
    EmptyOid,
    /// Component is not a number at all.
    #[error("object identifier component `{0}` is malformed")]
    MalformedComponent(String),
    /// Component is a number but has a fractional part.
    #[error("object identifier component `{0}` is not an integer")]
    NonIntegerComponent(String),
    #[error("object identifier component `{0}` is negative")]
    NegativeComponent(String),
    #[error("object identifier component `{0}` exceeds 2147483647")]
    ComponentTooLarge(String),
    #[error("object identifier must begin with 0, 1 or 2, found {0}")]
    InvalidFirstComponent(i64),
    #[error("object identifier second component {0} exceeds 39")]
    InvalidSecondComponent(i64),
    /// An index entry names neither a column nor a column number.
    #[error("index entry {position} of table `{table}` has no column name or number")]
    IncompleteIndexEntry { table: String, position: usize },
    /// A row-key value cannot be turned into OID components.
    #[error("value for index column `{column}` cannot be encoded: {reason}")]
    InvalidIndexValue { column: String, reason: String },
    #[error("row for table `{table}` has {found} values, expected {expected}")]
    RowLengthMismatch {
        table: String,
        expected: usize,
        found: usize,
    },
    #[error("row key for table `{table}` has {found} values, expected {expected}")]
    RowKeyLengthMismatch {
        table: String,
        expected: usize,
        found: usize,
    },
    /// Instance components could not be decoded back into a row key.
    #[error("instance suffix `{suffix}` does not decode against the index of `{table}`")]
    MalformedInstanceSuffix { table: String, suffix: String },

    // -- reference --
    #[error("provider `{0}` is not registered")]
    UnknownProvider(String),
    #[error("module `{0}` has not been compiled")]
    UnknownModule(String),
    #[error("table `{table}` augments unregistered table `{base}`")]
    UnknownBaseTable { table: String, base: String },
    #[error("index column `{column}` of table `{table}` cannot be resolved")]
    UnresolvedIndexColumn { table: String, column: String },
    #[error("table `{table}` has no column {column}")]
    UnknownColumn { table: String, column: u32 },
    #[error("table `{table}` has no row at instance `{instance}`")]
    MissingRow { table: String, instance: String },
    #[error("scalar `{0}` has no value")]
    UnsetScalar(String),

    // -- type --
    #[error("provider `{name}` is a {found}, expected a {expected}")]
    WrongProviderKind {
        name: String,
        expected: ProviderKind,
        found: ProviderKind,
    },

    // -- structural --
    #[error("node `{0}` has children and cannot be removed")]
    NonLeafNode(String),
    #[error("the root node cannot be removed")]
    RootNode,
    #[error("table `{0}` cannot augment itself")]
    SelfAugment(String),
    #[error("index entry {position} of table `{table}` contradicts column `{column}`: {detail}")]
    IndexColumnMismatch {
        table: String,
        position: usize,
        column: String,
        detail: String,
    },
    #[error("provider `{0}` is already registered")]
    DuplicateProvider(String),
    #[error("node `{oid}` already carries provider `{provider}`")]
    OccupiedNode { oid: String, provider: String },
    /// A value would be written on an interior node or below a value node.
    #[error("node `{0}` cannot hold a value and children at the same time")]
    ValueNodeConflict(String),
}

impl MibError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyOid
            | Self::MalformedComponent(_)
            | Self::NonIntegerComponent(_)
            | Self::NegativeComponent(_)
            | Self::ComponentTooLarge(_)
            | Self::InvalidFirstComponent(_)
            | Self::InvalidSecondComponent(_)
            | Self::IncompleteIndexEntry { .. }
            | Self::InvalidIndexValue { .. }
            | Self::RowLengthMismatch { .. }
            | Self::RowKeyLengthMismatch { .. }
            | Self::MalformedInstanceSuffix { .. } => ErrorKind::Validation,
            Self::UnknownProvider(_)
            | Self::UnknownModule(_)
            | Self::UnknownBaseTable { .. }
            | Self::UnresolvedIndexColumn { .. }
            | Self::UnknownColumn { .. }
            | Self::MissingRow { .. }
            | Self::UnsetScalar(_) => ErrorKind::Reference,
            Self::WrongProviderKind { .. } => ErrorKind::Type,
            Self::NonLeafNode(_)
            | Self::RootNode
            | Self::SelfAugment(_)
            | Self::IndexColumnMismatch { .. }
            | Self::DuplicateProvider(_)
            | Self::OccupiedNode { .. }
            | Self::ValueNodeConflict(_) => ErrorKind::Structural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(MibError::EmptyOid.kind(), ErrorKind::Validation);
        assert_eq!(
            MibError::UnknownProvider("ifEntry".into()).kind(),
            ErrorKind::Reference
        );
        assert_eq!(
            MibError::WrongProviderKind {
                name: "sysDescr".into(),
                expected: ProviderKind::Table,
                found: ProviderKind::Scalar,
            }
            .kind(),
            ErrorKind::Type
        );
        assert_eq!(
            MibError::SelfAugment("ifXEntry".into()).kind(),
            ErrorKind::Structural
        );
    }

    #[test]
    fn test_display() {
        let err = MibError::WrongProviderKind {
            name: "sysDescr".into(),
            expected: ProviderKind::Table,
            found: ProviderKind::Scalar,
        };
        assert_eq!(
            err.to_string(),
            "provider `sysDescr` is a scalar, expected a table"
        );
        assert_eq!(
            MibError::InvalidSecondComponent(40).to_string(),
            "object identifier second component 40 exceeds 39"
        );
    }
}
