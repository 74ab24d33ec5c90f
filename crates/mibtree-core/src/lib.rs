//! mibtree-core: MIB compiler and OID tree
//!
//! Turns SMIv1/SMIv2 MIB text into compiled module definitions, derives
//! scalar and table providers from them, and hosts those providers on an
//! in-memory OID tree that stores instance values.
//!
//! The pipeline is:
//!
//! 1. [`tokenizer`]: characters to positioned symbols, per source unit
//! 2. [`Compiler`]: symbols to [`ModuleSet`], driven by `MACRO` templates
//! 3. [`ModuleSet::derive_providers`]: objects to [`ProviderSpec`]s
//! 4. [`MibTree`]: provider registration and scalar/row data access
//!
//! The crate does no IO. Filesystem loading and cache files live in
//! `mibtree-std`.

pub mod compiler;
pub mod definition;
pub mod error;
mod lookup;
pub mod provider;
pub mod tokenizer;
pub mod tree;
pub mod types;
pub mod value;

pub use compiler::{Compiler, MacroTemplate, NotationField};
pub use definition::{FieldValue, IndexItem, ModuleDefinition, ModuleSet, ObjectDefinition};
pub use error::{ErrorKind, MibError, ProviderKind, Result};
pub use provider::{IndexEntry, ProviderSpec, ScalarProvider, TableColumn, TableProvider};
pub use tree::{CellOrder, MibNode, MibTree, NodeId, Oid, RowKey};
pub use types::{SyntaxTypes, ValueType};
pub use value::Value;
