//! Compiled module and object definitions.
//!
//! These are the compiler's output. Definitions are built once per compile
//! pass and are read-only afterwards; recompiling a module replaces its
//! [`ModuleDefinition`] wholesale.

use std::collections::BTreeMap;

/// Value captured for a macro-template field.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// Plain token or quoted string with the quotes removed.
    Text(String),
    /// Items of a brace-delimited clause such as `INDEX { a, b }`.
    List(Vec<String>),
    /// `INTEGER { up(1), down(2) }` or `BITS { ... }`.
    Enumeration {
        /// `INTEGER` or `BITS`.
        base: String,
        /// Numeric code to label.
        values: BTreeMap<i64, String>,
    },
}

impl FieldValue {
    /// Text content, if this is a [`FieldValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Items, if this is a [`FieldValue::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the type this value refers to when used as a SYNTAX.
    ///
    /// Enumerations report their base type. Lists have no type name.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Enumeration { base, .. } => Some(base),
            Self::List(_) => None,
        }
    }
}

/// One column reference from an `INDEX` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexItem {
    /// Column object name.
    pub column: String,
    /// `IMPLIED` keyword was present.
    pub implied: bool,
}

impl IndexItem {
    /// Parse one trimmed `INDEX` list item.
    ///
    /// The column is the last whitespace-separated token; a leading
    /// `IMPLIED` marks it implied.
    #[must_use]
    pub fn parse(item: &str) -> Option<Self> {
        let mut tokens = item.split_whitespace();
        let first = tokens.next()?;
        let column = tokens.last().unwrap_or(first);
        Some(Self {
            column: column.to_owned(),
            implied: first == "IMPLIED" && column != first,
        })
    }
}

/// A compiled object: `ifIndex OBJECT-TYPE ...`, `system OBJECT IDENTIFIER
/// ::= { mib-2 1 }`, a TEXTUAL-CONVENTION, or a plain type assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectDefinition {
    name: String,
    module: String,
    macro_name: Option<String>,
    oid_clause: Option<String>,
    oid: Option<String>,
    name_space: Option<String>,
    fields: BTreeMap<String, FieldValue>,
}

impl ObjectDefinition {
    /// Create an empty definition.
    #[must_use]
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            macro_name: None,
            oid_clause: None,
            oid: None,
            name_space: None,
            fields: BTreeMap::new(),
        }
    }

    /// Object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the defining module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Invoking macro (`OBJECT-TYPE`, `TEXTUAL-CONVENTION`, ...), or the
    /// token after `::=` for plain assignments.
    #[must_use]
    pub fn macro_name(&self) -> Option<&str> {
        self.macro_name.as_deref()
    }

    /// Raw contents of the `{ ... }` clause, braces removed.
    #[must_use]
    pub fn oid_clause(&self) -> Option<&str> {
        self.oid_clause.as_deref()
    }

    /// Resolved dotted-integer OID.
    #[must_use]
    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    /// Resolved dotted name path, e.g. `iso.org.dod.internet`.
    #[must_use]
    pub fn name_space(&self) -> Option<&str> {
        self.name_space.as_deref()
    }

    /// All captured macro fields.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn syntax(&self) -> Option<&FieldValue> {
        self.fields.get("SYNTAX")
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.fields.get("STATUS").and_then(FieldValue::as_text)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.fields.get("DESCRIPTION").and_then(FieldValue::as_text)
    }

    /// Parsed `INDEX` clause, empty if absent.
    #[must_use]
    pub fn index(&self) -> Vec<IndexItem> {
        match self.fields.get("INDEX") {
            Some(FieldValue::List(items)) => items.iter().filter_map(|i| IndexItem::parse(i)).collect(),
            Some(FieldValue::Text(item)) => IndexItem::parse(item).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Base entry named by `AUGMENTS`.
    #[must_use]
    pub fn augments(&self) -> Option<&str> {
        let base = match self.fields.get("AUGMENTS")? {
            FieldValue::List(items) => items.first()?,
            FieldValue::Text(text) => text,
            FieldValue::Enumeration { .. } => return None,
        };
        Some(base.trim()).filter(|b| !b.is_empty())
    }

    /// Parent identifier: the first token of the OID clause.
    #[must_use]
    pub fn clause_parent(&self) -> Option<&str> {
        self.oid_clause.as_deref()?.split_whitespace().next()
    }

    /// Sub-identifier following the parent in the OID clause.
    #[must_use]
    pub fn clause_arc(&self) -> Option<u32> {
        self.oid_clause
            .as_deref()?
            .split_whitespace()
            .nth(1)
            .and_then(|arc| arc.parse().ok())
    }

    pub(crate) fn set_macro_name(&mut self, macro_name: Option<String>) {
        self.macro_name = macro_name;
    }

    pub(crate) fn set_oid_clause(&mut self, clause: String) {
        self.oid_clause = Some(clause);
    }

    pub(crate) fn set_resolved(&mut self, oid: String, name_space: String) {
        self.oid = Some(oid);
        self.name_space = Some(name_space);
    }

    pub(crate) fn set_field(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }
}

/// All objects and imports of one module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleDefinition {
    name: String,
    imports: BTreeMap<String, Vec<String>>,
    objects: Vec<ObjectDefinition>,
    by_name: BTreeMap<String, usize>,
}

impl ModuleDefinition {
    /// Create an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Imported symbols keyed by source module.
    #[must_use]
    pub fn imports(&self) -> &BTreeMap<String, Vec<String>> {
        &self.imports
    }

    /// Objects in declaration order.
    #[must_use]
    pub fn objects(&self) -> &[ObjectDefinition] {
        &self.objects
    }

    /// Look up an object by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectDefinition> {
        self.by_name.get(name).map(|&i| &self.objects[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Insert an object. A redefinition replaces the earlier one in place.
    pub(crate) fn insert(&mut self, object: ObjectDefinition) {
        match self.by_name.get(object.name()) {
            Some(&i) => self.objects[i] = object,
            None => {
                self.by_name.insert(object.name().to_owned(), self.objects.len());
                self.objects.push(object);
            }
        }
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [ObjectDefinition] {
        &mut self.objects
    }

    pub(crate) fn set_imports(&mut self, from: String, symbols: Vec<String>) {
        self.imports.insert(from, symbols);
    }
}

/// Compiled modules in compile order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleSet {
    modules: Vec<ModuleDefinition>,
}

impl ModuleSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules, oldest first.
    #[must_use]
    pub fn modules(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    /// Look up a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.module(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Add a module as the most recent one, replacing any module of the
    /// same name.
    pub fn insert(&mut self, module: ModuleDefinition) {
        self.remove(module.name());
        self.modules.push(module);
    }

    /// Remove a module by name.
    pub fn remove(&mut self, name: &str) -> Option<ModuleDefinition> {
        let pos = self.modules.iter().position(|m| m.name == name)?;
        Some(self.modules.remove(pos))
    }

    /// Every object in compile order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.modules.iter().flat_map(|m| m.objects.iter())
    }
}
