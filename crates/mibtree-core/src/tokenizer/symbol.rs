//! Symbols and per-unit symbol tables.

/// A trimmed token with its source position.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol {
    text: String,
    row: u32,
    column: u32,
}

impl Symbol {
    /// Create a symbol at a 0-based row and column.
    #[must_use]
    pub fn new(text: impl Into<String>, row: u32, column: u32) -> Self {
        Self {
            text: text.into(),
            row,
            column,
        }
    }

    /// Token text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source line (0-based).
    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Source column of the first character (0-based).
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Line comments are kept in the table but never compiled.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.text.starts_with("--")
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

/// Ordered symbols of one source unit, grouped by source row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolTable {
    unit: String,
    declared_name: Option<String>,
    rows: Vec<Vec<Symbol>>,
}

impl SymbolTable {
    /// Create an empty table for the named unit.
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            declared_name: None,
            rows: Vec::new(),
        }
    }

    /// Name the caller gave the source unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Module name from `<Name> DEFINITIONS`, if the unit declared one.
    #[must_use]
    pub fn declared_name(&self) -> Option<&str> {
        self.declared_name.as_deref()
    }

    /// Declared module name, falling back to the unit name.
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.declared_name.as_deref().unwrap_or(&self.unit)
    }

    /// Rows that produced at least one symbol, in source order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Symbol>] {
        &self.rows
    }

    /// All symbols in order, comments included.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.rows.iter().flatten()
    }

    /// Flattened symbol texts with comments removed.
    #[must_use]
    pub fn compile_sequence(&self) -> Vec<String> {
        self.symbols()
            .filter(|s| !s.is_comment())
            .map(|s| s.text.clone())
            .collect()
    }

    /// Total number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn set_declared_name(&mut self, name: String) {
        self.declared_name = Some(name);
    }

    pub(crate) fn push(&mut self, symbol: Symbol) {
        match self.rows.last_mut() {
            Some(row) if row.first().is_some_and(|s| s.row == symbol.row) => row.push(symbol),
            _ => self.rows.push(vec![symbol]),
        }
    }

    /// Last symbol stored for `row`, if that row is the current one.
    pub(crate) fn last_in_row(&self, row: u32) -> Option<&Symbol> {
        self.rows
            .last()
            .and_then(|r| r.last())
            .filter(|s| s.row == row)
    }

    pub(crate) fn last_in_row_mut(&mut self, row: u32) -> Option<&mut Symbol> {
        self.rows
            .last_mut()
            .and_then(|r| r.last_mut())
            .filter(|s| s.row == row)
    }
}
