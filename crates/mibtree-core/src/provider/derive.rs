//! Provider derivation from compiled modules.

use super::{IndexEntry, ProviderSpec, ScalarProvider, TableColumn, TableProvider};
use crate::definition::{FieldValue, ModuleSet, ObjectDefinition};
use crate::error::{MibError, Result};
use crate::tree::Oid;
use crate::types::SyntaxTypes;

impl ModuleSet {
    /// Derive scalar and table providers for every `OBJECT-TYPE` in a
    /// module.
    ///
    /// Objects are scanned in declaration order. A `SEQUENCE OF` syntax
    /// opens a table: the object whose clause parent is the table is its
    /// entry, and objects whose parent is the entry are its columns. The
    /// first unrelated object closes the table. Remaining `OBJECT-TYPE`s are
    /// scalars. Scalars come first in the result, then tables.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownModule`] if the module has not been compiled.
    pub fn derive_providers(&self, module: &str) -> Result<Vec<ProviderSpec>> {
        let definition = self
            .module(module)
            .ok_or_else(|| MibError::UnknownModule(module.to_owned()))?;
        let types = SyntaxTypes::from_modules(self);

        let mut scalars = Vec::new();
        let mut tables = Vec::new();
        let mut scan: Option<TableScan<'_>> = None;
        let objects = definition.objects();
        let mut i = 0;

        while let Some(obj) = objects.get(i) {
            if let Some(open) = scan.as_mut() {
                if open.accept(obj, &types) {
                    i += 1;
                    continue;
                }
                // Close the table and look at this object again.
                tables.extend(scan.take().and_then(TableScan::finish));
                continue;
            }

            match obj.syntax() {
                Some(FieldValue::Text(syntax)) if syntax.starts_with("SEQUENCE OF") => {
                    scan = Some(TableScan::new(obj.name()));
                }
                Some(syntax) if obj.macro_name() == Some("OBJECT-TYPE") => {
                    if let Some(oid) = object_oid(obj) {
                        scalars.push(ProviderSpec::Scalar(ScalarProvider::new(
                            obj.name(),
                            oid,
                            types.of(syntax),
                        )));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        tables.extend(scan.and_then(TableScan::finish));

        tracing::debug!(
            module,
            scalars = scalars.len(),
            tables = tables.len(),
            "derived providers"
        );
        scalars.extend(tables);
        Ok(scalars)
    }
}

/// Resolved OID of an object, or `None` with a warning.
fn object_oid(obj: &ObjectDefinition) -> Option<Oid> {
    let Some(dotted) = obj.oid() else {
        tracing::warn!(
            module = obj.module(),
            object = obj.name(),
            "skipping provider without a resolved OID"
        );
        return None;
    };
    match Oid::parse(dotted) {
        Ok(oid) => Some(oid),
        Err(err) => {
            tracing::warn!(
                module = obj.module(),
                object = obj.name(),
                oid = dotted,
                error = %err,
                "skipping provider with an invalid OID"
            );
            None
        }
    }
}

/// An open table while its entry and columns are collected.
struct TableScan<'a> {
    table_name: &'a str,
    entry: Option<&'a ObjectDefinition>,
    columns: Vec<TableColumn>,
}

impl<'a> TableScan<'a> {
    fn new(table_name: &'a str) -> Self {
        Self {
            table_name,
            entry: None,
            columns: Vec::new(),
        }
    }

    /// Take `obj` into the table. Returns `false` if it ends the table.
    fn accept(&mut self, obj: &'a ObjectDefinition, types: &SyntaxTypes) -> bool {
        let Some(parent) = obj.clause_parent() else {
            // Row SEQUENCE types and other clause-less assignments.
            return true;
        };
        if obj.macro_name() == Some("SEQUENCE") {
            return true;
        }
        if parent == self.table_name {
            self.entry = Some(obj);
            return true;
        }
        match self.entry {
            Some(entry) if parent == entry.name() => {
                if let Some(number) = obj.clause_arc() {
                    self.columns.push(TableColumn {
                        number,
                        name: obj.name().to_owned(),
                        value_type: obj.syntax().and_then(|s| types.of(s)),
                    });
                }
                true
            }
            _ => false,
        }
    }

    fn finish(self) -> Option<ProviderSpec> {
        let Some(entry) = self.entry else {
            tracing::warn!(table = self.table_name, "table has no entry object");
            return None;
        };
        let oid = object_oid(entry)?;

        let augments = entry.augments().map(str::to_owned);
        let index = if augments.is_some() {
            Vec::new()
        } else {
            let items = entry.index();
            if items.is_empty() {
                vec![IndexEntry::by_number(1)]
            } else {
                items
                    .into_iter()
                    .map(|item| IndexEntry {
                        implied: item.implied,
                        ..IndexEntry::by_name(item.column)
                    })
                    .collect()
            }
        };

        Some(ProviderSpec::Table(TableProvider {
            name: entry.name().to_owned(),
            table_name: Some(self.table_name.to_owned()),
            oid,
            columns: self.columns,
            index,
            augments,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ModuleDefinition;
    use crate::types::ValueType;
    use pretty_assertions::assert_eq;

    fn object(name: &str, macro_name: &str, clause: &str, oid: &str) -> ObjectDefinition {
        let mut obj = ObjectDefinition::new(name, "T");
        obj.set_macro_name(Some(macro_name.to_owned()));
        obj.set_oid_clause(clause.to_owned());
        obj.set_resolved(oid.to_owned(), name.to_owned());
        obj
    }

    fn with_syntax(mut obj: ObjectDefinition, syntax: &str) -> ObjectDefinition {
        obj.set_field("SYNTAX", FieldValue::Text(syntax.to_owned()));
        obj
    }

    fn module() -> ModuleSet {
        let mut m = ModuleDefinition::new("T");
        m.insert(object("root", "OBJECT IDENTIFIER", "iso 9", "1.9"));
        m.insert(with_syntax(object("count", "OBJECT-TYPE", "root 1", "1.9.1"), "Counter32"));
        m.insert(with_syntax(
            object("fooTable", "OBJECT-TYPE", "root 2", "1.9.2"),
            "SEQUENCE OF FooEntry",
        ));
        let mut entry = with_syntax(object("fooEntry", "OBJECT-TYPE", "fooTable 1", "1.9.2.1"), "FooEntry");
        entry.set_field("INDEX", FieldValue::List(vec!["fooIndex".into(), "IMPLIED fooName".into()]));
        m.insert(entry);
        let mut row_type = ObjectDefinition::new("FooEntry", "T");
        row_type.set_macro_name(Some("SEQUENCE".into()));
        m.insert(row_type);
        m.insert(with_syntax(object("fooIndex", "OBJECT-TYPE", "fooEntry 1", "1.9.2.1.1"), "Integer32"));
        m.insert(with_syntax(object("fooName", "OBJECT-TYPE", "fooEntry 2", "1.9.2.1.2"), "DisplayString"));
        m.insert(with_syntax(object("after", "OBJECT-TYPE", "root 3", "1.9.3"), "IpAddress"));
        let mut unresolved = ObjectDefinition::new("lost", "T");
        unresolved.set_macro_name(Some("OBJECT-TYPE".into()));
        unresolved.set_field("SYNTAX", FieldValue::Text("INTEGER".into()));
        m.insert(unresolved);

        let mut set = ModuleSet::new();
        set.insert(m);
        set
    }

    #[test]
    fn test_scalars_then_tables() {
        let providers = module().derive_providers("T").unwrap();
        let names: Vec<_> = providers.iter().map(ProviderSpec::name).collect();
        assert_eq!(names, vec!["count", "after", "fooEntry"]);

        let count = providers[0].as_scalar().unwrap();
        assert_eq!(count.scalar_type, Some(ValueType::Counter));
        assert_eq!(count.oid.to_string(), "1.9.1");
    }

    #[test]
    fn test_table_shape() {
        let providers = module().derive_providers("T").unwrap();
        let table = providers[2].as_table().unwrap();
        assert_eq!(table.table_name.as_deref(), Some("fooTable"));
        assert_eq!(table.oid.to_string(), "1.9.2.1");
        assert_eq!(
            table.columns,
            vec![
                TableColumn {
                    number: 1,
                    name: "fooIndex".into(),
                    value_type: Some(ValueType::Integer),
                },
                TableColumn {
                    number: 2,
                    name: "fooName".into(),
                    value_type: Some(ValueType::OctetString),
                },
            ]
        );
        assert_eq!(
            table.index,
            vec![IndexEntry::by_name("fooIndex"), IndexEntry::by_name("fooName").implied()]
        );
    }

    #[test]
    fn test_table_closed_at_module_end() {
        let mut m = ModuleDefinition::new("E");
        m.insert(with_syntax(object("barTable", "OBJECT-TYPE", "root 1", "1.9.1"), "SEQUENCE OF BarEntry"));
        m.insert(object("barEntry", "OBJECT-TYPE", "barTable 1", "1.9.1.1"));
        m.insert(with_syntax(object("barValue", "OBJECT-TYPE", "barEntry 3", "1.9.1.1.3"), "Gauge32"));
        let mut set = ModuleSet::new();
        set.insert(m);

        let providers = set.derive_providers("E").unwrap();
        assert_eq!(providers.len(), 1);
        let table = providers[0].as_table().unwrap();
        assert_eq!(table.index, vec![IndexEntry::by_number(1)]);
        assert_eq!(table.columns[0].number, 3);
    }

    #[test]
    fn test_unknown_module() {
        assert_eq!(
            ModuleSet::new().derive_providers("NOPE"),
            Err(MibError::UnknownModule("NOPE".into()))
        );
    }
}
