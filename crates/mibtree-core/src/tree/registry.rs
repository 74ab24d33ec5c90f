//! Provider registration.

use super::{MibTree, NodeId};
use crate::error::{MibError, ProviderKind, Result};
use crate::provider::{IndexEntry, ProviderSpec, ScalarProvider, TableColumn, TableProvider};

/// A provider attached to the tree.
#[derive(Clone, Debug)]
pub(super) struct Registered {
    pub(super) spec: ProviderSpec,
    pub(super) node: NodeId,
}

impl MibTree {
    /// Attach a provider at its OID.
    ///
    /// Table indices are resolved first: each entry is matched by name or
    /// number against the table's own columns, then against the columns of
    /// every other registered table in registration order (such matches are
    /// marked `foreign`). An `AUGMENTS` table takes the base table's resolved
    /// index instead, and a table with no index is indexed by column 1.
    /// Nothing is modified if resolution fails.
    ///
    /// # Errors
    ///
    /// - [`MibError::DuplicateProvider`] if the name is taken
    /// - [`MibError::OccupiedNode`] if another provider sits at the OID
    /// - index resolution errors: [`MibError::UnresolvedIndexColumn`],
    ///   [`MibError::IncompleteIndexEntry`], [`MibError::IndexColumnMismatch`],
    ///   [`MibError::SelfAugment`], [`MibError::UnknownBaseTable`]
    pub fn register_provider(&mut self, spec: impl Into<ProviderSpec>) -> Result<NodeId> {
        let spec = match spec.into() {
            ProviderSpec::Table(table) => {
                let index = self.resolve_index(&table)?;
                ProviderSpec::Table(TableProvider { index, ..table })
            }
            scalar @ ProviderSpec::Scalar(_) => scalar,
        };
        let name = spec.name().to_owned();
        if self.providers.contains_key(&name) {
            return Err(MibError::DuplicateProvider(name));
        }
        if let Some(node) = self.get(spec.oid()) {
            if let Some(provider) = node.provider() {
                return Err(MibError::OccupiedNode {
                    oid: node.oid(),
                    provider: provider.to_owned(),
                });
            }
        }
        self.check_value_slot(spec.oid())?;
        if self.get(spec.oid()).is_some_and(|n| n.value().is_some()) {
            return Err(MibError::ValueNodeConflict(spec.oid().to_dotted()));
        }

        let node = self.materialize(spec.oid());
        if let Some(n) = self.node_mut(node) {
            n.set_provider(Some(name.clone()));
        }
        tracing::debug!(
            provider = %name,
            kind = %spec.kind(),
            oid = %spec.oid(),
            "registered provider"
        );
        self.providers.insert(name.clone(), Registered { spec, node });
        self.order.push(name);
        Ok(node)
    }

    /// Register several providers in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first error from [`MibTree::register_provider`]; providers
    /// before it stay registered.
    pub fn register_providers<I>(&mut self, specs: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ProviderSpec>,
    {
        for spec in specs {
            self.register_provider(spec)?;
        }
        Ok(())
    }

    /// Detach a provider and prune its now-empty branch.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownProvider`], or [`MibError::NonLeafNode`] while
    /// values (scalar instance, table rows) remain below it.
    pub fn unregister_provider(&mut self, name: &str) -> Result<ProviderSpec> {
        let node = self
            .providers
            .get(name)
            .map(|r| r.node)
            .ok_or_else(|| MibError::UnknownProvider(name.to_owned()))?;
        if let Some(n) = self.node(node).filter(|n| !n.is_leaf()) {
            return Err(MibError::NonLeafNode(n.oid()));
        }

        if let Some(n) = self.node_mut(node) {
            n.set_provider(None);
        }
        self.prune(node);
        self.order.retain(|n| n != name);
        let registered = self
            .providers
            .remove(name)
            .ok_or_else(|| MibError::UnknownProvider(name.to_owned()))?;
        tracing::debug!(provider = name, "unregistered provider");
        Ok(registered.spec)
    }

    /// A registered provider by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderSpec> {
        self.providers.get(name).map(|r| &r.spec)
    }

    /// Node a provider is attached to.
    #[must_use]
    pub fn provider_node(&self, name: &str) -> Option<NodeId> {
        self.providers.get(name).map(|r| r.node)
    }

    /// Registered providers in registration order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.order.iter().filter_map(|name| self.provider(name))
    }

    pub(crate) fn scalar(&self, name: &str) -> Result<&ScalarProvider> {
        match self.provider(name) {
            Some(ProviderSpec::Scalar(scalar)) => Ok(scalar),
            Some(spec) => Err(MibError::WrongProviderKind {
                name: name.to_owned(),
                expected: ProviderKind::Scalar,
                found: spec.kind(),
            }),
            None => Err(MibError::UnknownProvider(name.to_owned())),
        }
    }

    pub(crate) fn table(&self, name: &str) -> Result<&TableProvider> {
        match self.provider(name) {
            Some(ProviderSpec::Table(table)) => Ok(table),
            Some(spec) => Err(MibError::WrongProviderKind {
                name: name.to_owned(),
                expected: ProviderKind::Table,
                found: spec.kind(),
            }),
            None => Err(MibError::UnknownProvider(name.to_owned())),
        }
    }

    fn resolve_index(&self, table: &TableProvider) -> Result<Vec<IndexEntry>> {
        if let Some(base) = &table.augments {
            if *base == table.name {
                return Err(MibError::SelfAugment(table.name.clone()));
            }
            let base_table = match self.provider(base) {
                Some(ProviderSpec::Table(t)) => t,
                Some(_) | None => {
                    return Err(MibError::UnknownBaseTable {
                        table: table.name.clone(),
                        base: base.clone(),
                    })
                }
            };
            return Ok(base_table
                .index
                .iter()
                .map(|entry| IndexEntry {
                    foreign: Some(entry.foreign.clone().unwrap_or_else(|| base.clone())),
                    ..entry.clone()
                })
                .collect());
        }

        if table.index.is_empty() {
            return self.resolve_index(&TableProvider {
                index: vec![IndexEntry::by_number(1)],
                ..table.clone()
            });
        }

        table
            .index
            .iter()
            .enumerate()
            .map(|(position, entry)| self.resolve_entry(table, position, entry))
            .collect()
    }

    fn resolve_entry(
        &self,
        table: &TableProvider,
        position: usize,
        entry: &IndexEntry,
    ) -> Result<IndexEntry> {
        if entry.column_name.is_none() && entry.column_number.is_none() {
            return Err(MibError::IncompleteIndexEntry {
                table: table.name.clone(),
                position,
            });
        }

        let found = match entry.foreign.as_deref() {
            Some(owner) if owner != table.name => {
                let owner_table = self.table(owner)?;
                match_column(table, position, entry, &owner_table.columns)?
                    .map(|column| (column, Some(owner.to_owned())))
            }
            _ => match match_column(table, position, entry, &table.columns)? {
                Some(column) => Some((column, None)),
                None => self.match_foreign(table, position, entry)?,
            },
        };

        let Some((column, foreign)) = found else {
            return Err(MibError::UnresolvedIndexColumn {
                table: table.name.clone(),
                column: entry.label(),
            });
        };
        Ok(IndexEntry {
            column_name: Some(column.name.clone()),
            column_number: Some(column.number),
            value_type: column.value_type,
            implied: entry.implied,
            length: entry.length,
            foreign,
        })
    }

    /// Search the other registered tables in registration order.
    fn match_foreign<'a>(
        &'a self,
        table: &TableProvider,
        position: usize,
        entry: &IndexEntry,
    ) -> Result<Option<(&'a TableColumn, Option<String>)>> {
        for other in self.providers().filter_map(ProviderSpec::as_table) {
            if other.name == table.name {
                continue;
            }
            if let Some(column) = match_column(table, position, entry, &other.columns)? {
                return Ok(Some((column, Some(other.name.clone()))));
            }
        }
        Ok(None)
    }
}

/// Column matching an index entry: by name when it has one (checking the
/// number agrees), else by number.
fn match_column<'a>(
    table: &TableProvider,
    position: usize,
    entry: &IndexEntry,
    columns: &'a [TableColumn],
) -> Result<Option<&'a TableColumn>> {
    let Some(name) = entry.column_name.as_deref() else {
        return Ok(columns.iter().find(|c| Some(c.number) == entry.column_number));
    };
    let Some(column) = columns.iter().find(|c| c.name == name) else {
        return Ok(None);
    };
    match entry.column_number {
        Some(number) if number != column.number => Err(MibError::IndexColumnMismatch {
            table: table.name.clone(),
            position,
            column: name.to_owned(),
            detail: format!("column is number {}, entry says {number}", column.number),
        }),
        _ => Ok(Some(column)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tree::Oid;
    use crate::types::ValueType;
    use pretty_assertions::assert_eq;

    fn oid(text: &str) -> Oid {
        Oid::parse(text).unwrap()
    }

    fn if_table() -> TableProvider {
        TableProvider::new("ifEntry", oid("1.3.6.1.2.1.2.2.1"))
            .with_column(1, "ifIndex", Some(ValueType::Integer))
            .with_column(2, "ifDescr", Some(ValueType::OctetString))
            .with_index("ifIndex")
    }

    #[test]
    fn test_resolve_by_name_and_number() {
        let mut tree = MibTree::new();
        tree.register_provider(if_table()).unwrap();
        tree.register_provider(
            TableProvider::new("numEntry", oid("1.3.6.1.4.1.1.1"))
                .with_column(1, "numIndex", Some(ValueType::Gauge))
                .with_index(1_u32),
        )
        .unwrap();

        let by_name = &tree.provider("ifEntry").unwrap().as_table().unwrap().index[0];
        let by_number = &tree.provider("numEntry").unwrap().as_table().unwrap().index[0];
        assert_eq!(by_name.column_number, Some(1));
        assert_eq!(by_name.value_type, Some(ValueType::Integer));
        assert_eq!(by_number.column_name.as_deref(), Some("numIndex"));
        assert_eq!(by_number.foreign, None);
    }

    #[test]
    fn test_index_type_comes_from_column() {
        let mut tree = MibTree::new();
        let by_name = IndexEntry {
            value_type: Some(ValueType::OctetString),
            ..IndexEntry::by_name("ifIndex")
        };
        let by_number = IndexEntry {
            value_type: Some(ValueType::OctetString),
            ..IndexEntry::by_number(1)
        };
        tree.register_provider(
            TableProvider::new("ifEntry", oid("1.3.6.1.2.1.2.2.1"))
                .with_column(1, "ifIndex", Some(ValueType::Integer))
                .with_index(by_name),
        )
        .unwrap();
        tree.register_provider(
            TableProvider::new("numEntry", oid("1.3.6.1.4.1.1.1"))
                .with_column(1, "numIndex", None)
                .with_index(by_number),
        )
        .unwrap();

        let index_type = |table: &str| {
            tree.provider(table).and_then(ProviderSpec::as_table).map(|t| t.index[0].value_type)
        };
        assert_eq!(index_type("ifEntry"), Some(Some(ValueType::Integer)));
        assert_eq!(index_type("numEntry"), Some(None));
    }

    #[test]
    fn test_empty_index_defaults_to_first_column() {
        let mut tree = MibTree::new();
        let mut table = if_table();
        table.index.clear();
        tree.register_provider(table).unwrap();
        let index = &tree.provider("ifEntry").unwrap().as_table().unwrap().index;
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].column_name.as_deref(), Some("ifIndex"));
    }

    #[test]
    fn test_foreign_column_found_in_other_table() {
        let mut tree = MibTree::new();
        tree.register_provider(if_table()).unwrap();
        tree.register_provider(
            TableProvider::new("ipEntry", oid("1.3.6.1.4.1.2.1"))
                .with_column(1, "ipAddr", Some(ValueType::IpAddress))
                .with_index("ifIndex")
                .with_index("ipAddr"),
        )
        .unwrap();
        let index = &tree.provider("ipEntry").unwrap().as_table().unwrap().index;
        assert_eq!(index[0].foreign.as_deref(), Some("ifEntry"));
        assert_eq!(index[1].foreign, None);
    }

    #[test]
    fn test_index_errors() {
        let mut tree = MibTree::new();
        let err = tree
            .register_provider(if_table().with_index("nope"))
            .unwrap_err();
        assert_eq!(
            err,
            MibError::UnresolvedIndexColumn {
                table: "ifEntry".into(),
                column: "nope".into()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Reference);

        let mut mismatched = if_table();
        mismatched.index[0].column_number = Some(2);
        let err = tree.register_provider(mismatched).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        let err = tree
            .register_provider(if_table().with_index(IndexEntry::default()))
            .unwrap_err();
        assert_eq!(
            err,
            MibError::IncompleteIndexEntry {
                table: "ifEntry".into(),
                position: 1
            }
        );
        assert_eq!(tree.providers().count(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_augments() {
        let mut tree = MibTree::new();
        let x = TableProvider::new("ifXEntry", oid("1.3.6.1.2.1.31.1.1.1"))
            .with_column(1, "ifName", Some(ValueType::OctetString))
            .augmenting("ifEntry");
        assert_eq!(
            tree.register_provider(x.clone()).unwrap_err(),
            MibError::UnknownBaseTable {
                table: "ifXEntry".into(),
                base: "ifEntry".into()
            }
        );
        tree.register_provider(if_table()).unwrap();
        tree.register_provider(x).unwrap();
        let index = &tree.provider("ifXEntry").unwrap().as_table().unwrap().index;
        assert_eq!(index[0].column_name.as_deref(), Some("ifIndex"));
        assert_eq!(index[0].foreign.as_deref(), Some("ifEntry"));

        let own = TableProvider::new("selfEntry", oid("1.3.6.1.4.1.3.1")).augmenting("selfEntry");
        assert_eq!(
            tree.register_provider(own).unwrap_err(),
            MibError::SelfAugment("selfEntry".into())
        );
    }

    #[test]
    fn test_duplicate_and_occupied() {
        let mut tree = MibTree::new();
        tree.register_provider(if_table()).unwrap();
        assert_eq!(
            tree.register_provider(if_table()).unwrap_err(),
            MibError::DuplicateProvider("ifEntry".into())
        );
        let clash = ScalarProvider::new("other", oid("1.3.6.1.2.1.2.2.1"), None);
        assert_eq!(
            tree.register_provider(clash).unwrap_err(),
            MibError::OccupiedNode {
                oid: "1.3.6.1.2.1.2.2.1".into(),
                provider: "ifEntry".into()
            }
        );
    }

    #[test]
    fn test_unregister_prunes() {
        let mut tree = MibTree::new();
        tree.register_provider(ScalarProvider::new("a", oid("1.3.6.1.4.1.9.1"), None))
            .unwrap();
        tree.register_provider(ScalarProvider::new("b", oid("1.3.6.1.4.1.9.2"), None))
            .unwrap();
        let names: Vec<_> = tree.providers().map(ProviderSpec::name).collect();
        assert_eq!(names, vec!["a", "b"]);

        tree.unregister_provider("a").unwrap();
        assert!(tree.find(&oid("1.3.6.1.4.1.9.1")).is_none());
        assert!(tree.find(&oid("1.3.6.1.4.1.9")).is_some());
        tree.unregister_provider("b").unwrap();
        assert!(tree.is_empty());
        assert_eq!(
            tree.unregister_provider("b").unwrap_err(),
            MibError::UnknownProvider("b".into())
        );
    }
}
