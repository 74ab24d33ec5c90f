//! Scalar values and table rows.
//!
//! A scalar's value lives at `provider.0`. A table cell lives at
//! `entry.column.suffix`, where the suffix encodes the row key: one value
//! per index entry, foreign entries first, then the table's own entries,
//! each group in declaration order.
//!
//! | index type          | encoding                                        |
//! |---------------------|-------------------------------------------------|
//! | `OBJECT IDENTIFIER` | arc count, then the arcs                        |
//! | `OCTET STRING`      | character count, then one arc per character     |
//! | `IpAddress`         | four octets                                     |
//! | anything else       | the integer itself                              |
//!
//! The count is omitted for `IMPLIED` entries and for entries with a fixed
//! length.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::{MibNode, MibTree, Oid, MAX_COMPONENT};
use crate::error::{MibError, Result};
use crate::provider::{IndexEntry, TableProvider};
use crate::types::ValueType;
use crate::value::Value;

/// Index values identifying one row, in encoding order.
pub type RowKey = Vec<Value>;

/// Grouping for [`MibTree::get_all_cells`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellOrder {
    /// One inner list per column, rows in index order.
    ByColumn,
    /// One inner list per row, columns in declaration order.
    ByRow,
}

impl MibTree {
    /// Value of a scalar.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownProvider`], [`MibError::WrongProviderKind`] for a
    /// table, or [`MibError::UnsetScalar`] if no value has been set.
    pub fn get_scalar(&self, name: &str) -> Result<&Value> {
        let instance = self.scalar(name)?.oid.child(0)?;
        self.get(&instance)
            .and_then(MibNode::value)
            .ok_or_else(|| MibError::UnsetScalar(name.to_owned()))
    }

    /// Set a scalar's value, creating the instance node on first use.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownProvider`] or [`MibError::WrongProviderKind`].
    pub fn set_scalar(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let scalar = self.scalar(name)?;
        let instance = scalar.oid.child(0)?;
        let value = value.into();
        let value_type = scalar.scalar_type.unwrap_or_else(|| value.natural_type());
        self.check_value_slot(&instance)?;

        let id = self.materialize(&instance);
        if let Some(node) = self.node_mut(id) {
            node.set_value(value, value_type);
        }
        Ok(())
    }

    /// Remove a scalar's value, returning it.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownProvider`] or [`MibError::WrongProviderKind`].
    pub fn clear_scalar(&mut self, name: &str) -> Result<Option<Value>> {
        let instance = self.scalar(name)?.oid.child(0)?;
        let Some(id) = self.find(&instance) else {
            return Ok(None);
        };
        let value = self.node_mut(id).and_then(MibNode::take_value);
        self.prune(id);
        Ok(value)
    }

    /// Add (or overwrite) a row.
    ///
    /// `values` holds the foreign index values, in index order, followed by
    /// one value per declared column. Local index values are taken from
    /// their columns. Returns the row key.
    ///
    /// # Errors
    ///
    /// [`MibError::RowLengthMismatch`], index encoding errors, or
    /// [`MibError::ValueNodeConflict`] if a cell would land on an interior
    /// node or below another value. Nothing is written on error.
    pub fn add_row(&mut self, table: &str, values: Vec<Value>) -> Result<RowKey> {
        let spec = self.table(table)?;
        let foreign = spec.foreign_index().count();
        let expected = foreign + spec.columns.len();
        if values.len() != expected {
            return Err(MibError::RowLengthMismatch {
                table: table.to_owned(),
                expected,
                found: values.len(),
            });
        }

        let mut key: RowKey = values[..foreign].to_vec();
        for entry in spec.local_index() {
            let position = entry
                .column_number
                .and_then(|n| spec.column_position(n))
                .ok_or_else(|| MibError::UnresolvedIndexColumn {
                    table: table.to_owned(),
                    column: entry.label(),
                })?;
            key.push(values[foreign + position].clone());
        }
        let suffix = encode_key(spec, &key)?;

        let mut cells = Vec::with_capacity(spec.columns.len());
        for (column, value) in spec.columns.iter().zip(&values[foreign..]) {
            let address = spec.oid.child(column.number)?.extend(&suffix)?;
            self.check_value_slot(&address)?;
            let value_type = column.value_type.unwrap_or_else(|| value.natural_type());
            cells.push((address, value.clone(), value_type));
        }

        for (address, value, value_type) in cells {
            let id = self.materialize(&address);
            if let Some(node) = self.node_mut(id) {
                node.set_value(value, value_type);
            }
        }
        tracing::trace!(table, instance = %Oid::from_arcs(suffix), "added row");
        Ok(key)
    }

    /// Delete every cell of a row.
    ///
    /// # Errors
    ///
    /// [`MibError::MissingRow`] unless every column has a cell for the key;
    /// nothing is deleted in that case.
    pub fn delete_row(&mut self, table: &str, key: &[Value]) -> Result<()> {
        let spec = self.table(table)?;
        let suffix = encode_key(spec, key)?;
        let mut ids = Vec::with_capacity(spec.columns.len());
        for column in &spec.columns {
            let address = spec.oid.child(column.number)?.extend(&suffix)?;
            match self.find(&address) {
                Some(id) if self.node(id).is_some_and(|n| n.value().is_some()) => ids.push(id),
                _ => return Err(missing_row(table, &suffix)),
            }
        }

        for id in ids {
            if let Some(node) = self.node_mut(id) {
                node.take_value();
            }
            self.prune(id);
        }
        Ok(())
    }

    /// Value of one cell.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownColumn`] or [`MibError::MissingRow`].
    pub fn get_cell(&self, table: &str, column: u32, key: &[Value]) -> Result<&Value> {
        let (address, suffix) = self.cell_address(table, column, key)?;
        self.get(&address)
            .and_then(MibNode::value)
            .ok_or_else(|| missing_row(table, &suffix))
    }

    /// Replace the value of an existing cell, returning the old value.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownColumn`] or [`MibError::MissingRow`]; cells are
    /// only created by [`MibTree::add_row`].
    pub fn set_cell(
        &mut self,
        table: &str,
        column: u32,
        key: &[Value],
        value: impl Into<Value>,
    ) -> Result<Value> {
        let (address, suffix) = self.cell_address(table, column, key)?;
        self.find(&address)
            .and_then(|id| self.node_mut(id))
            .filter(|node| node.value().is_some())
            .and_then(|node| node.replace_value(value.into()))
            .ok_or_else(|| missing_row(table, &suffix))
    }

    /// All cell values of a row, in column order.
    ///
    /// # Errors
    ///
    /// [`MibError::MissingRow`] if any cell is absent.
    pub fn get_row(&self, table: &str, key: &[Value]) -> Result<Vec<Value>> {
        let spec = self.table(table)?;
        spec.columns
            .iter()
            .map(|column| self.get_cell(table, column.number, key).cloned())
            .collect()
    }

    /// Row keys and values of one column, in index order.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownColumn`], or a decode error for cells not written
    /// through this table's index.
    pub fn get_column(&self, table: &str, column: u32) -> Result<Vec<(RowKey, Value)>> {
        let prefix = self.table(table)?.oid.len() + 1;
        self.column_instances(table, column)?
            .into_iter()
            .filter_map(|node| node.value().map(|v| (node, v)))
            .map(|(node, value)| -> Result<(RowKey, Value)> {
                let key = self.row_key_from_suffix(table, &node.address().arcs()[prefix..])?;
                Ok((key, value.clone()))
            })
            .collect()
    }

    /// Every cell of a table, grouped by column or by row.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownProvider`] or [`MibError::WrongProviderKind`].
    pub fn get_all_cells(&self, table: &str, order: CellOrder) -> Result<Vec<Vec<Value>>> {
        let spec = self.table(table)?;
        let prefix = spec.oid.len() + 1;
        let mut columns = Vec::with_capacity(spec.columns.len());
        for column in &spec.columns {
            columns.push(self.column_instances(table, column.number)?);
        }

        match order {
            CellOrder::ByColumn => Ok(columns
                .into_iter()
                .map(|nodes| nodes.into_iter().filter_map(MibNode::value).cloned().collect())
                .collect()),
            CellOrder::ByRow => {
                let mut rows: BTreeMap<&[u32], Vec<Value>> = BTreeMap::new();
                for node in columns.into_iter().flatten() {
                    if let Some(value) = node.value() {
                        let suffix = &node.address().arcs()[prefix..];
                        rows.entry(suffix).or_default().push(value.clone());
                    }
                }
                Ok(rows.into_values().collect())
            }
        }
    }

    /// Value nodes below a column, in ascending address order.
    ///
    /// # Errors
    ///
    /// [`MibError::UnknownColumn`] if the table has no such column.
    pub fn column_instances(&self, table: &str, column: u32) -> Result<Vec<&MibNode>> {
        let spec = self.table(table)?;
        if spec.column(column).is_none() {
            return Err(MibError::UnknownColumn {
                table: table.to_owned(),
                column,
            });
        }
        let Some(id) = self.find(&spec.oid.child(column)?) else {
            return Ok(Vec::new());
        };
        Ok(self
            .preorder(id)
            .filter(|node| node.value().is_some())
            .collect())
    }

    /// Decode the instance components after `entry.column` back into a row
    /// key.
    ///
    /// # Errors
    ///
    /// [`MibError::MalformedInstanceSuffix`] if the components run out, are
    /// left over, or do not fit an index type.
    pub fn row_key_from_suffix(&self, table: &str, suffix: &[u32]) -> Result<RowKey> {
        let spec = self.table(table)?;
        let malformed = || MibError::MalformedInstanceSuffix {
            table: table.to_owned(),
            suffix: Oid::from_arcs(suffix.to_vec()).to_dotted(),
        };

        let mut rest = suffix;
        let mut key = RowKey::new();
        for entry in ordered_index(spec) {
            let (value, tail) = decode_value(entry, rest).ok_or_else(malformed)?;
            key.push(value);
            rest = tail;
        }
        if rest.is_empty() {
            Ok(key)
        } else {
            Err(malformed())
        }
    }

    /// Encode a row key into instance components.
    ///
    /// # Errors
    ///
    /// [`MibError::RowKeyLengthMismatch`] or [`MibError::InvalidIndexValue`].
    pub fn instance_suffix(&self, table: &str, key: &[Value]) -> Result<Vec<u32>> {
        encode_key(self.table(table)?, key)
    }

    fn cell_address(&self, table: &str, column: u32, key: &[Value]) -> Result<(Oid, Vec<u32>)> {
        let spec = self.table(table)?;
        if spec.column(column).is_none() {
            return Err(MibError::UnknownColumn {
                table: table.to_owned(),
                column,
            });
        }
        let suffix = encode_key(spec, key)?;
        let address = spec.oid.child(column)?.extend(&suffix)?;
        Ok((address, suffix))
    }
}

fn missing_row(table: &str, suffix: &[u32]) -> MibError {
    MibError::MissingRow {
        table: table.to_owned(),
        instance: Oid::from_arcs(suffix.to_vec()).to_dotted(),
    }
}

/// Foreign entries first, then local ones.
fn ordered_index(spec: &TableProvider) -> impl Iterator<Item = &IndexEntry> {
    spec.foreign_index().chain(spec.local_index())
}

fn encode_key(spec: &TableProvider, key: &[Value]) -> Result<Vec<u32>> {
    let expected = spec.index.len();
    if key.len() != expected {
        return Err(MibError::RowKeyLengthMismatch {
            table: spec.name.clone(),
            expected,
            found: key.len(),
        });
    }
    let mut suffix = Vec::new();
    for (entry, value) in ordered_index(spec).zip(key) {
        encode_value(entry, value, &mut suffix)?;
    }
    Ok(suffix)
}

fn encode_value(entry: &IndexEntry, value: &Value, out: &mut Vec<u32>) -> Result<()> {
    let invalid = |reason: &str| MibError::InvalidIndexValue {
        column: entry.label(),
        reason: reason.to_owned(),
    };

    match index_type(entry) {
        ValueType::ObjectIdentifier => {
            let oid = value.as_oid().ok_or_else(|| invalid("expected an object identifier"))?;
            push_sequence(entry, oid.arcs(), out).map_err(|reason| invalid(&reason))
        }
        ValueType::OctetString | ValueType::Opaque => {
            let text = value.as_str().ok_or_else(|| invalid("expected a string"))?;
            let codes: Vec<u32> = text.chars().map(u32::from).collect();
            push_sequence(entry, &codes, out).map_err(|reason| invalid(&reason))
        }
        ValueType::IpAddress => {
            let octets = match value {
                Value::IpAddress(octets) => *octets,
                Value::OctetString(text) => text
                    .parse::<Ipv4Addr>()
                    .map_err(|_| invalid("expected an IPv4 address"))?
                    .octets(),
                _ => return Err(invalid("expected an IPv4 address")),
            };
            out.extend(octets.iter().map(|&o| u32::from(o)));
            Ok(())
        }
        _ => {
            let n = value.as_i64().ok_or_else(|| invalid("expected an integer"))?;
            let arc = u32::try_from(n)
                .ok()
                .filter(|&a| a <= MAX_COMPONENT)
                .ok_or_else(|| invalid("integer index must be between 0 and 2147483647"))?;
            out.push(arc);
            Ok(())
        }
    }
}

fn push_sequence(entry: &IndexEntry, items: &[u32], out: &mut Vec<u32>) -> core::result::Result<(), String> {
    if let Some(length) = entry.length {
        if items.len() != length {
            return Err(format!("expected {length} components, found {}", items.len()));
        }
    }
    if entry.is_prefixed() {
        let count = u32::try_from(items.len()).map_err(|_| String::from("value is too long"))?;
        out.push(count);
    }
    out.extend_from_slice(items);
    Ok(())
}

/// Encoding type of an index entry. Untyped columns encode as integers.
fn index_type(entry: &IndexEntry) -> ValueType {
    entry.value_type.unwrap_or(ValueType::Integer)
}

/// Decode one index value from the front of `suffix`.
fn decode_value<'a>(entry: &IndexEntry, suffix: &'a [u32]) -> Option<(Value, &'a [u32])> {
    let value_type = index_type(entry);
    match value_type {
        ValueType::ObjectIdentifier | ValueType::OctetString | ValueType::Opaque => {
            let (items, rest) = take_sequence(entry, suffix)?;
            let value = if value_type == ValueType::ObjectIdentifier {
                Value::ObjectIdentifier(Oid::from_components(items.iter().map(|&a| i64::from(a))).ok()?)
            } else {
                Value::OctetString(items.iter().map(|&c| char::from_u32(c)).collect::<Option<String>>()?)
            };
            Some((value, rest))
        }
        ValueType::IpAddress => {
            let (octets, rest) = (suffix.get(..4)?, suffix.get(4..)?);
            let mut ip = [0u8; 4];
            for (slot, &arc) in ip.iter_mut().zip(octets) {
                *slot = u8::try_from(arc).ok()?;
            }
            Some((Value::IpAddress(ip), rest))
        }
        ValueType::Counter | ValueType::Gauge | ValueType::TimeTicks | ValueType::Counter64 => {
            let (&first, rest) = suffix.split_first()?;
            Some((Value::Unsigned(u64::from(first)), rest))
        }
        _ => {
            let (&first, rest) = suffix.split_first()?;
            Some((Value::Integer(i64::from(first)), rest))
        }
    }
}

fn take_sequence<'a>(entry: &IndexEntry, suffix: &'a [u32]) -> Option<(&'a [u32], &'a [u32])> {
    if entry.is_prefixed() {
        let (&count, rest) = suffix.split_first()?;
        let count = usize::try_from(count).ok()?;
        return Some((rest.get(..count)?, rest.get(count..)?));
    }
    match entry.length {
        Some(length) => Some((suffix.get(..length)?, suffix.get(length..)?)),
        None => Some((suffix, &[])),
    }
}
