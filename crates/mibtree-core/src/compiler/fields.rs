//! Field capture for macro invocations.

use std::collections::BTreeMap;

use super::cursor::SymbolCursor;
use crate::definition::{FieldValue, ObjectDefinition};

/// Capture every keychain field between `start` and `end` (exclusive).
///
/// `start` is the position after the macro name and `end` the position of
/// `::=`. A value is the symbol after its keyword with quotes removed, or a
/// brace list gathered up to the symbol containing `}`.
pub(crate) fn scan_fields(
    cursor: &SymbolCursor<'_>,
    start: usize,
    end: usize,
    keychain: &[&str],
    object: &mut ObjectDefinition,
) {
    let mut c = start;
    while c < end {
        let Some(key) = cursor.get(c).filter(|k| keychain.contains(k)) else {
            c += 1;
            continue;
        };
        if c + 1 >= end {
            break;
        }

        let (value, last) = if key == "SYNTAX" {
            syntax_value(cursor, c + 1, end)
        } else {
            plain_value(cursor, c + 1, end)
        };
        tracing::trace!(object = object.name(), key, "captured field");
        object.set_field(key, value);
        c = last + 1;
    }
}

/// Value of a SYNTAX clause whose first token is at `pos`.
///
/// Returns the value and the position of the last symbol consumed.
pub(crate) fn syntax_value(cursor: &SymbolCursor<'_>, pos: usize, end: usize) -> (FieldValue, usize) {
    let Some(raw) = cursor.get(pos).map(|s| s.replace('"', "")) else {
        return (FieldValue::Text(String::new()), pos);
    };

    let braced = cursor.get(pos + 1).is_some_and(|s| s.starts_with('{'));
    if braced && (raw == "INTEGER" || raw == "BITS") {
        let (values, last) = parse_enumeration(cursor, pos, end);
        return (FieldValue::Enumeration { base: raw, values }, last);
    }
    if raw == "SEQUENCE OF" {
        return match cursor.get(pos + 1).filter(|_| pos + 1 < end) {
            Some(entry) => (FieldValue::Text(format!("SEQUENCE OF {entry}")), pos + 1),
            None => (FieldValue::Text(raw), pos),
        };
    }
    plain_value(cursor, pos, end)
}

fn plain_value(cursor: &SymbolCursor<'_>, pos: usize, end: usize) -> (FieldValue, usize) {
    let raw = cursor.get(pos).map(|s| s.replace('"', "")).unwrap_or_default();
    if !raw.starts_with('{') {
        return (FieldValue::Text(raw), pos);
    }

    let mut joined = raw;
    let mut c = pos;
    while !cursor.get(c).is_some_and(|s| s.contains('}')) && c + 1 < end {
        c += 1;
        if let Some(s) = cursor.get(c) {
            joined.push_str(s);
        }
    }
    let inner = joined.replacen('{', "", 1).replacen('}', "", 1);
    let items = inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect();
    (FieldValue::List(items), c)
}

/// Expand `INTEGER { a(1), b (2) }` starting at the `INTEGER` symbol.
///
/// Handles both `label(n)` symbols and `label` followed by `(n)`.
fn parse_enumeration(cursor: &SymbolCursor<'_>, pos: usize, end: usize) -> (BTreeMap<i64, String>, usize) {
    let mut values = BTreeMap::new();
    let mut c = pos;
    while !cursor.get(c).is_some_and(|s| s.contains('}')) && c + 1 < end {
        c += 1;
        let Some(symbol) = cursor.get(c) else { break };
        let label = match symbol.find('(') {
            Some(0) if symbol.len() > 1 => c.checked_sub(1).and_then(|p| cursor.get(p)),
            Some(_) => symbol.split('(').next(),
            None => None,
        };
        let (Some(label), Some(code)) = (label, paren_content(symbol)) else {
            continue;
        };
        let label = label.trim();
        let label = label.strip_prefix('{').map_or(label, str::trim);
        if let Ok(code) = code.trim().parse::<i64>() {
            values.insert(code, label.to_owned());
        }
    }
    (values, c)
}

/// Contents of the first non-empty `( ... )` group.
fn paren_content(symbol: &str) -> Option<&str> {
    let open = symbol.find('(')?;
    let rest = &symbol[open + 1..];
    let close = rest.find(')')?;
    Some(&rest[..close]).filter(|s| !s.is_empty())
}
