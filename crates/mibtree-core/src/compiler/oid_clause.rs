//! OID clause parsing and resolution.
//!
//! A clause is the text between the braces of `::= { ... }`: a parent
//! identifier followed by sub-identifiers, each a bare number or a
//! `name(number)` pair (`name (number)` is accepted too). Resolution walks
//! parent clauses until a root arc (`iso`, `ccitt`, `joint-iso-ccitt`).

use std::collections::BTreeSet;

/// Clause text of `zeroDotZero`-style definitions.
pub(crate) const ZERO_DOT_ZERO: &str = "0 0";

#[derive(Clone, Debug, PartialEq, Eq)]
struct ClauseArc {
    label: Option<String>,
    number: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OidClause {
    parent: String,
    arcs: Vec<ClauseArc>,
}

impl OidClause {
    fn parse(clause: &str) -> Option<Self> {
        let mut tokens: Vec<String> = Vec::new();
        for token in clause.split_whitespace() {
            match tokens.last_mut() {
                Some(prev) if token.starts_with('(') => prev.push_str(token),
                _ => tokens.push(token.to_owned()),
            }
        }

        let mut tokens = tokens.into_iter();
        let parent = tokens.next()?;
        let parent = parent.split('(').next().unwrap_or_default().to_owned();
        let arcs = tokens.map(|t| parse_arc(&t)).collect::<Option<Vec<_>>>()?;
        Some(Self { parent, arcs })
    }
}

fn parse_arc(token: &str) -> Option<ClauseArc> {
    if let Ok(number) = token.parse() {
        return Some(ClauseArc { label: None, number });
    }
    let (label, rest) = token.split_once('(')?;
    let number = rest.strip_suffix(')')?.trim().parse().ok()?;
    Some(ClauseArc {
        label: Some(label.to_owned()).filter(|l| !l.is_empty()),
        number,
    })
}

/// Arc of a well-known root identifier.
fn root_arc(name: &str) -> Option<u32> {
    match name {
        "ccitt" => Some(0),
        "iso" => Some(1),
        "joint-iso-ccitt" => Some(2),
        _ => None,
    }
}

/// Resolve `clause` for the object `name` into (dotted OID, NameSpace).
///
/// `parent_clause` returns the clause of a named object. Each arc is
/// labelled with the object whose clause introduced it; middle `name(n)`
/// members label their own arcs. Returns `None` for unresolvable parents,
/// malformed clauses, and cycles.
pub(crate) fn resolve<F>(clause: &str, name: &str, parent_clause: F) -> Option<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut arcs: Vec<u32> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut visited = BTreeSet::new();
    let mut label = name.to_owned();
    let mut clause = clause.to_owned();

    loop {
        let parsed = OidClause::parse(&clause)?;
        let (last, middle) = parsed.arcs.split_last()?;
        arcs.push(last.number);
        labels.push(label);
        for arc in middle.iter().rev() {
            arcs.push(arc.number);
            labels.push(arc.label.clone().unwrap_or_else(|| arc.number.to_string()));
        }

        if let Some(root) = root_arc(&parsed.parent) {
            arcs.push(root);
            labels.push(parsed.parent);
            break;
        }
        if !visited.insert(parsed.parent.clone()) {
            return None;
        }
        clause = parent_clause(&parsed.parent)?;
        label = parsed.parent;
    }

    let oid = arcs
        .iter()
        .rev()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".");
    labels.reverse();
    Some((oid, labels.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn run(clause: &str, name: &str, clauses: &BTreeMap<String, String>) -> Option<(String, String)> {
        resolve(clause, name, |parent| clauses.get(parent).cloned())
    }

    #[test]
    fn test_parse_arcs() {
        let clause = OidClause::parse("iso org(3) dod (6) 1").unwrap();
        assert_eq!(clause.parent, "iso");
        assert_eq!(
            clause.arcs,
            vec![
                ClauseArc { label: Some("org".into()), number: 3 },
                ClauseArc { label: Some("dod".into()), number: 6 },
                ClauseArc { label: None, number: 1 },
            ]
        );
        assert!(OidClause::parse("iso org dod 1").is_none());
    }

    #[test]
    fn test_resolve_through_middle_members() {
        let clauses = table(&[]);
        assert_eq!(
            run("iso org(3) dod(6) 1", "internet", &clauses),
            Some(("1.3.6.1".into(), "iso.org.dod.internet".into()))
        );
    }

    #[test]
    fn test_resolve_chain() {
        let clauses = table(&[
            ("internet", "iso org(3) dod(6) 1"),
            ("mgmt", "internet 2"),
            ("mib-2", "mgmt 1"),
            ("system", "mib-2 1"),
        ]);
        assert_eq!(
            run("system 1", "sysDescr", &clauses),
            Some((
                "1.3.6.1.2.1.1.1".into(),
                "iso.org.dod.internet.mgmt.mib-2.system.sysDescr".into()
            ))
        );
    }

    #[test]
    fn test_middle_members_below_non_root_parent() {
        let clauses = table(&[("enterprises", "iso 3 6 1 4 1")]);
        assert_eq!(
            run("enterprises acme(9999) 1", "product", &clauses),
            Some((
                "1.3.6.1.4.1.9999.1".into(),
                "iso.3.6.1.4.enterprises.acme.product".into()
            ))
        );
    }

    #[test]
    fn test_other_roots() {
        let clauses = table(&[]);
        assert_eq!(
            run("joint-iso-ccitt 5", "x", &clauses).map(|r| r.0),
            Some("2.5".into())
        );
        assert_eq!(run("ccitt 0", "y", &clauses).map(|r| r.0), Some("0.0".into()));
    }

    #[test]
    fn test_unresolvable_and_cyclic() {
        let clauses = table(&[("a", "b 1"), ("b", "a 2")]);
        assert_eq!(run("missing 1", "x", &clauses), None);
        assert_eq!(run("a 5", "x", &clauses), None);
        assert_eq!(run("iso", "x", &clauses), None);
    }
}
