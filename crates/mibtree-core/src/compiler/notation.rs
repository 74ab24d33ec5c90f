//! Macro templates and the `TYPE NOTATION` / `VALUE NOTATION` clause rule.

use super::cursor::SymbolCursor;

/// One keyword of a notation clause.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NotationField {
    /// Keyword, quotes removed.
    pub keyword: String,
    /// Literal paired with the keyword. `None` for productions such as
    /// `ReferPart` that are supplied per instance.
    pub literal: Option<String>,
}

/// A compiled `MACRO` definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacroTemplate {
    name: String,
    type_notation: Vec<NotationField>,
    value_notation: Vec<NotationField>,
    productions: Vec<String>,
}

impl MacroTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Macro name, e.g. `OBJECT-TYPE`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_notation(&self) -> &[NotationField] {
        &self.type_notation
    }

    #[must_use]
    pub fn value_notation(&self) -> &[NotationField] {
        &self.value_notation
    }

    /// Names of the sub-productions assigned inside the macro body.
    #[must_use]
    pub fn productions(&self) -> &[String] {
        &self.productions
    }

    /// Keywords that introduce data fields in an invocation: `DESCRIPTION`
    /// plus every TYPE NOTATION keyword carrying a literal.
    #[must_use]
    pub fn keychain(&self) -> Vec<&str> {
        let mut keys = vec!["DESCRIPTION"];
        for field in self.type_notation.iter().filter(|f| f.literal.is_some()) {
            if !keys.contains(&field.keyword.as_str()) {
                keys.push(&field.keyword);
            }
        }
        keys
    }

    pub(crate) fn set_type_notation(&mut self, fields: Vec<NotationField>) {
        self.type_notation = fields;
    }

    pub(crate) fn set_value_notation(&mut self, fields: Vec<NotationField>) {
        self.value_notation = fields;
    }

    pub(crate) fn add_production(&mut self, name: &str) {
        self.productions.push(name.to_owned());
    }

    /// Set or replace a TYPE NOTATION keyword.
    pub(crate) fn define_type_field(&mut self, keyword: &str, literal: &str) {
        let literal = Some(literal.to_owned());
        match self.type_notation.iter_mut().find(|f| f.keyword == keyword) {
            Some(field) => field.literal = literal,
            None => self.type_notation.push(NotationField {
                keyword: keyword.to_owned(),
                literal,
            }),
        }
    }
}

/// Parse a notation clause starting right after its `::=`.
///
/// A quoted keyword takes the next token as its literal, or the token after
/// that when it is parenthesized. An unquoted token takes a following
/// parenthesized token, or nothing. The clause ends before the name of the
/// next production (the token preceding the next `::=`) or at `END`.
pub(crate) fn parse_notation(cursor: &SymbolCursor<'_>, start: usize) -> Vec<NotationField> {
    let mut fields: Vec<NotationField> = Vec::new();
    let mut r = start;

    while r < cursor.len() {
        let Some(symbol) = cursor.get(r) else { break };
        if symbol == "::=" || symbol == "END" {
            break;
        }
        match cursor.get(r + 1) {
            None | Some("::=") | Some("END") => break,
            Some(_) => {}
        }

        if symbol.starts_with('"') {
            let mut literal = cursor.get(r + 1);
            let mut taken = r + 1;
            if cursor.get(r + 2).is_some_and(|s| s.starts_with('(')) {
                literal = cursor.get(r + 2);
                taken = r + 2;
            }
            upsert(&mut fields, symbol.replace('"', ""), literal.map(str::to_owned));
            r = taken;
        } else {
            let mut literal = None;
            if let Some(next) = cursor.get(r + 1).filter(|s| s.starts_with('(')) {
                literal = Some(next.to_owned());
                r += 1;
            }
            upsert(&mut fields, symbol.to_owned(), literal);
        }
        r += 1;
    }

    fields
}

fn upsert(fields: &mut Vec<NotationField>, keyword: String, literal: Option<String>) {
    match fields.iter_mut().find(|f| f.keyword == keyword) {
        Some(field) => field.literal = literal,
        None => fields.push(NotationField { keyword, literal }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn notation(text: &str) -> Vec<NotationField> {
        let syms = tokenize("t", text).compile_sequence();
        let cursor = SymbolCursor::new(&syms);
        let start = syms.iter().position(|s| s == "::=").map_or(0, |p| p + 1);
        parse_notation(&cursor, start)
    }

    fn field(keyword: &str, literal: Option<&str>) -> NotationField {
        NotationField {
            keyword: keyword.into(),
            literal: literal.map(str::to_owned),
        }
    }

    #[test]
    fn test_quoted_and_bare_keywords() {
        let fields = notation(
            "TYPE NOTATION ::=\n  \"SYNTAX\" Syntax\n  UnitsPart\n  \"STATUS\" Status\n  ReferPart\nVALUE NOTATION ::= value(VALUE ObjectName)",
        );
        assert_eq!(
            fields,
            vec![
                field("SYNTAX", Some("Syntax")),
                field("UnitsPart", None),
                field("STATUS", Some("Status")),
                field("ReferPart", None),
            ]
        );
    }

    #[test]
    fn test_parenthesized_literal() {
        let fields = notation(
            "TYPE NOTATION ::= \"SYNTAX\" type (TYPE ObjectSyntax)\n \"ACCESS\" Access\nEND",
        );
        assert_eq!(
            fields,
            vec![
                field("SYNTAX", Some("(TYPE ObjectSyntax)")),
                field("ACCESS", Some("Access")),
            ]
        );
    }

    #[test]
    fn test_keychain() {
        let mut template = MacroTemplate::new("OBJECT-TYPE");
        template.set_type_notation(vec![
            field("SYNTAX", Some("Syntax")),
            field("ReferPart", None),
        ]);
        template.define_type_field("INDEX", "Index");
        assert_eq!(template.keychain(), vec!["DESCRIPTION", "SYNTAX", "INDEX"]);
    }
}
