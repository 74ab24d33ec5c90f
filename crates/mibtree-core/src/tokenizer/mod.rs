//! Character-level MIB tokenizer.
//!
//! The tokenizer is a state machine over characters rather than a grammar
//! lexer. It tracks whether it is inside a line comment, a quoted string,
//! an OID clause (`::= { ... }`), a brace list, and how deeply `{[(` and
//! `(` alone are nested. Those flags decide whether whitespace and
//! delimiters end the pending symbol or become part of it, which is how
//! `{ system 1 }`, `INDEX { ifIndex }` and `(SIZE (0..255))` come out as
//! single symbols while `SEQUENCE { ... }` bodies are split per token.
//!
//! A few keyword pairs are merged as they are stored (`OBJECT IDENTIFIER`,
//! `OCTET STRING`, `SEQUENCE OF`, `TYPE NOTATION`, `VALUE NOTATION`), and
//! the symbol before `DEFINITIONS` becomes the declared module name.
//!
//! Tokenizing never fails. Unterminated strings and comments simply run to
//! the end of input.
//!
//! # Example
//!
//! ```
//! use mibtree_core::tokenizer::tokenize;
//!
//! let table = tokenize("unit", "foo OBJECT IDENTIFIER ::= { bar 1 }");
//! assert_eq!(
//!     table.compile_sequence(),
//!     vec!["foo", "OBJECT IDENTIFIER", "::=", "{ bar 1 }"]
//! );
//! ```

mod symbol;

pub use symbol::{Symbol, SymbolTable};

/// Tokenize a whole unit at once.
#[must_use]
pub fn tokenize(unit: &str, text: &str) -> SymbolTable {
    let mut tokenizer = Tokenizer::new(unit);
    tokenizer.feed(text);
    tokenizer.finish()
}

/// Streaming tokenizer for a single source unit.
///
/// Text may be fed in arbitrary chunks; state carries over between calls.
#[derive(Debug)]
pub struct Tokenizer {
    table: SymbolTable,
    builder: String,
    /// Position of the first character currently in `builder`.
    start: (u32, u32),
    row: u32,
    column: u32,
    last_char: Option<char>,
    /// Depth of `{`, `[` and `(`.
    nested: u32,
    /// Depth of `(` only; reset at every newline.
    group: u32,
    comment: bool,
    string: bool,
    /// A quote was opened inside a line comment.
    quoted_comment: bool,
    /// The last stored symbol was `::=`.
    equal: bool,
    oid: bool,
    list: bool,
}

impl Tokenizer {
    /// Create a tokenizer for the named unit.
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            table: SymbolTable::new(unit),
            builder: String::new(),
            start: (0, 0),
            row: 0,
            column: 0,
            last_char: None,
            nested: 0,
            group: 0,
            comment: false,
            string: false,
            quoted_comment: false,
            equal: false,
            oid: false,
            list: false,
        }
    }

    /// Consume a chunk of source text.
    pub fn feed(&mut self, text: &str) {
        for c in text.chars() {
            self.step(c);
            if c == '\n' {
                self.row += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
    }

    /// Flush the pending symbol and return the finished table.
    #[must_use]
    pub fn finish(mut self) -> SymbolTable {
        self.flush();
        tracing::trace!(
            unit = self.table.unit(),
            module = self.table.module_name(),
            symbols = self.table.len(),
            "tokenized unit"
        );
        self.table
    }

    fn step(&mut self, c: char) {
        match c {
            ' ' | '\t' => {
                if self.keeps_delimiters() {
                    self.append(c);
                } else {
                    self.flush();
                }
            }
            '{' | '[' | '(' => {
                if c == '{' && self.equal {
                    self.oid = true;
                }
                self.nested += 1;
                if c == '(' {
                    self.group += 1;
                }
                if self.keeps_delimiters() {
                    self.append(c);
                } else {
                    self.emit_alone(c);
                }
            }
            '}' | ']' | ')' => {
                self.nested = self.nested.saturating_sub(1);
                if c == ')' {
                    self.group = self.group.saturating_sub(1);
                }
                self.append(c);
                if c == '}' {
                    self.oid = false;
                    self.list = false;
                }
            }
            ',' | ';' => {
                if self.comment {
                    self.append(c);
                } else {
                    self.emit_alone(c);
                }
            }
            '\n' | '\r' => {
                if self.string {
                    self.append(c);
                } else {
                    self.flush();
                    self.comment = false;
                    self.group = 0;
                }
            }
            '-' => {
                self.append(c);
                if self.last_char == Some('-') && !self.string {
                    self.open_line_comment();
                }
            }
            '"' => self.quote(),
            _ => self.append(c),
        }
        self.last_char = Some(c);
    }

    /// Whitespace and openers are part of the symbol inside comments and
    /// inside nested clauses, except in the top level of a brace list.
    fn keeps_delimiters(&self) -> bool {
        self.comment || ((self.oid || self.nested > 0) && (!self.list || self.group > 0))
    }

    fn quote(&mut self) {
        match (self.comment, self.string, self.quoted_comment) {
            (true, false, false) => self.quoted_comment = true,
            (false, false, false) => {
                self.comment = true;
                self.string = true;
                self.flush();
            }
            (true, true, false) => {
                self.comment = false;
                self.string = false;
            }
            (true, false, true) => self.quoted_comment = false,
            _ => {}
        }
        self.append('"');
        if !self.comment {
            self.flush();
        }
    }

    fn open_line_comment(&mut self) {
        self.comment = true;
        if let Some(pos) = self.builder.find("--") {
            self.builder.truncate(pos);
        }
        self.flush();
        self.builder.push_str("--");
        self.start = (self.row, self.column.saturating_sub(1));
    }

    fn append(&mut self, c: char) {
        if self.builder.is_empty() {
            self.start = (self.row, self.column);
        }
        self.builder.push(c);
    }

    fn emit_alone(&mut self, c: char) {
        self.flush();
        self.append(c);
        self.flush();
    }

    fn flush(&mut self) {
        if self.builder.is_empty() {
            return;
        }
        self.equal = false;
        let text = self.builder.trim().to_owned();
        self.builder.clear();
        if !text.is_empty() {
            self.store(text);
        }
    }

    fn store(&mut self, text: String) {
        let (row, column) = self.start;
        let previous = self.table.last_in_row(row).map(|s| s.text().to_owned());

        if let Some(merged) = coalesce(previous.as_deref(), &text) {
            if let Some(prev) = self.table.last_in_row_mut(row) {
                prev.set_text(merged);
            }
            return;
        }

        match text.as_str() {
            "DEFINITIONS" => {
                if let Some(name) = previous {
                    self.table.set_declared_name(name);
                }
            }
            "{" => {
                if previous.as_deref() != Some("::=") {
                    self.list = true;
                }
            }
            _ => {}
        }

        let assigns = text == "::=";
        self.table.push(Symbol::new(text, row, column));
        if assigns {
            self.equal = true;
        }
    }
}

/// Two-word keywords that are stored as one symbol.
fn coalesce(previous: Option<&str>, current: &str) -> Option<String> {
    let merged = match (previous?, current) {
        ("TYPE", "NOTATION") => "TYPE NOTATION",
        ("VALUE", "NOTATION") => "VALUE NOTATION",
        ("SEQUENCE", "OF") => "SEQUENCE OF",
        ("OBJECT", "IDENTIFIER") => "OBJECT IDENTIFIER",
        ("OCTET", "STRING") => "OCTET STRING",
        _ => return None,
    };
    Some(merged.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(text: &str) -> Vec<String> {
        tokenize("test", text).compile_sequence()
    }

    #[test]
    fn test_module_header_and_oid_clause() {
        let table = tokenize(
            "test.mib",
            "TestMib DEFINITIONS ::= BEGIN\n  foo OBJECT IDENTIFIER ::= { bar 1 }\nEND",
        );
        assert_eq!(table.module_name(), "TestMib");
        assert_eq!(
            table.compile_sequence(),
            vec![
                "TestMib",
                "DEFINITIONS",
                "::=",
                "BEGIN",
                "foo",
                "OBJECT IDENTIFIER",
                "::=",
                "{ bar 1 }",
                "END"
            ]
        );
    }

    #[test]
    fn test_positions() {
        let table = tokenize("test", "a  bb\n   ccc");
        let symbols: Vec<_> = table
            .symbols()
            .map(|s| (s.text().to_owned(), s.row(), s.column()))
            .collect();
        assert_eq!(
            symbols,
            vec![
                ("a".to_owned(), 0, 0),
                ("bb".to_owned(), 0, 3),
                ("ccc".to_owned(), 1, 3)
            ]
        );
    }

    #[test]
    fn test_line_comment_is_separate_symbol() {
        let table = tokenize("test", "foo -- a comment, with \"quotes\"\nbar");
        let all: Vec<_> = table.symbols().map(|s| s.text().to_owned()).collect();
        assert_eq!(all, vec!["foo", "-- a comment, with \"quotes\"", "bar"]);
        assert_eq!(table.compile_sequence(), vec!["foo", "bar"]);
    }

    #[test]
    fn test_comment_glued_to_token() {
        assert_eq!(texts("foo--comment\nbar"), vec!["foo", "bar"]);
    }

    #[test]
    fn test_string_spans_lines_and_keeps_dashes() {
        let syms = texts("DESCRIPTION \"first line -- not a comment\n   second, line\"\nSTATUS");
        assert_eq!(
            syms,
            vec![
                "DESCRIPTION",
                "\"first line -- not a comment\n   second, line\"",
                "STATUS"
            ]
        );
    }

    #[test]
    fn test_dashes_after_string_open_comment() {
        let table = tokenize("test", "DESCRIPTION \"a -- b\" -- trailing\nSTATUS");
        let all: Vec<_> = table.symbols().map(|s| s.text().to_owned()).collect();
        assert_eq!(all, vec!["DESCRIPTION", "\"a -- b\"", "-- trailing", "STATUS"]);
    }

    #[test]
    fn test_keyword_coalescing() {
        assert_eq!(
            texts("TYPE NOTATION VALUE NOTATION SEQUENCE OF Foo OCTET STRING"),
            vec!["TYPE NOTATION", "VALUE NOTATION", "SEQUENCE OF", "Foo", "OCTET STRING"]
        );
    }

    #[test]
    fn test_coalescing_requires_same_row() {
        assert_eq!(texts("OCTET\nSTRING"), vec!["OCTET", "STRING"]);
    }

    #[test]
    fn test_index_clause_is_one_symbol() {
        assert_eq!(
            texts("INDEX   { ifIndex, ifType }\n"),
            vec!["INDEX", "{ ifIndex", ",", "ifType }"]
        );
        assert_eq!(texts("INDEX { ifIndex }"), vec!["INDEX", "{ ifIndex }"]);
    }

    #[test]
    fn test_size_constraint_is_one_symbol() {
        assert_eq!(
            texts("SYNTAX DisplayString (SIZE (0..255))\n"),
            vec!["SYNTAX", "DisplayString", "(SIZE (0..255))"]
        );
    }

    #[test]
    fn test_inline_enumeration() {
        assert_eq!(
            texts("SYNTAX INTEGER { up(1), down(2) }\n"),
            vec!["SYNTAX", "INTEGER", "{ up(1)", ",", "down(2) }"]
        );
    }

    #[test]
    fn test_multiline_enumeration_is_a_list() {
        let syms = texts("SYNTAX INTEGER {\n    up(1),\n    down (2)\n}\n");
        assert_eq!(
            syms,
            vec!["SYNTAX", "INTEGER", "{", "up(1)", ",", "down", "(2)", "}"]
        );
    }

    #[test]
    fn test_sequence_body_is_split() {
        let syms = texts("IfEntry ::=\n    SEQUENCE {\n        ifIndex   InterfaceIndex,\n        ifDescr   DisplayString\n    }\n");
        assert_eq!(
            syms,
            vec![
                "IfEntry",
                "::=",
                "SEQUENCE",
                "{",
                "ifIndex",
                "InterfaceIndex",
                ",",
                "ifDescr",
                "DisplayString",
                "}"
            ]
        );
    }

    #[test]
    fn test_imports_punctuation() {
        assert_eq!(
            texts("IMPORTS\n    OBJECT-TYPE, mib-2\n        FROM SNMPv2-SMI;"),
            vec!["IMPORTS", "OBJECT-TYPE", ",", "mib-2", "FROM", "SNMPv2-SMI", ";"]
        );
    }

    #[test]
    fn test_chunked_feed_matches_whole() {
        let text = "sysDescr OBJECT-TYPE\n    SYNTAX DisplayString\n    ::= { system 1 }\n";
        let mut tokenizer = Tokenizer::new("test");
        for chunk in text.as_bytes().chunks(7) {
            tokenizer.feed(core::str::from_utf8(chunk).unwrap());
        }
        assert_eq!(tokenizer.finish(), tokenize("test", text));
    }

    #[test]
    fn test_unterminated_string_flushes_at_end() {
        assert_eq!(texts("DESCRIPTION \"never closed"), vec!["DESCRIPTION", "\"never closed"]);
    }
}
