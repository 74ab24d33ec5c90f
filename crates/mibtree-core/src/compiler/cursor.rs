//! Cursor over a flattened symbol sequence.

/// Position-tracking view of a module's compile sequence.
///
/// All lookups are bounds-checked and return `None` past either end, so
/// grammar rules can probe neighbours without index arithmetic failing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SymbolCursor<'a> {
    symbols: &'a [String],
    pos: usize,
}

impl<'a> SymbolCursor<'a> {
    pub(crate) fn new(symbols: &'a [String]) -> Self {
        Self { symbols, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn current(&self) -> Option<&'a str> {
        self.get(self.pos)
    }

    /// Symbol at an absolute position.
    pub(crate) fn get(&self, index: usize) -> Option<&'a str> {
        self.symbols.get(index).map(String::as_str)
    }

    /// Symbol `n` positions before the cursor.
    pub(crate) fn behind(&self, n: usize) -> Option<&'a str> {
        self.pos.checked_sub(n).and_then(|i| self.get(i))
    }

    /// Symbol `n` positions after the cursor.
    pub(crate) fn ahead(&self, n: usize) -> Option<&'a str> {
        self.get(self.pos + n)
    }

    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Nearest position before the cursor whose symbol satisfies `pred`,
    /// skipping the symbol immediately before it.
    pub(crate) fn rfind_before(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        (0..self.pos.saturating_sub(1))
            .rev()
            .find(|&i| self.symbols.get(i).is_some_and(|s| pred(s)))
    }

    /// First position at or after `start` holding exactly `text`.
    pub(crate) fn position_from(&self, start: usize, text: &str) -> Option<usize> {
        self.symbols
            .get(start..)?
            .iter()
            .position(|s| s == text)
            .map(|offset| start + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_neighbours() {
        let syms = symbols(&["a", "b", "c"]);
        let mut cursor = SymbolCursor::new(&syms);
        cursor.advance();
        assert_eq!(cursor.current(), Some("b"));
        assert_eq!(cursor.behind(1), Some("a"));
        assert_eq!(cursor.behind(2), None);
        assert_eq!(cursor.ahead(1), Some("c"));
        assert_eq!(cursor.ahead(2), None);
    }

    #[test]
    fn test_rfind_before_skips_adjacent() {
        let syms = symbols(&["M", "x", "M", "::="]);
        let mut cursor = SymbolCursor::new(&syms);
        cursor.seek(3);
        assert_eq!(cursor.rfind_before(|s| s == "M"), Some(0));
        cursor.seek(4);
        assert_eq!(cursor.rfind_before(|s| s == "M"), Some(2));
    }

    #[test]
    fn test_position_from() {
        let syms = symbols(&["SYNTAX", "a", "SYNTAX"]);
        let cursor = SymbolCursor::new(&syms);
        assert_eq!(cursor.position_from(1, "SYNTAX"), Some(2));
        assert_eq!(cursor.position_from(3, "SYNTAX"), None);
        assert_eq!(cursor.position_from(9, "SYNTAX"), None);
    }
}
