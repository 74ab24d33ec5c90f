//! Symbol dump utility for checking tokenizer output.
//!
//! Usage: tokenize <file>
//!
//! Prints one symbol per line as `ROW:COL<TAB>text`, 1-based, comments
//! included.

use std::env;
use std::process;

use mibtree_core::tokenizer::tokenize;
use mibtree_std::SourceFile;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <file>", args[0]);
        process::exit(1);
    }

    let source = match SourceFile::read(&args[1]) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let table = tokenize(&source.unit, &source.text());
    for symbol in table.symbols() {
        println!(
            "{}:{}\t{}",
            symbol.row() + 1,
            symbol.column() + 1,
            escape_text(symbol.text())
        );
    }
}

/// Escape newlines and tabs inside multi-line strings.
fn escape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}
