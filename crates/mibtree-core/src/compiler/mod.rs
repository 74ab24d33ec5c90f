//! Macro-driven symbol compiler.
//!
//! The compiler walks each module's symbol sequence with a cursor and fires
//! a grammar rule at three trigger symbols:
//!
//! - `::=`: macro definition, notation clause, OID-clause assignment, or
//!   plain assignment depending on the neighbouring symbols
//! - `END`: commits an open macro definition
//! - `IMPORTS`: binds imported symbols to their source modules
//!
//! Macro templates are global to a [`Compiler`], so `OBJECT-TYPE` defined
//! in `SNMPv2-SMI` is known when later modules are compiled. Compile order
//! therefore matters: base modules go first.
//!
//! Compiling never fails. Unknown macros, unresolvable parents and
//! malformed clauses leave partially filled [`ObjectDefinition`]s and are
//! reported through `tracing`.

mod cursor;
mod fields;
mod notation;
mod oid_clause;

use std::collections::BTreeMap;

use crate::definition::{FieldValue, ModuleDefinition, ModuleSet, ObjectDefinition};
use crate::error::Result;
use crate::provider::ProviderSpec;
use crate::tokenizer::{tokenize, SymbolTable};

use cursor::SymbolCursor;
pub use notation::{MacroTemplate, NotationField};

/// Symbols between `::=` and a plain assignment's `SYNTAX` keyword beyond
/// which the keyword is assumed to belong to a later definition.
const SYNTAX_WINDOW: usize = 10;

/// Compiles tokenized modules into a [`ModuleSet`].
///
/// # Example
///
/// ```
/// use mibtree_core::Compiler;
///
/// let mut compiler = Compiler::new();
/// compiler.add_source(
///     "TEST-MIB",
///     "TEST-MIB DEFINITIONS ::= BEGIN\n\
///      org OBJECT IDENTIFIER ::= { iso 3 }\n\
///      dod OBJECT IDENTIFIER ::= { org 6 }\n\
///      END\n",
/// );
/// let modules = compiler.compile_all();
/// let dod = modules.lookup_object("dod").unwrap();
/// assert_eq!(dod.oid(), Some("1.3.6"));
/// assert_eq!(dod.name_space(), Some("iso.org.dod"));
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    pending: Vec<SymbolTable>,
    modules: ModuleSet,
    macros: BTreeMap<String, MacroTemplate>,
}

impl Compiler {
    /// Create a compiler with no modules and no macros.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize a source unit and queue it. Returns the module name it
    /// will compile under.
    pub fn add_source(&mut self, unit: &str, text: &str) -> String {
        self.add_symbols(tokenize(unit, text))
    }

    /// Queue an already tokenized unit.
    pub fn add_symbols(&mut self, table: SymbolTable) -> String {
        let name = table.module_name().to_owned();
        self.pending.push(table);
        name
    }

    /// Number of queued, not yet compiled units.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Compile every queued unit in queue order.
    pub fn compile_all(&mut self) -> &ModuleSet {
        for table in std::mem::take(&mut self.pending) {
            self.compile_table(&table);
        }
        &self.modules
    }

    /// Modules compiled so far.
    #[must_use]
    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Consume the compiler, keeping its modules.
    #[must_use]
    pub fn into_modules(self) -> ModuleSet {
        self.modules
    }

    /// Look up a macro template by name.
    #[must_use]
    pub fn macro_template(&self, name: &str) -> Option<&MacroTemplate> {
        self.macros.get(name)
    }

    /// All macro templates, by name.
    pub fn macros(&self) -> impl Iterator<Item = &MacroTemplate> {
        self.macros.values()
    }

    /// See [`ModuleSet::derive_providers`].
    pub fn derive_providers(&self, module: &str) -> Result<Vec<ProviderSpec>> {
        self.modules.derive_providers(module)
    }

    /// See [`ModuleSet::lookup_object`].
    #[must_use]
    pub fn lookup_object(&self, identifier: &str) -> Option<&ObjectDefinition> {
        self.modules.lookup_object(identifier)
    }

    fn compile_table(&mut self, table: &SymbolTable) {
        let name = table.module_name().to_owned();
        let symbols = table.compile_sequence();
        if self.modules.remove(&name).is_some() {
            tracing::debug!(module = %name, "recompiling module");
        }

        let mut builder = ModuleBuilder {
            modules: &self.modules,
            macros: &mut self.macros,
            module: ModuleDefinition::new(name.as_str()),
            scope: None,
            cursor: SymbolCursor::new(&symbols),
        };
        builder.run();
        let module = builder.finish();

        tracing::debug!(
            module = %name,
            objects = module.len(),
            imports = module.imports().len(),
            "compiled module"
        );
        self.modules.insert(module);
    }
}

/// Compile state for one module.
struct ModuleBuilder<'a> {
    modules: &'a ModuleSet,
    macros: &'a mut BTreeMap<String, MacroTemplate>,
    module: ModuleDefinition,
    /// Open `MACRO` definition, if any.
    scope: Option<MacroTemplate>,
    cursor: SymbolCursor<'a>,
}

impl ModuleBuilder<'_> {
    fn run(&mut self) {
        while let Some(symbol) = self.cursor.current() {
            match symbol {
                "::=" => self.assignment(),
                "END" => self.end_scope(),
                "IMPORTS" => self.imports(),
                _ => {}
            }
            self.cursor.advance();
        }
    }

    /// Retry clauses that referenced objects defined later in the module.
    fn finish(mut self) -> ModuleDefinition {
        let resolved: Vec<(usize, (String, String))> = self
            .module
            .objects()
            .iter()
            .enumerate()
            .filter(|(_, obj)| obj.oid().is_none())
            .filter_map(|(i, obj)| {
                let clause = obj.oid_clause()?;
                self.resolve_clause(clause, obj.name()).map(|r| (i, r))
            })
            .collect();

        let objects = self.module.objects_mut();
        for (i, (oid, name_space)) in resolved {
            objects[i].set_resolved(oid, name_space);
        }

        for obj in self.module.objects() {
            if let (Some(clause), None) = (obj.oid_clause(), obj.oid()) {
                tracing::debug!(
                    module = self.module.name(),
                    object = obj.name(),
                    clause,
                    "unresolved OID clause"
                );
            }
        }
        self.module
    }

    fn end_scope(&mut self) {
        if let Some(template) = self.scope.take() {
            tracing::trace!(
                module = self.module.name(),
                name = template.name(),
                "defined macro"
            );
            self.macros.insert(template.name().to_owned(), template);
        }
    }

    fn imports(&mut self) {
        let mut pos = self.cursor.pos() + 1;
        let mut symbols = Vec::new();
        while let Some(symbol) = self.cursor.get(pos) {
            match symbol {
                ";" => break,
                "FROM" => {
                    let Some(from) = self.cursor.get(pos + 1) else {
                        break;
                    };
                    if !self.modules.contains(from) {
                        tracing::warn!(
                            module = self.module.name(),
                            from,
                            symbols = ?symbols,
                            "imported module has not been compiled"
                        );
                    }
                    self.module.set_imports(from.to_owned(), std::mem::take(&mut symbols));
                    pos += 1;
                }
                "," => {}
                other => symbols.push(other.to_owned()),
            }
            pos += 1;
        }
        self.cursor.seek(pos);
    }

    fn assignment(&mut self) {
        let Some(next) = self.cursor.ahead(1) else {
            return;
        };
        if next.starts_with('{') {
            self.oid_assignment(next);
        } else {
            self.plain_assignment(next);
        }
    }

    /// `::=` followed by anything but a `{ ... }` clause.
    fn plain_assignment(&mut self, next: &str) {
        match self.cursor.behind(1) {
            None | Some("DEFINITIONS" | "OBJECT IDENTIFIER") => {}
            Some("MACRO") => {
                if let Some(name) = self.cursor.behind(2) {
                    self.scope = Some(MacroTemplate::new(name));
                }
            }
            Some(keyword @ ("TYPE NOTATION" | "VALUE NOTATION")) => self.notation(keyword),
            Some(name) => match self.scope.as_mut() {
                Some(template) => template.add_production(name),
                None => self.plain_object(name, next),
            },
        }
    }

    fn notation(&mut self, keyword: &str) {
        let fields = notation::parse_notation(&self.cursor, self.cursor.pos() + 1);
        let Some(template) = self.scope.as_mut() else {
            tracing::debug!(module = self.module.name(), keyword, "notation outside a macro");
            return;
        };
        if keyword == "TYPE NOTATION" {
            template.set_type_notation(fields);
        } else {
            template.set_value_notation(fields);
        }

        // The SMI macro texts omit INDEX/AUGMENTS, but instances use them.
        match self.module.name() {
            "SNMPv2-SMI" => {
                template.define_type_field("INDEX", "Index");
                template.define_type_field("AUGMENTS", "Augments");
            }
            "RFC-1212" => template.define_type_field("INDEX", "Index"),
            _ => {}
        }
    }

    /// `Name Macro ::= Value`, including TEXTUAL-CONVENTIONs.
    fn plain_object(&mut self, name: &str, value: &str) {
        let mut object = ObjectDefinition::new(name, self.module.name());
        object.set_macro_name(Some(value.to_owned()));
        if let Some(syntax) = self.trailing_syntax(value) {
            object.set_field("SYNTAX", syntax);
        }
        self.module.insert(object);
    }

    /// SYNTAX of a plain assignment whose value is a known macro.
    fn trailing_syntax(&self, macro_name: &str) -> Option<FieldValue> {
        if !self.macros.contains_key(macro_name) {
            return None;
        }
        let assign = self.cursor.pos();
        let keyword = self.cursor.position_from(assign, "SYNTAX")?;
        if keyword - assign >= SYNTAX_WINDOW {
            return None;
        }
        self.cursor.get(keyword + 1)?;
        Some(fields::syntax_value(&self.cursor, keyword + 1, self.cursor.len()).0)
    }

    /// `::= { ... }`: an `OBJECT IDENTIFIER` value or a macro invocation.
    fn oid_assignment(&mut self, next: &str) {
        let clause = next.replacen('{', "", 1).replacen('}', "", 1).trim().to_owned();

        let (name, invoked) = if self.cursor.behind(1) == Some("OBJECT IDENTIFIER") {
            let Some(name) = self.cursor.behind(2) else {
                return;
            };
            (name, None)
        } else {
            let macros = &*self.macros;
            let Some(pos) = self.cursor.rfind_before(|s| macros.contains_key(s)) else {
                tracing::debug!(
                    module = self.module.name(),
                    clause = %clause,
                    "no macro invocation before OID clause"
                );
                return;
            };
            let Some(name) = pos.checked_sub(1).and_then(|p| self.cursor.get(p)) else {
                return;
            };
            (name, Some(pos))
        };

        if let Some(template) = self.scope.as_mut() {
            template.add_production(name);
            return;
        }

        let mut object = ObjectDefinition::new(name, self.module.name());
        if let Some(pos) = invoked {
            let macro_name = self.cursor.get(pos);
            object.set_macro_name(macro_name.map(str::to_owned));
            if let Some(template) = macro_name.and_then(|m| self.macros.get(m)) {
                let keychain = template.keychain();
                fields::scan_fields(&self.cursor, pos + 1, self.cursor.pos(), &keychain, &mut object);
            }
        }

        if clause == oid_clause::ZERO_DOT_ZERO {
            object.set_resolved("0.0".to_owned(), "null".to_owned());
        } else if let Some((oid, name_space)) = self.resolve_clause(&clause, name) {
            object.set_resolved(oid, name_space);
        }
        object.set_oid_clause(clause);
        self.module.insert(object);
    }

    fn resolve_clause(&self, clause: &str, name: &str) -> Option<(String, String)> {
        oid_clause::resolve(clause, name, |parent| self.parent_clause(parent))
    }

    /// Clause of the first object named `parent`, in compile order.
    fn parent_clause(&self, parent: &str) -> Option<String> {
        self.modules
            .objects()
            .chain(self.module.objects())
            .filter(|obj| obj.name() == parent)
            .find_map(ObjectDefinition::oid_clause)
            .map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SMI: &str = r#"SNMPv2-SMI DEFINITIONS ::= BEGIN

org            OBJECT IDENTIFIER ::= { iso 3 }  --  "iso" = 1
dod            OBJECT IDENTIFIER ::= { org 6 }
internet       OBJECT IDENTIFIER ::= { dod 1 }
mgmt           OBJECT IDENTIFIER ::= { internet 2 }
mib-2          OBJECT IDENTIFIER ::= { mgmt 1 }

OBJECT-TYPE MACRO ::=
BEGIN
    TYPE NOTATION ::=
                  "SYNTAX" Syntax
                  UnitsPart
                  "MAX-ACCESS" Access
                  "STATUS" Status
                  "DESCRIPTION" Text
                  ReferPart
                  IndexPart
                  DefValPart

    VALUE NOTATION ::=
                  value(VALUE ObjectName)

    Syntax ::=   -- Must be one of the following:
                       -- a base type (or its refinement), or
                       -- a BITS pseudo-type
                   type
                | "BITS" "{" NamedBits "}"

    IndexPart ::=
                  "INDEX"    "{" IndexTypes "}"
                | "AUGMENTS" "{" Entry      "}"
                | empty
END

END
"#;

    fn compile(sources: &[(&str, &str)]) -> Compiler {
        let mut compiler = Compiler::new();
        for (unit, text) in sources {
            compiler.add_source(unit, text);
        }
        compiler.compile_all();
        compiler
    }

    #[test]
    fn test_macro_definition() {
        let compiler = compile(&[("smi", SMI)]);
        let template = compiler.macro_template("OBJECT-TYPE").unwrap();
        assert_eq!(
            template.keychain(),
            vec!["DESCRIPTION", "SYNTAX", "MAX-ACCESS", "STATUS", "INDEX", "AUGMENTS"]
        );
        assert_eq!(template.value_notation().len(), 1);
        assert_eq!(template.productions(), &["Syntax".to_owned(), "IndexPart".to_owned()]);

        let smi = compiler.modules().module("SNMPv2-SMI").unwrap();
        assert!(smi.object("Syntax").is_none());
        assert_eq!(smi.object("mib-2").and_then(ObjectDefinition::oid), Some("1.3.6.1.2.1"));
    }

    #[test]
    fn test_object_type_invocation() {
        let mib = r#"TEST-MIB DEFINITIONS ::= BEGIN
IMPORTS
    OBJECT-TYPE, mib-2
        FROM SNMPv2-SMI;

system OBJECT IDENTIFIER ::= { mib-2 1 }

sysDescr OBJECT-TYPE
    SYNTAX      DisplayString (SIZE (0..255))
    MAX-ACCESS  read-only
    STATUS      current
    DESCRIPTION
            "A textual description of the entity."
    ::= { system 1 }

ifAdminStatus OBJECT-TYPE
    SYNTAX  INTEGER {
                up(1),
                down(2)
            }
    MAX-ACCESS  read-write
    STATUS      current
    DESCRIPTION "The desired state."
    ::= { system 7 }
END
"#;
        let compiler = compile(&[("smi", SMI), ("test", mib)]);
        let module = compiler.modules().module("TEST-MIB").unwrap();
        assert_eq!(
            module.imports().get("SNMPv2-SMI"),
            Some(&vec!["OBJECT-TYPE".to_owned(), "mib-2".to_owned()])
        );

        let descr = module.object("sysDescr").unwrap();
        assert_eq!(descr.macro_name(), Some("OBJECT-TYPE"));
        assert_eq!(descr.oid_clause(), Some("system 1"));
        assert_eq!(descr.oid(), Some("1.3.6.1.2.1.1.1"));
        assert_eq!(
            descr.name_space(),
            Some("iso.org.dod.internet.mgmt.mib-2.system.sysDescr")
        );
        assert_eq!(descr.syntax(), Some(&FieldValue::Text("DisplayString".into())));
        assert_eq!(descr.field("MAX-ACCESS"), Some(&FieldValue::Text("read-only".into())));
        assert_eq!(descr.description(), Some("A textual description of the entity."));

        let admin = module.object("ifAdminStatus").unwrap();
        let FieldValue::Enumeration { base, values } = admin.syntax().unwrap() else {
            panic!("expected enumeration");
        };
        assert_eq!(base, "INTEGER");
        assert_eq!(values.get(&2).map(String::as_str), Some("down"));
        assert_eq!(admin.status(), Some("current"));
    }

    #[test]
    fn test_zero_dot_zero() {
        let compiler = compile(&[("z", "Z DEFINITIONS ::= BEGIN\nzeroDotZero OBJECT IDENTIFIER ::= { 0 0 }\nEND\n")]);
        let obj = compiler.lookup_object("zeroDotZero").unwrap();
        assert_eq!(obj.oid(), Some("0.0"));
        assert_eq!(obj.name_space(), Some("null"));
    }

    #[test]
    fn test_forward_reference_resolved_at_module_end() {
        let compiler = compile(&[(
            "f",
            "F DEFINITIONS ::= BEGIN\nleaf OBJECT IDENTIFIER ::= { branch 2 }\nbranch OBJECT IDENTIFIER ::= { iso 9 }\nEND\n",
        )]);
        assert_eq!(compiler.lookup_object("leaf").and_then(ObjectDefinition::oid), Some("1.9.2"));
    }

    #[test]
    fn test_missing_import_is_not_fatal() {
        let compiler = compile(&[(
            "m",
            "M DEFINITIONS ::= BEGIN\nIMPORTS foo FROM NOWHERE;\nx OBJECT IDENTIFIER ::= { unknownParent 1 }\nEND\n",
        )]);
        let module = compiler.modules().module("M").unwrap();
        assert_eq!(module.imports().get("NOWHERE"), Some(&vec!["foo".to_owned()]));
        let x = module.object("x").unwrap();
        assert_eq!(x.oid_clause(), Some("unknownParent 1"));
        assert_eq!(x.oid(), None);
    }

    #[test]
    fn test_module_name_falls_back_to_unit() {
        let compiler = compile(&[("plain-unit", "x OBJECT IDENTIFIER ::= { iso 7 }\n")]);
        assert!(compiler.modules().module("plain-unit").is_some());
    }

    #[test]
    fn test_recompile_replaces_and_moves_last() {
        let mut compiler = Compiler::new();
        compiler.add_source("a", "A DEFINITIONS ::= BEGIN\nx OBJECT IDENTIFIER ::= { iso 1 }\nEND\n");
        compiler.add_source("b", "B DEFINITIONS ::= BEGIN\nEND\n");
        compiler.add_source("a2", "A DEFINITIONS ::= BEGIN\ny OBJECT IDENTIFIER ::= { iso 2 }\nEND\n");
        let modules = compiler.compile_all();
        let names: Vec<_> = modules.modules().iter().map(ModuleDefinition::name).collect();
        assert_eq!(names, vec!["B", "A"]);
        let a = modules.module("A").unwrap();
        assert!(a.object("x").is_none());
        assert!(a.object("y").is_some());
        assert_eq!(compiler.pending(), 0);
    }
}
