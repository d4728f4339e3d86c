//! Ties the lexer, parser, function indexer, and evaluator together into
//! the crate's one public entry point.
//!
//! A host calls [`Interpreter::register_file`] once per source file — in
//! any order, since cross-file `public` resolution only happens when a
//! call is actually evaluated — then [`Interpreter::run_project`] with the
//! file that should execute first.

use ahash::AHashMap;

use crate::ast::Stmt;
use crate::builtins::BuiltinRegistry;
use crate::diagnostics::Diagnostics;
use crate::evaluator::Evaluator;
use crate::function_index::FunctionIndex;
use crate::lexer::Lexer;
use crate::parser;
use crate::value::Value;

pub struct Interpreter {
    diag: Diagnostics,
    files: AHashMap<String, Vec<Stmt>>,
    functions: FunctionIndex,
    registry: BuiltinRegistry,
}

impl Interpreter {
    pub fn new(registry: BuiltinRegistry) -> Self {
        Self {
            diag: Diagnostics::new(),
            files: AHashMap::new(),
            functions: FunctionIndex::new(),
            registry,
        }
    }

    /// Lexes, parses, and indexes one file's functions. Diagnostics raised
    /// during this phase (lex/parse errors) accumulate on the shared sink
    /// and are visible via [`Interpreter::diagnostics`] regardless of
    /// whether the file is ever executed.
    pub fn register_file(&mut self, file: &str, source: &str) {
        let tokens = Lexer::new(source, file).tokenize(&mut self.diag);
        let statements = parser::parse(tokens, file, &mut self.diag);
        self.functions.index_file(file, &statements);
        self.files.insert(file.to_owned(), statements);
    }

    /// Evaluates `entry_file`'s top-level statements in source order. The
    /// file must already have been registered; if not, an untagged error
    /// is recorded and evaluation yields `Value::None`.
    pub fn run_project(&mut self, entry_file: &str) -> Value {
        let Some(statements) = self.files.get(entry_file).cloned() else {
            self.diag.error_untagged(format!("entry file '{entry_file}' was never registered"));
            return Value::None;
        };
        let mut evaluator = Evaluator::new(&self.functions, &self.registry, &mut self.diag, entry_file);
        evaluator.run(&statements)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn registered_files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_arithmetic_and_print() {
        let mut interp = Interpreter::new(BuiltinRegistry::standard());
        interp.register_file("main.mt", "let x = 2 + 3 * 4; return x;");
        let result = interp.run_project("main.mt");
        assert!(!interp.diagnostics().has_error());
        assert_eq!(result, Value::Double(14.0));
    }

    #[test]
    fn cross_file_public_function_call() {
        let mut interp = Interpreter::new(BuiltinRegistry::standard());
        interp.register_file("lib.mt", "public function add(a, b) { return a + b; }");
        interp.register_file("main.mt", "return add(10, 5);");
        let result = interp.run_project("main.mt");
        assert!(!interp.diagnostics().has_error());
        assert_eq!(result, Value::Double(15.0));
    }

    #[test]
    fn private_function_is_invisible_from_another_file() {
        let mut interp = Interpreter::new(BuiltinRegistry::standard());
        interp.register_file("lib.mt", "private function secret() { return 7; }");
        interp.register_file("main.mt", "return secret();");
        let result = interp.run_project("main.mt");
        assert_eq!(result, Value::None);
        assert!(interp.diagnostics().has_error());
    }

    #[test]
    fn unregistered_entry_file_records_untagged_error() {
        let mut interp = Interpreter::new(BuiltinRegistry::standard());
        let result = interp.run_project("missing.mt");
        assert_eq!(result, Value::None);
        assert!(interp.diagnostics().has_error());
    }

    #[test]
    fn empty_file_runs_with_no_diagnostics() {
        let mut interp = Interpreter::new(BuiltinRegistry::standard());
        interp.register_file("main.mt", "");
        let result = interp.run_project("main.mt");
        assert_eq!(result, Value::None);
        assert!(interp.diagnostics().is_empty());
    }
}
