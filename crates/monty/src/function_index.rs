//! Cross-file function resolution.
//!
//! Each file keeps its `private` functions to itself; `public` functions go
//! into one project-wide map keyed by name. Resolving a call from file `f`
//! checks `f`'s private map first, then the public map, so a private name
//! can locally shadow a public one of the same name.

use ahash::AHashMap;

use crate::ast::{FunctionDef, Visibility};

#[derive(Debug, Clone)]
pub struct ResolvedFunction {
    pub def: FunctionDef,
    /// The file the function is defined in; becomes the current file while
    /// its body executes, so nested private calls resolve correctly and
    /// diagnostics raised inside the call are attributed to it.
    pub defining_file: String,
}

#[derive(Debug, Default)]
pub struct FunctionIndex {
    private_by_file: AHashMap<String, AHashMap<String, FunctionDef>>,
    public: AHashMap<String, ResolvedFunction>,
}

impl FunctionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every top-level `Function` statement in `statements` as
    /// belonging to `file`. Non-function top-level statements are ignored
    /// here; they still execute when the file itself is evaluated.
    pub fn index_file(&mut self, file: &str, statements: &[crate::ast::Stmt]) {
        use crate::ast::Stmt;
        let private_map = self.private_by_file.entry(file.to_owned()).or_default();
        for stmt in statements {
            if let Stmt::Function(def) = stmt {
                match def.visibility {
                    Visibility::Private => {
                        private_map.insert(def.name.clone(), def.clone());
                    }
                    Visibility::Public => {
                        self.public.insert(
                            def.name.clone(),
                            ResolvedFunction {
                                def: def.clone(),
                                defining_file: file.to_owned(),
                            },
                        );
                    }
                }
            }
        }
    }

    /// Looks up `name` as callable from `current_file`: private functions
    /// of `current_file` first, then the project-wide public map.
    pub fn resolve(&self, name: &str, current_file: &str) -> Option<ResolvedFunction> {
        if let Some(def) = self.private_by_file.get(current_file).and_then(|m| m.get(name)) {
            return Some(ResolvedFunction {
                def: def.clone(),
                defining_file: current_file.to_owned(),
            });
        }
        self.public.get(name).cloned()
    }
}
