//! Lexical scope stack.
//!
//! An [`Environment`] is a stack of frames, each a name→[`Value`] map. The
//! bottom frame is the global frame and is never popped. `assign` searches
//! outward from the top frame and falls back to defining at the global
//! frame when the name is not found anywhere — see `DESIGN.md` for why
//! that silent fallback is kept rather than turned into an error.

use ahash::AHashMap;

use crate::diagnostics::Diagnostics;
use crate::value::Value;

#[derive(Debug, Default)]
struct Frame {
    vars: AHashMap<String, Value>,
}

#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pops the top frame. A no-op on the global frame: callers must pair
    /// every `push_scope` with exactly one `pop_scope`, but this guards
    /// against the global frame ever being removed by a mismatched pop.
    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Defines `name` in the current (innermost) frame, shadowing any
    /// outer binding of the same name.
    pub fn define(&mut self, name: &str, value: Value) {
        self.top_mut().vars.insert(name.to_owned(), value);
    }

    /// Defines `name` in the global (outermost) frame.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.frames[0].vars.insert(name.to_owned(), value);
    }

    /// Searches frames from innermost to outermost and overwrites the
    /// first match. If `name` is bound nowhere, it is created in the
    /// global frame (see module docs).
    pub fn assign(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if frame.vars.contains_key(name) {
                frame.vars.insert(name.to_owned(), value);
                return;
            }
        }
        self.define_global(name, value);
    }

    /// Looks up `name` from innermost to outermost. On miss, records an
    /// Error diagnostic and returns `Value::None`.
    pub fn get(&self, name: &str, diag: &mut Diagnostics, file: &str, line: u32) -> Value {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.vars.get(name) {
                return v.clone();
            }
        }
        diag.error(format!("name '{name}' is not defined"), file, line);
        Value::None
    }

    pub fn exists(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| frame.vars.contains_key(name))
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("global frame is never popped")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag() -> Diagnostics {
        Diagnostics::new()
    }

    #[test]
    fn define_then_get_round_trips() {
        let mut env = Environment::new();
        let mut d = diag();
        env.define("x", Value::Integer(1));
        assert_eq!(env.get("x", &mut d, "t", 1), Value::Integer(1));
        assert!(!d.has_error());
    }

    #[test]
    fn missing_name_records_error_and_returns_none() {
        let env = Environment::new();
        let mut d = diag();
        assert_eq!(env.get("missing", &mut d, "t", 3), Value::None);
        assert!(d.has_error());
    }

    #[test]
    fn assign_overwrites_outer_scope_through_inner_frame() {
        let mut env = Environment::new();
        env.define_global("x", Value::Integer(1));
        env.push_scope();
        env.assign("x", Value::Integer(2));
        let mut d = diag();
        assert_eq!(env.get("x", &mut d, "t", 1), Value::Integer(2));
        env.pop_scope();
        assert_eq!(env.get("x", &mut d, "t", 1), Value::Integer(2));
    }

    #[test]
    fn assign_to_unknown_name_creates_it_at_global_scope() {
        let mut env = Environment::new();
        env.push_scope();
        env.assign("brand_new", Value::Integer(7));
        env.pop_scope();
        let mut d = diag();
        assert_eq!(env.get("brand_new", &mut d, "t", 1), Value::Integer(7));
    }

    #[test]
    fn pop_scope_never_removes_global_frame() {
        let mut env = Environment::new();
        env.pop_scope();
        env.define("x", Value::Integer(1));
        let mut d = diag();
        assert_eq!(env.get("x", &mut d, "t", 1), Value::Integer(1));
    }
}
