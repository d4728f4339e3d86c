//! Tree-walking evaluator: a visitor over the AST driven by ordinary
//! pattern matching (see `DESIGN.md` for why this crate uses a sum type
//! here instead of a dynamic-dispatch visitor trait).
//!
//! There are no user-visible exceptions. Every failure is recorded on the
//! diagnostics sink and the offending expression evaluates to
//! [`Value::None`]. The only non-local control flow is
//! [`Signal`], which carries `return`/`break`/`continue` up through nested
//! statements until the relevant loop, switch, or call frame consumes it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{AssignPathSegment, Expr, Stmt};
use crate::builtins::BuiltinRegistry;
use crate::diagnostics::Diagnostics;
use crate::environment::Environment;
use crate::function_index::FunctionIndex;
use crate::value::{StructDef, StructInstance, Value};

/// Non-local control flow raised by `return`/`break`/`continue` statements.
/// Expression evaluation never produces one directly; only statement
/// execution does, and only a loop/switch/call frame consumes it.
#[derive(Debug)]
pub enum Signal {
    Return(Value),
    Break,
    Continue,
}

/// A statement's outcome: its value on normal completion (every statement
/// evaluates to one, even if most callers discard it), or a `Signal`
/// unwinding past it. Blocks and function bodies use the `Ok` value of
/// their last statement as their own result when nothing returns early.
type ExecResult = Result<Value, Signal>;

pub struct Evaluator<'a> {
    env: Environment,
    functions: &'a FunctionIndex,
    registry: &'a BuiltinRegistry,
    diag: &'a mut Diagnostics,
    file_stack: Vec<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionIndex, registry: &'a BuiltinRegistry, diag: &'a mut Diagnostics, entry_file: &str) -> Self {
        Self {
            env: Environment::new(),
            functions,
            registry,
            diag,
            file_stack: vec![entry_file.to_owned()],
        }
    }

    fn current_file(&self) -> String {
        self.file_stack.last().cloned().unwrap_or_default()
    }

    /// Evaluates an entry file's top-level statements in order. A top-level
    /// `return` is caught here rather than propagated further, since there
    /// is no enclosing call frame for it to unwind into.
    pub fn run(&mut self, statements: &[Stmt]) -> Value {
        let mut result = Value::None;
        for stmt in statements {
            match self.exec_stmt(stmt) {
                Ok(v) => result = v,
                Err(Signal::Return(v)) => {
                    result = v;
                    break;
                }
                Err(Signal::Break) | Err(Signal::Continue) => {
                    let file = self.current_file();
                    self.diag.error("break/continue outside of a loop", &file, stmt.line());
                    break;
                }
            }
        }
        result
    }

    // ---- statements ----

    fn exec_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Assignment { is_let, name, value, .. } => {
                let v = self.eval_expr(value);
                if *is_let {
                    self.env.define(name, v.clone());
                } else {
                    self.env.assign(name, v.clone());
                }
                Ok(v)
            }
            Stmt::Expression { expr, .. } => Ok(self.eval_expr(expr)),
            Stmt::If { cond, then_branch, else_branch, .. } => {
                if self.eval_expr(cond).is_truthy() {
                    self.exec_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Value::None)
                }
            }
            Stmt::While { cond, body, .. } => {
                let mut result = Value::None;
                loop {
                    if !self.eval_expr(cond).is_truthy() {
                        break;
                    }
                    match self.exec_stmt(body) {
                        Ok(v) => result = v,
                        Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(signal @ Signal::Return(_)) => return Err(signal),
                    }
                }
                Ok(result)
            }
            Stmt::Repeat { count, body, line } => {
                let count_val = self.eval_expr(count);
                let Some(n) = to_index(&count_val) else {
                    let file = self.current_file();
                    self.diag.error(format!("repeat count must be numeric, found '{}'", count_val.type_name()), &file, *line);
                    return Ok(Value::None);
                };
                let mut result = Value::None;
                for _ in 0..n {
                    match self.exec_stmt(body) {
                        Ok(v) => result = v,
                        Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(signal @ Signal::Return(_)) => return Err(signal),
                    }
                }
                Ok(result)
            }
            Stmt::For { init, cond, step, body, .. } => {
                self.env.push_scope();
                let outcome = self.run_for_loop(init.as_deref(), cond.as_ref(), step.as_deref(), body);
                self.env.pop_scope();
                outcome
            }
            Stmt::Foreach { var_name, iterable, body, line } => {
                let iterable_val = self.eval_expr(iterable);
                let Value::Array(elements) = iterable_val else {
                    let file = self.current_file();
                    self.diag.error(format!("foreach requires an array, found '{}'", iterable_val.type_name()), &file, *line);
                    return Ok(Value::None);
                };
                let mut result = Value::None;
                for element in elements {
                    self.env.push_scope();
                    self.env.define(var_name, element);
                    let outcome = self.exec_stmt(body);
                    self.env.pop_scope();
                    match outcome {
                        Ok(v) => result = v,
                        Err(Signal::Continue) => {}
                        Err(Signal::Break) => break,
                        Err(signal @ Signal::Return(_)) => return Err(signal),
                    }
                }
                Ok(result)
            }
            Stmt::Block { statements, .. } => {
                self.env.push_scope();
                let outcome = self.exec_stmt_list(statements);
                self.env.pop_scope();
                outcome
            }
            Stmt::Function(_) => Ok(Value::None),
            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(e) => self.eval_expr(e),
                    None => Value::None,
                };
                Err(Signal::Return(v))
            }
            Stmt::IndexAssignment { base, path, value, line } => {
                let new_value = self.eval_expr(value);
                let file = self.current_file();
                let base_current = if self.env.exists(base) {
                    self.env.get(base, self.diag, &file, *line)
                } else {
                    Value::None
                };
                let updated = self.assign_path(base_current, path, new_value.clone(), &file, *line);
                self.env.assign(base, updated);
                Ok(new_value)
            }
            Stmt::Enum { name, members, .. } => {
                self.env.define_global(name, Value::None);
                for (member_name, value) in members {
                    self.env.define_global(&format!("{name}.{member_name}"), Value::Integer(*value));
                }
                Ok(Value::None)
            }
            Stmt::Macros { name, value, line } => {
                if self.env.exists(name) {
                    let file = self.current_file();
                    self.diag.error(format!("'{name}' is already defined"), &file, *line);
                    Ok(Value::None)
                } else {
                    let v = self.eval_expr(value);
                    self.env.define_global(name, v.clone());
                    Ok(v)
                }
            }
            Stmt::Break { .. } => Err(Signal::Break),
            Stmt::Continue { .. } => Err(Signal::Continue),
            Stmt::Switch { scrutinee, cases, default, .. } => self.exec_switch(scrutinee, cases, default.as_deref()),
        }
    }

    fn run_for_loop(&mut self, init: Option<&Stmt>, cond: Option<&Expr>, step: Option<&Stmt>, body: &Stmt) -> ExecResult {
        if let Some(init) = init {
            self.exec_stmt(init)?;
        }
        let mut result = Value::None;
        loop {
            let should_continue = match cond {
                Some(c) => self.eval_expr(c).is_truthy(),
                None => true,
            };
            if !should_continue {
                break;
            }
            match self.exec_stmt(body) {
                Ok(v) => result = v,
                Err(Signal::Continue) => {}
                Err(Signal::Break) => break,
                Err(signal @ Signal::Return(_)) => return Err(signal),
            }
            if let Some(step) = step {
                self.exec_stmt(step)?;
            }
        }
        Ok(result)
    }

    /// Runs the matched case and every case after it until a `Break` fires
    /// or the list runs out. `default` only ever runs when no case matched
    /// the scrutinee — a case that falls off the end of the list without a
    /// `Break` simply ends the switch, it does not also run `default`.
    fn exec_switch(&mut self, scrutinee: &Expr, cases: &[crate::ast::SwitchCase], default: Option<&[Stmt]>) -> ExecResult {
        let scrutinee_val = self.eval_expr(scrutinee);
        let mut matched = None;
        for (i, case) in cases.iter().enumerate() {
            let pattern_val = self.eval_expr(&case.pattern);
            if values_equal(&scrutinee_val, &pattern_val) {
                matched = Some(i);
                break;
            }
        }
        let Some(start) = matched else {
            return match default {
                Some(body) => self.exec_stmt_list(body),
                None => Ok(Value::None),
            };
        };
        let mut result = Value::None;
        for case in &cases[start..] {
            match self.exec_stmt_list(&case.body) {
                Ok(v) => result = v,
                Err(Signal::Break) => return Ok(result),
                Err(signal) => return Err(signal),
            }
        }
        Ok(result)
    }

    fn exec_stmt_list(&mut self, statements: &[Stmt]) -> ExecResult {
        let mut result = Value::None;
        for stmt in statements {
            result = self.exec_stmt(stmt)?;
        }
        Ok(result)
    }

    /// Walks an index/member assignment path, rebuilding each value-semantic
    /// container (arrays) along the way and mutating reference-semantic
    /// ones (dictionaries, structs) in place. Returns the new value of the
    /// slot this call was given, so the caller can splice it back into its
    /// own parent (or into the environment, at the root).
    fn assign_path(&mut self, current: Value, path: &[AssignPathSegment], new_value: Value, file: &str, line: u32) -> Value {
        let Some((segment, rest)) = path.split_first() else {
            return new_value;
        };
        match segment {
            AssignPathSegment::Index(index_expr) => {
                let index_val = self.eval_expr(index_expr);
                match current {
                    Value::Array(mut elements) => {
                        let Some(idx) = to_index(&index_val) else {
                            self.diag.error("array index must be a non-negative integer", file, line);
                            return Value::Array(elements);
                        };
                        if idx >= elements.len() {
                            elements.resize(idx + 1, Value::None);
                        }
                        let existing = std::mem::replace(&mut elements[idx], Value::None);
                        elements[idx] = if rest.is_empty() { new_value } else { self.assign_path(existing, rest, new_value, file, line) };
                        Value::Array(elements)
                    }
                    Value::None => self.assign_path(Value::Array(vec![]), path, new_value, file, line),
                    Value::Dictionary(map) => {
                        let key = index_val.to_string();
                        let existing = map.borrow().get(&key).cloned().unwrap_or(Value::None);
                        let updated = if rest.is_empty() { new_value } else { self.assign_path(existing, rest, new_value, file, line) };
                        map.borrow_mut().insert(key, updated);
                        Value::Dictionary(map)
                    }
                    other => {
                        self.diag.error(format!("cannot index into type '{}'", other.type_name()), file, line);
                        other
                    }
                }
            }
            AssignPathSegment::Field(name) => match current {
                Value::Struct(inst) => {
                    let existing = inst.borrow().fields.get(name).cloned().unwrap_or(Value::None);
                    let updated = if rest.is_empty() { new_value } else { self.assign_path(existing, rest, new_value, file, line) };
                    inst.borrow_mut().fields.insert(name.clone(), updated);
                    Value::Struct(inst)
                }
                other => {
                    self.diag.error(format!("cannot access field '{name}' of type '{}'", other.type_name()), file, line);
                    other
                }
            },
        }
    }

    // ---- expressions ----

    fn eval_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Number { value, .. } => Value::from_number_lit(*value),
            Expr::Str { value, .. } => Value::String(value.clone()),
            Expr::Bool { value, .. } => Value::Boolean(*value),
            Expr::Variable { name, line } => {
                let file = self.current_file();
                self.env.get(name, self.diag, &file, *line)
            }
            Expr::Unary { op, operand, line } => self.eval_unary(*op, operand, *line),
            Expr::Binary { op, left, right, line } => {
                let l = self.eval_expr(left);
                let r = self.eval_expr(right);
                self.eval_binary(op, l, r, *line)
            }
            Expr::Call { callee, args, line } => self.eval_call(callee, args, *line),
            Expr::ArrayLiteral { elements, .. } => {
                let values = elements.iter().map(|e| self.eval_expr(e)).collect();
                Value::Array(values)
            }
            Expr::DictLiteral { entries, .. } => {
                let mut map = indexmap::IndexMap::new();
                for (key_expr, value_expr) in entries {
                    let key = self.eval_expr(key_expr).to_string();
                    let value = self.eval_expr(value_expr);
                    map.insert(key, value);
                }
                Value::Dictionary(Rc::new(RefCell::new(map)))
            }
            Expr::StructLiteral { fields, .. } => {
                let def = Rc::new(StructDef { field_names: fields.clone() });
                Value::Struct(Rc::new(RefCell::new(StructInstance::blank(def))))
            }
            Expr::Index { container, index, line } => {
                let container_val = self.eval_expr(container);
                let index_val = self.eval_expr(index);
                self.eval_index(container_val, index_val, *line)
            }
            Expr::Member { object, field, line } => self.eval_member(object, field, *line),
        }
    }

    fn eval_unary(&mut self, op: char, operand: &Expr, line: u32) -> Value {
        let v = self.eval_expr(operand);
        match op {
            '!' => Value::Boolean(!v.is_truthy()),
            '+' => match v {
                Value::Integer(_) | Value::Double(_) => v,
                other => {
                    let file = self.current_file();
                    self.diag.error(format!("unary '+' is not supported for type '{}'", other.type_name()), &file, line);
                    Value::None
                }
            },
            '-' => match v {
                Value::Integer(i) => Value::Integer(-i),
                Value::Double(f) => Value::Double(-f),
                other => {
                    let file = self.current_file();
                    self.diag.error(format!("unary '-' is not supported for type '{}'", other.type_name()), &file, line);
                    Value::None
                }
            },
            _ => unreachable!("lexer only produces '!', '+', '-' unary operators"),
        }
    }

    fn eval_binary(&mut self, op: &str, left: Value, right: Value, line: u32) -> Value {
        let is_logical = matches!(op, "and" | "or" | "&&" | "||");
        if left.is_numeric() && right.is_numeric() && !is_logical {
            let l = left.as_f64().expect("checked numeric");
            let r = right.as_f64().expect("checked numeric");
            return match op {
                "+" => Value::Double(l + r),
                "-" => Value::Double(l - r),
                "*" => Value::Double(l * r),
                "/" => Value::Double(if r == 0.0 { 0.0 } else { l / r }),
                "==" => Value::Boolean(l == r),
                "!=" => Value::Boolean(l != r),
                "<" => Value::Boolean(l < r),
                "<=" => Value::Boolean(l <= r),
                ">" => Value::Boolean(l > r),
                ">=" => Value::Boolean(l >= r),
                _ => {
                    let file = self.current_file();
                    self.diag.error(format!("unknown operator '{op}'"), &file, line);
                    Value::None
                }
            };
        }
        if op == "+" && (matches!(left, Value::String(_)) || matches!(right, Value::String(_))) {
            return Value::String(format!("{left}{right}"));
        }
        if matches!(op, "==" | "!=") {
            let eq = values_equal(&left, &right);
            return Value::Boolean(if op == "==" { eq } else { !eq });
        }
        if let (Value::Boolean(a), Value::Boolean(b)) = (&left, &right) {
            return match op {
                "and" | "&&" => Value::Boolean(*a && *b),
                "or" | "||" => Value::Boolean(*a || *b),
                _ => {
                    let file = self.current_file();
                    self.diag.error(format!("operator '{op}' is not supported for boolean operands"), &file, line);
                    Value::None
                }
            };
        }
        let file = self.current_file();
        self.diag.error(
            format!("operator '{op}' is not supported between '{}' and '{}'", left.type_name(), right.type_name()),
            &file,
            line,
        );
        Value::None
    }

    fn eval_index(&mut self, container: Value, index: Value, line: u32) -> Value {
        match container {
            Value::Array(elements) => match to_index(&index) {
                Some(idx) if idx < elements.len() => elements[idx].clone(),
                _ => {
                    let file = self.current_file();
                    self.diag.error("array index out of range", &file, line);
                    Value::None
                }
            },
            Value::Dictionary(map) => {
                let key = index.to_string();
                map.borrow().get(&key).cloned().unwrap_or_else(|| {
                    let file = self.current_file();
                    self.diag.error(format!("dictionary has no key '{key}'"), &file, line);
                    Value::None
                })
            }
            other => {
                let file = self.current_file();
                self.diag.error(format!("type '{}' is not indexable", other.type_name()), &file, line);
                Value::None
            }
        }
    }

    fn eval_member(&mut self, object: &Expr, field: &str, line: u32) -> Value {
        let file = self.current_file();
        if let Expr::Variable { name, .. } = object {
            let flat = format!("{name}.{field}");
            if self.env.exists(&flat) {
                return self.env.get(&flat, self.diag, &file, line);
            }
            if self.env.exists(name) {
                let val = self.env.get(name, self.diag, &file, line);
                return self.member_of_struct(val, field, &file, line);
            }
            self.diag.error(format!("name '{name}' is not defined"), &file, line);
            return Value::None;
        }
        let object_val = self.eval_expr(object);
        self.member_of_struct(object_val, field, &file, line)
    }

    fn member_of_struct(&mut self, val: Value, field: &str, file: &str, line: u32) -> Value {
        match val {
            Value::Struct(inst) => {
                let found = inst.borrow().fields.get(field).cloned();
                found.unwrap_or_else(|| {
                    self.diag.error(format!("struct has no field '{field}'"), file, line);
                    Value::None
                })
            }
            other => {
                self.diag.error(format!("type '{}' has no member '{field}'", other.type_name()), file, line);
                Value::None
            }
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], line: u32) -> Value {
        let arg_values: Vec<Value> = args.iter().map(|a| self.eval_expr(a)).collect();
        if let Expr::Variable { name, .. } = callee {
            if self.env.exists(name) {
                let file = self.current_file();
                let val = self.env.get(name, self.diag, &file, line);
                if let Value::Struct(inst) = &val {
                    return construct_from_template(inst, &arg_values);
                }
            }
            if let Some(builtin) = self.registry.get(name) {
                let file = self.current_file();
                return builtin.invoke(&arg_values, self.diag, &file, line);
            }
            let current_file = self.current_file();
            if let Some(resolved) = self.functions.resolve(name, &current_file) {
                return self.call_user_function(&resolved, arg_values, line);
            }
            self.diag.error(format!("'{name}' is not callable"), &current_file, line);
            return Value::None;
        }
        let callee_val = self.eval_expr(callee);
        if let Value::Struct(inst) = &callee_val {
            construct_from_template(inst, &arg_values)
        } else {
            let file = self.current_file();
            self.diag.error(format!("type '{}' is not callable", callee_val.type_name()), &file, line);
            Value::None
        }
    }

    fn call_user_function(&mut self, resolved: &crate::function_index::ResolvedFunction, arg_values: Vec<Value>, call_line: u32) -> Value {
        if resolved.def.params.len() != arg_values.len() {
            let file = self.current_file();
            self.diag.error(
                format!("function '{}' takes {} argument(s), got {}", resolved.def.name, resolved.def.params.len(), arg_values.len()),
                &file,
                call_line,
            );
            return Value::None;
        }
        let pushed_file = self.current_file() != resolved.defining_file;
        if pushed_file {
            self.file_stack.push(resolved.defining_file.clone());
        }
        self.env.push_scope();
        for (param, value) in resolved.def.params.iter().zip(arg_values) {
            self.env.define(param, value);
        }
        let mut result = Value::None;
        for stmt in &resolved.def.body {
            match self.exec_stmt(stmt) {
                Ok(v) => result = v,
                Err(Signal::Return(v)) => {
                    result = v;
                    break;
                }
                Err(Signal::Break) | Err(Signal::Continue) => {
                    self.diag.error("break/continue outside of a loop", &resolved.defining_file, stmt.line());
                    break;
                }
            }
        }
        self.env.pop_scope();
        if pushed_file {
            self.file_stack.pop();
        }
        result
    }
}

/// Builds a new struct instance from the same field-name list as the
/// template `inst` was built from: calling a struct template like a
/// function constructs an instance. Extra call arguments are ignored;
/// missing ones leave their field at `Value::None`.
fn construct_from_template(inst: &Rc<RefCell<StructInstance>>, args: &[Value]) -> Value {
    let def = Rc::clone(&inst.borrow().def);
    let mut new_inst = StructInstance::blank(Rc::clone(&def));
    for (name, value) in def.field_names.iter().zip(args.iter()) {
        new_inst.fields.insert(name.clone(), value.clone());
    }
    Value::Struct(Rc::new(RefCell::new(new_inst)))
}

/// Equality used for `==`/`!=` fallback and `switch` case matching: numeric
/// values compare across `Integer`/`Double` by value; everything else
/// compares structurally. This is a deliberate generalisation beyond the
/// literal "both numeric or both boolean" operator table — see
/// `DESIGN.md`.
fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

/// Converts a value to a non-negative array index, truncating floats.
/// Negative numbers and non-numeric values yield `None`.
fn to_index(value: &Value) -> Option<usize> {
    let f = value.as_f64()?;
    if f < 0.0 {
        return None;
    }
    Some(f as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::Lexer;
    use crate::parser;

    fn run_src(src: &str) -> (Value, Diagnostics) {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new(src, "test.mt").tokenize(&mut diag);
        let statements = parser::parse(tokens, "test.mt", &mut diag);
        let functions = FunctionIndex::new();
        let registry = BuiltinRegistry::standard();
        let mut evaluator = Evaluator::new(&functions, &registry, &mut diag, "test.mt");
        let result = evaluator.run(&statements);
        (result, diag)
    }

    #[test]
    fn arithmetic_precedence_and_return() {
        let (v, diag) = run_src("return 2 + 3 * 4;");
        assert!(!diag.has_error());
        assert_eq!(v, Value::Double(14.0));
    }

    #[test]
    fn division_by_zero_yields_zero_with_no_error() {
        let (v, diag) = run_src("return 1 / 0;");
        assert_eq!(v, Value::Double(0.0));
        assert!(!diag.has_error());
    }

    #[test]
    fn string_concatenation_with_plus() {
        let (v, diag) = run_src("return \"a\" + \"b\";");
        assert!(!diag.has_error());
        assert_eq!(v, Value::String("ab".into()));
    }

    #[test]
    fn array_is_value_semantics_on_assignment() {
        let (v, diag) = run_src(
            "let a = [1, 2];\n\
             let b = a;\n\
             b[0] = 9;\n\
             return a[0];",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(1));
    }

    #[test]
    fn dictionary_is_reference_semantics() {
        let (v, diag) = run_src(
            "let a = {\"x\": 1};\n\
             let b = a;\n\
             b[\"x\"] = 5;\n\
             return a[\"x\"];",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(5));
    }

    #[test]
    fn struct_construction_and_field_mutation() {
        let (v, diag) = run_src(
            "let P = {x, y};\n\
             let p = P(3, 4);\n\
             p.x = 9;\n\
             return p.x;",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(9));
    }

    #[test]
    fn index_write_past_end_grows_array_with_none() {
        let (v, diag) = run_src(
            "let a = [];\n\
             a[3] = 7;\n\
             return a;",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Array(vec![Value::None, Value::None, Value::None, Value::Integer(7)]));
    }

    #[test]
    fn index_read_past_end_reports_error_and_returns_none() {
        let (v, diag) = run_src("let a = [1]; return a[5];");
        assert_eq!(v, Value::None);
        assert!(diag.has_error());
    }

    #[test]
    fn enum_resolves_qualified_member() {
        let (v, diag) = run_src("enum Dir { Up, Down = 10, Left, Right } return Dir.Right;");
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(12));
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let (v, diag) = run_src(
            "let i = 0;\n\
             let sum = 0;\n\
             while (i < 10) {\n\
             i = i + 1;\n\
             if (i == 5) { continue; }\n\
             if (i > 7) { break; }\n\
             sum = sum + i;\n\
             }\n\
             return sum;",
        );
        assert!(!diag.has_error());
        // 1+2+3+4 (skip 5) +6+7 = 23
        assert_eq!(v, Value::Integer(23));
    }

    #[test]
    fn foreach_sums_array() {
        let (v, diag) = run_src(
            "let a = [1, 2, 3];\n\
             let s = 0;\n\
             foreach (x in a) { s = s + x; }\n\
             return s;",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(6));
    }

    #[test]
    fn switch_falls_through_without_break() {
        let (v, diag) = run_src(
            "let s = 0;\n\
             switch (1) {\n\
             case 1: s = s + 1;\n\
             case 2: s = s + 10; break;\n\
             case 3: s = s + 100;\n\
             }\n\
             return s;",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(11));
    }

    #[test]
    fn switch_case_falling_off_the_end_does_not_also_run_default() {
        let (v, diag) = run_src(
            "let s = 0;\n\
             switch (2) {\n\
             case 1: s = s + 1;\n\
             case 2: s = s + 10;\n\
             default: s = s + 1000;\n\
             }\n\
             return s;",
        );
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(10));
    }

    #[test]
    fn function_body_without_explicit_return_yields_last_statement_value() {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new("function add(a, b) { a + b; }\nreturn add(2, 3);", "test.mt").tokenize(&mut diag);
        let statements = parser::parse(tokens, "test.mt", &mut diag);
        let mut functions = FunctionIndex::new();
        functions.index_file("test.mt", &statements);
        let registry = BuiltinRegistry::standard();
        let mut evaluator = Evaluator::new(&functions, &registry, &mut diag, "test.mt");
        let result = evaluator.run(&statements);
        assert!(!diag.has_error());
        assert_eq!(result, Value::Double(5.0));
    }

    #[test]
    fn block_without_return_yields_last_statement_value() {
        let (v, diag) = run_src("let x = 0; { x = 1; x = 2; x = 3; }");
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(3));
    }

    #[test]
    fn assign_to_unknown_name_is_silently_created() {
        let (v, diag) = run_src("x = 5; return x;");
        assert!(!diag.has_error());
        assert_eq!(v, Value::Integer(5));
    }

    #[test]
    fn private_function_not_visible_across_files_reports_error() {
        let mut diag = Diagnostics::new();
        let lib_tokens = Lexer::new("private function secret() { return 7; }", "lib.mt").tokenize(&mut diag);
        let lib_stmts = parser::parse(lib_tokens, "lib.mt", &mut diag);
        let main_tokens = Lexer::new("return secret();", "main.mt").tokenize(&mut diag);
        let main_stmts = parser::parse(main_tokens, "main.mt", &mut diag);

        let mut functions = FunctionIndex::new();
        functions.index_file("lib.mt", &lib_stmts);
        functions.index_file("main.mt", &main_stmts);

        let registry = BuiltinRegistry::standard();
        let mut evaluator = Evaluator::new(&functions, &registry, &mut diag, "main.mt");
        let result = evaluator.run(&main_stmts);
        assert_eq!(result, Value::None);
        assert!(diag.has_error());
    }

    #[test]
    fn public_function_callable_across_files() {
        let mut diag = Diagnostics::new();
        let lib_tokens = Lexer::new("public function add(a, b) { return a + b; }", "lib.mt").tokenize(&mut diag);
        let lib_stmts = parser::parse(lib_tokens, "lib.mt", &mut diag);
        let main_tokens = Lexer::new("return add(10, 5);", "main.mt").tokenize(&mut diag);
        let main_stmts = parser::parse(main_tokens, "main.mt", &mut diag);

        let mut functions = FunctionIndex::new();
        functions.index_file("lib.mt", &lib_stmts);
        functions.index_file("main.mt", &main_stmts);

        let registry = BuiltinRegistry::standard();
        let mut evaluator = Evaluator::new(&functions, &registry, &mut diag, "main.mt");
        let result = evaluator.run(&main_stmts);
        assert!(!diag.has_error());
        assert_eq!(result, Value::Double(15.0));
    }
}
