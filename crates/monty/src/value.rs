//! Runtime values.
//!
//! `Integer`, `Double`, `Boolean`, `String`, and `Array` have value
//! semantics: assigning or passing one copies it. `Dictionary` and `Struct`
//! have reference semantics: two variables can name the same underlying
//! `Rc<RefCell<..>>` and observe each other's mutations.
//! `Value` derives `Clone` directly (unlike some bytecode-VM designs that
//! hand-roll a heap with manual refcounting) because `Rc::clone` already
//! gives the sharing behaviour the dictionary/struct variants need, and the
//! scalar variants are cheap to copy outright.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::NumberLit;

/// The ordered field-name list shared by a struct template and every
/// instance constructed from it.
#[derive(Debug, PartialEq)]
pub struct StructDef {
    pub field_names: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub struct StructInstance {
    pub def: Rc<StructDef>,
    pub fields: IndexMap<String, Value>,
}

impl StructInstance {
    /// Builds a fresh instance from `def` with every field at `Value::None`.
    pub fn blank(def: Rc<StructDef>) -> Self {
        let fields = def.field_names.iter().cloned().map(|name| (name, Value::None)).collect();
        Self { def, fields }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Array(Vec<Value>),
    Dictionary(Rc<RefCell<IndexMap<String, Value>>>),
    Struct(Rc<RefCell<StructInstance>>),
}

impl Value {
    pub fn from_number_lit(lit: NumberLit) -> Self {
        match lit {
            NumberLit::Int(i) => Self::Integer(i),
            NumberLit::Float(f) => Self::Double(f),
        }
    }

    /// Numerics are truthy iff non-zero (including NaN, which is
    /// non-zero), strings/containers iff non-empty, `None` is always
    /// falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Double(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(elements) => !elements.is_empty(),
            Self::Dictionary(map) => !map.borrow().is_empty(),
            Self::Struct(inst) => !inst.borrow().fields.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dictionary(_) => "dictionary",
            Self::Struct(_) => "struct",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Double(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{}", format_double(*d)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(elements) => {
                write!(f, "[")?;
                for (idx, element) in elements.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Self::Dictionary(map) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in map.borrow().iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Struct(inst) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in inst.borrow().fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Trims trailing zeros from a double's decimal form and drops the decimal
/// point entirely when the value is integral.
fn format_double(d: f64) -> String {
    if d.fract() == 0.0 && d.is_finite() {
        return format!("{d:.0}");
    }
    let mut s = format!("{d}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_double_prints_without_decimal_point() {
        assert_eq!(Value::Double(4.0).to_string(), "4");
    }

    #[test]
    fn fractional_double_trims_trailing_zeros() {
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(Value::Double(0.1).to_string(), "0.1");
    }

    #[test]
    fn array_display_matches_bracket_form() {
        let v = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(v.to_string(), "[1, 2]");
    }

    #[test]
    fn dictionary_aliases_share_mutations() {
        let map: Rc<RefCell<IndexMap<String, Value>>> = Rc::new(RefCell::new(IndexMap::new()));
        map.borrow_mut().insert("x".into(), Value::Integer(1));
        let a = Value::Dictionary(Rc::clone(&map));
        let b = a.clone();
        if let Value::Dictionary(inner) = &b {
            inner.borrow_mut().insert("x".into(), Value::Integer(5));
        }
        if let Value::Dictionary(inner) = &a {
            assert_eq!(inner.borrow().get("x"), Some(&Value::Integer(5)));
        }
    }

    #[test]
    fn array_assignment_copies_not_aliases() {
        let a = Value::Array(vec![Value::Integer(1)]);
        let mut b = a.clone();
        if let Value::Array(elements) = &mut b {
            elements[0] = Value::Integer(9);
        }
        assert_eq!(a, Value::Array(vec![Value::Integer(1)]));
    }

    #[test]
    fn truthiness_follows_type_specific_rules() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Double(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Array(vec![Value::Integer(0)]).is_truthy());
    }
}
