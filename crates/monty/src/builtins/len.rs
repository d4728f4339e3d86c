//! `len(value)` — element count of a String/Array/Dictionary/Struct.

use super::Builtin;
use crate::diagnostics::Diagnostics;
use crate::value::Value;

pub struct Len;

impl Builtin for Len {
    fn name(&self) -> &'static str {
        "len"
    }

    fn invoke(&self, args: &[Value], diag: &mut Diagnostics, file: &str, line: u32) -> Value {
        match args {
            [Value::String(s)] => Value::Integer(s.chars().count() as i64),
            [Value::Array(elements)] => Value::Integer(elements.len() as i64),
            [Value::Dictionary(map)] => Value::Integer(map.borrow().len() as i64),
            [Value::Struct(inst)] => Value::Integer(inst.borrow().fields.len() as i64),
            [other] => {
                diag.error(format!("len() is not supported for type '{}'", other.type_name()), file, line);
                Value::None
            }
            other => {
                diag.error(format!("len() takes 1 argument, got {}", other.len()), file, line);
                Value::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_of_string_counts_chars() {
        let mut diag = Diagnostics::new();
        let result = Len.invoke(&[Value::String("hello".into())], &mut diag, "t.mt", 1);
        assert_eq!(result, Value::Integer(5));
        assert!(!diag.has_error());
    }

    #[test]
    fn len_of_array_counts_elements() {
        let mut diag = Diagnostics::new();
        let args = [Value::Array(vec![Value::Integer(1), Value::Integer(2)])];
        assert_eq!(Len.invoke(&args, &mut diag, "t.mt", 1), Value::Integer(2));
    }

    #[test]
    fn len_of_unsupported_type_reports_error() {
        let mut diag = Diagnostics::new();
        let result = Len.invoke(&[Value::Integer(1)], &mut diag, "t.mt", 1);
        assert_eq!(result, Value::None);
        assert!(diag.has_error());
    }
}
