//! `type_of(value)` — the runtime type name of a value, as a String.

use super::Builtin;
use crate::diagnostics::Diagnostics;
use crate::value::Value;

pub struct TypeOf;

impl Builtin for TypeOf {
    fn name(&self) -> &'static str {
        "type_of"
    }

    fn invoke(&self, args: &[Value], diag: &mut Diagnostics, file: &str, line: u32) -> Value {
        match args {
            [value] => Value::String(value.type_name().to_owned()),
            other => {
                diag.error(format!("type_of() takes 1 argument, got {}", other.len()), file, line);
                Value::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_type_name() {
        let mut diag = Diagnostics::new();
        let result = TypeOf.invoke(&[Value::Integer(1)], &mut diag, "t.mt", 1);
        assert_eq!(result, Value::String("integer".into()));
        assert!(!diag.has_error());
    }
}
