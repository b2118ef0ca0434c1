use serde_json::Value;

/// Loose truthiness used by clients that treat `""`, `0`, `false` and `null`
/// as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `Some` when the field is present and truthy.
pub fn truthy<'a>(value: Option<&'a Value>) -> Option<&'a Value> {
    value.filter(|value| is_truthy(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn falsy_values() {
        for value in [json!(null), json!(false), json!(""), json!(0), json!(0.0)] {
            assert!(!is_truthy(&value), "{value}");
        }
        for value in [json!(true), json!("x"), json!(1), json!([]), json!({})] {
            assert!(is_truthy(&value), "{value}");
        }
    }
}
