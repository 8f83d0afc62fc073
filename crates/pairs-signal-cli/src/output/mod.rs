pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Split an object into dotted scalar fields and named record lists.
///
/// Nested objects are flattened (`cointegration.p_value`); arrays of
/// objects such as signal rows or ledger days are returned separately.
pub fn split_fields(value: &Value) -> (Vec<(String, Value)>, Vec<(String, Vec<Value>)>) {
    let mut scalars = Vec::new();
    let mut records = Vec::new();
    collect(String::new(), value, &mut scalars, &mut records);
    (scalars, records)
}

fn collect(
    prefix: String,
    value: &Value,
    scalars: &mut Vec<(String, Value)>,
    records: &mut Vec<(String, Vec<Value>)>,
) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect(path, val, scalars, records);
            }
        }
        Value::Array(items) if items.first().map_or(false, Value::is_object) => {
            records.push((prefix, items.clone()));
        }
        _ => scalars.push((prefix, value.clone())),
    }
}

/// Render a scalar for a text cell.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_fields() {
        let v = json!({
            "cointegration": {"p_value": 0.01, "critical_values": {"five_pct": -3.3}},
            "horizons": [1, 3],
            "rows": [{"date": "2024-01-01"}],
        });
        let (scalars, records) = split_fields(&v);
        let keys: Vec<&str> = scalars.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"cointegration.p_value"));
        assert!(keys.contains(&"cointegration.critical_values.five_pct"));
        assert!(keys.contains(&"horizons"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "rows");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "");
        assert_eq!(format_value(&json!([1, 3])), "1, 3");
        assert_eq!(format_value(&json!(true)), "true");
    }
}
