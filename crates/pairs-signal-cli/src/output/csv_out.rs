use serde_json::Value;
use std::io;

use super::{format_value, split_fields};

/// Write output as CSV to stdout.
///
/// When the result carries record lists, the longest one (signal rows or
/// ledger days, typically) is written as the table; otherwise the scalar
/// results are written as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    let (scalars, records) = split_fields(result);

    match records.iter().max_by_key(|(_, items)| items.len()) {
        Some((_, items)) => write_records(&mut wtr, items),
        None => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in &scalars {
                let _ = wtr.write_record([key.as_str(), &format_value(val)]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, items: &[Value]) {
    let Some(Value::Object(first)) = items.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in items {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_records() {
        let items = vec![
            json!({"date": "2024-01-02", "flag": true, "rank": null}),
            json!({"date": "2024-01-03", "flag": false, "rank": 2}),
        ];
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_records(&mut wtr, &items);
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "date,flag,rank\n2024-01-02,true,\n2024-01-03,false,2\n");
    }
}
