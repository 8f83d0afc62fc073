use serde_json::Value;

use super::format_value;

/// Headline fields, most specific first, as JSON pointers into the result.
const HEADLINE_POINTERS: [&str; 8] = [
    "/backtest/strategy_cumulative_return_pct",
    "/strategy_cumulative_return_pct",
    "/validation/representative_return",
    "/representative_return",
    "/accept",
    "/cointegration/is_cointegrated",
    "/is_cointegrated",
    "/signals/hedge_ratio",
];

/// Print just the headline answer of the output, falling back to the first
/// field of the result object.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some((pointer, val)) = headline(result) {
        let key = pointer.rsplit('/').next().unwrap_or(pointer);
        println!("{}: {}", key, format_value(val));
        return;
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result));
}

fn headline(result: &Value) -> Option<(&'static str, &Value)> {
    HEADLINE_POINTERS
        .iter()
        .find_map(|p| result.pointer(p).filter(|v| !v.is_null()).map(|v| (*p, v)))
}
