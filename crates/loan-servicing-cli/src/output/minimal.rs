use serde_json::Value;

/// Headline figure per view, first match wins.
const PRIORITY_KEYS: [&str; 8] = [
    "total_receivable",
    "projected_collection_rate",
    "percent_paid",
    "outstanding_principal",
    "metrics",
    "summary",
    "totals",
    "due_soon",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", headline(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(rows) = result_obj {
        println!("{} row(s)", rows.len());
        return;
    }

    println!("{}", format_minimal(result_obj));
}

/// Nested sections reduce to their own headline.
fn headline(value: &Value) -> String {
    if let Value::Object(inner) = value {
        for key in &PRIORITY_KEYS {
            if let Some(val) = inner.get(*key) {
                if !val.is_null() && !val.is_object() {
                    return format_minimal(val);
                }
            }
        }
    }
    format_minimal(value)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
