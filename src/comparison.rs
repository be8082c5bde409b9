use serde_json::Value;
use std::cmp::Ordering;

/// Order two values for the comparison operators. Numbers and numeric
/// strings compare numerically; values of unrelated types are unordered.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::String(sa), Value::String(sb)) => Some(sa.cmp(sb)),
        (Value::Number(na), Value::Number(nb)) => match (na.as_f64(), nb.as_f64()) {
            (Some(da), Some(db)) => cmp_f64(da, db),
            _ => (na == nb).then_some(Ordering::Equal),
        },
        (Value::Bool(ba), Value::Bool(bb)) => Some(ba.cmp(bb)),
        (Value::Number(na), Value::String(sb)) => {
            let db = sb.trim().parse::<f64>().ok()?;
            cmp_f64(na.as_f64()?, db)
        }
        (Value::String(sa), Value::Number(nb)) => {
            let da = sa.trim().parse::<f64>().ok()?;
            cmp_f64(da, nb.as_f64()?)
        }
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            (a == b).then_some(Ordering::Equal)
        }
        _ => None,
    }
}

fn cmp_f64(a: f64, b: f64) -> Option<Ordering> {
    if (a - b).abs() < f64::EPSILON {
        Some(Ordering::Equal)
    } else {
        a.partial_cmp(&b)
    }
}
