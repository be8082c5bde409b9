use crate::decision::{EvaluationDecision, RawValue};
use crate::script::{ConditionKind, Script};

/// Turn a raw script result into the decision for the script's condition kind.
///
/// A decision produced by the script itself passes through untouched. Any
/// other result is stringified into the reason template and coerced to a
/// boolean: native booleans are used as-is, text is `true` only when it
/// reads `true` ignoring case. Unrecognized text is `false`, never an error.
pub fn decide(script: &Script, raw: RawValue) -> EvaluationDecision {
    if let RawValue::Decision(decision) = raw {
        return decision;
    }
    let text = raw.to_string();
    let reason = script.to_reason_string(&text);
    let is_true = match raw {
        RawValue::Boolean(b) => b,
        _ => parse_boolean(&text),
    };

    match (script.kind(), is_true) {
        (ConditionKind::Enable, true) | (ConditionKind::Disable, false) => {
            EvaluationDecision::enabled(reason)
        }
        (ConditionKind::Enable, false) | (ConditionKind::Disable, true) => {
            EvaluationDecision::disabled(reason)
        }
    }
}

fn parse_boolean(text: &str) -> bool {
    text.eq_ignore_ascii_case("true")
}
