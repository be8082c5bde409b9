use proptest::prelude::*;
use script_conditions::{decide, ConditionKind, EvaluationDecision, RawValue, Script};

fn script(kind: ConditionKind, reason: &str) -> Script {
    Script::new(kind, "stub", "x", reason).unwrap()
}

fn raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        any::<bool>().prop_map(RawValue::Boolean),
        ".*".prop_map(RawValue::Text),
        prop_oneof![Just("true"), Just("TRUE"), Just("True"), Just("false")]
            .prop_map(RawValue::from),
        any::<i64>().prop_map(|n| RawValue::Other(n.into())),
        Just(RawValue::Other(serde_json::Value::Null)),
    ]
}

proptest! {
    #[test]
    fn polarity_law(raw in raw_value(), reason in "[a-z{}]{0,12}") {
        let on = decide(&script(ConditionKind::Enable, &reason), raw.clone());
        let off = decide(&script(ConditionKind::Disable, &reason), raw);
        prop_assert_eq!(on.enabled, !off.enabled);
    }

    #[test]
    fn coercion_law(text in ".*") {
        let expected = text.eq_ignore_ascii_case("true");
        let d = decide(&script(ConditionKind::Enable, "{result}"), RawValue::Text(text.clone()));
        prop_assert_eq!(d.enabled, expected);
        prop_assert_eq!(d.reason, text);
    }

    #[test]
    fn bypass_law(enabled in any::<bool>(), reason in ".*", disable in any::<bool>()) {
        let own = EvaluationDecision { enabled, reason };
        let kind = if disable { ConditionKind::Disable } else { ConditionKind::Enable };
        let d = decide(&script(kind, "ignored"), RawValue::Decision(own.clone()));
        prop_assert_eq!(d, own);
    }
}

#[test]
fn listed_strings_that_are_false() {
    for text in ["", "false", "1", "yes", "t", "true!"] {
        let d = decide(&script(ConditionKind::Enable, "{result}"), text.into());
        assert!(!d.enabled, "{text:?} should coerce to false");
    }
}
