use super::{Compilable, CompiledScript, EngineFactory, GlobalScope, ScriptEngine};
use crate::bindings::{Binding, Bindings, ScriptAccessor};
use crate::comparison::compare;
use crate::decision::{EvaluationDecision, RawValue};
use crate::errors::{EvalError, EvalResult};
use crate::expression::{parse_expr, CmpOp, Expr};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Compiling engine for the boolean expression language, e.g.
///
/// ```text
/// systemEnvironment.get('CI') == 'true' && !contains(testTags, 'slow')
/// ```
pub struct ExpressionEngine {
    globals: Arc<GlobalScope>,
}

impl ExpressionEngine {
    pub fn new() -> Self {
        Self { globals: Arc::new(GlobalScope::default()) }
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine for ExpressionEngine {
    fn name(&self) -> &str {
        "expression"
    }

    fn put_global(&self, name: &str, binding: Binding) {
        self.globals.put(name, binding);
    }

    fn eval(&self, source: &str, bindings: &Bindings) -> EvalResult<RawValue> {
        let ast = parse(source)?;
        run(&ast, &self.globals, bindings)
    }

    fn as_compilable(&self) -> Option<&dyn Compilable> {
        Some(self)
    }
}

impl Compilable for ExpressionEngine {
    fn compile(&self, source: &str) -> EvalResult<Arc<dyn CompiledScript>> {
        let ast = parse(source)?;
        Ok(Arc::new(CompiledExpression { ast, globals: Arc::clone(&self.globals) }))
    }
}

struct CompiledExpression {
    ast: Expr,
    globals: Arc<GlobalScope>,
}

impl CompiledScript for CompiledExpression {
    fn eval(&self, bindings: &Bindings) -> EvalResult<RawValue> {
        run(&self.ast, &self.globals, bindings)
    }
}

pub struct ExpressionEngineFactory;

impl EngineFactory for ExpressionEngineFactory {
    fn names(&self) -> &[&'static str] {
        &["expression"]
    }

    fn extensions(&self) -> &[&'static str] {
        &["expr"]
    }

    fn mime_types(&self) -> &[&'static str] {
        &["application/x-expression", "text/x-expression"]
    }

    fn create(&self) -> Arc<dyn ScriptEngine> {
        Arc::new(ExpressionEngine::new())
    }
}

fn parse(source: &str) -> EvalResult<Expr> {
    parse_expr(source).map_err(|e| EvalError::Parse(e.to_string()))
}

/// Intermediate value while walking the tree.
enum Val {
    Json(Value),
    Accessor(Arc<dyn ScriptAccessor>),
    Decision(EvaluationDecision),
}

impl Val {
    fn into_json(self, what: &str) -> EvalResult<Value> {
        match self {
            Val::Json(v) => Ok(v),
            Val::Accessor(a) => Err(EvalError::Runtime(format!(
                "{what} expects a value, got accessor '{}'",
                a.name()
            ))),
            Val::Decision(_) => Err(EvalError::Runtime(format!(
                "{what} expects a value, got a decision"
            ))),
        }
    }
}

struct Scope<'a> {
    globals: &'a GlobalScope,
    locals: &'a Bindings,
}

fn run(ast: &Expr, globals: &GlobalScope, bindings: &Bindings) -> EvalResult<RawValue> {
    let scope = Scope { globals, locals: bindings };
    Ok(match eval(ast, &scope)? {
        Val::Json(v) => RawValue::from(v),
        Val::Decision(d) => RawValue::Decision(d),
        Val::Accessor(a) => RawValue::Text(format!("<{}>", a.name())),
    })
}

fn eval(expr: &Expr, scope: &Scope) -> EvalResult<Val> {
    match expr {
        Expr::Literal(v) => Ok(Val::Json(v.clone())),
        Expr::Binding(name) => match scope.globals.resolve(scope.locals, name) {
            Some(Binding::Value(v)) => Ok(Val::Json(v)),
            Some(Binding::Accessor(a)) => Ok(Val::Accessor(a)),
            None => Err(EvalError::Runtime(format!("unknown binding '{name}'"))),
        },
        Expr::Call { name, args } => call(name, args, scope),
        Expr::Method { target, name, args } => method(target, name, args, scope),
        Expr::Compare(op, l, r) => {
            let a = eval(l, scope)?.into_json("comparison")?;
            let b = eval(r, scope)?.into_json("comparison")?;
            let ord = compare(&a, &b);
            let out = match op {
                CmpOp::Eq => ord == Some(Ordering::Equal),
                CmpOp::Ne => ord != Some(Ordering::Equal),
                CmpOp::Lt => ord == Some(Ordering::Less),
                CmpOp::Lte => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                CmpOp::Gt => ord == Some(Ordering::Greater),
                CmpOp::Gte => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Val::Json(Value::Bool(out)))
        }
        Expr::And(l, r) => {
            let out = truthy(l, scope)? && truthy(r, scope)?;
            Ok(Val::Json(Value::Bool(out)))
        }
        Expr::Or(l, r) => {
            let out = truthy(l, scope)? || truthy(r, scope)?;
            Ok(Val::Json(Value::Bool(out)))
        }
        Expr::Not(inner) => Ok(Val::Json(Value::Bool(!truthy(inner, scope)?))),
    }
}

fn truthy(expr: &Expr, scope: &Scope) -> EvalResult<bool> {
    let v = eval(expr, scope)?.into_json("logical operator")?;
    Ok(match v {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn string_arg(args: &[Expr], idx: usize, func: &str, scope: &Scope) -> EvalResult<String> {
    match eval(&args[idx], scope)?.into_json(func)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn call(name: &str, args: &[Expr], scope: &Scope) -> EvalResult<Val> {
    // arity is checked by the parser
    let v = match name {
        "lower" | "upper" => {
            let v = eval(&args[0], scope)?.into_json(name)?;
            match v {
                Value::String(s) if name == "lower" => Value::String(s.to_lowercase()),
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other,
            }
        }
        "length" => {
            let len = match eval(&args[0], scope)?.into_json(name)? {
                Value::Array(a) => a.len(),
                Value::Object(m) => m.len(),
                Value::String(s) => s.chars().count(),
                _ => 0,
            };
            Value::from(len as u64)
        }
        "contains" => {
            let hay = eval(&args[0], scope)?.into_json(name)?;
            let needle = eval(&args[1], scope)?.into_json(name)?;
            let found = match (&hay, &needle) {
                (Value::Array(items), _) => items
                    .iter()
                    .any(|item| compare(item, &needle) == Some(Ordering::Equal)),
                (Value::String(s), Value::String(n)) => s.contains(n.as_str()),
                (Value::Object(m), Value::String(k)) => m.contains_key(k),
                _ => false,
            };
            Value::Bool(found)
        }
        "starts_with" => {
            let s = string_arg(args, 0, name, scope)?;
            Value::Bool(s.starts_with(&string_arg(args, 1, name, scope)?))
        }
        "ends_with" => {
            let s = string_arg(args, 0, name, scope)?;
            Value::Bool(s.ends_with(&string_arg(args, 1, name, scope)?))
        }
        "enabled" => {
            return Ok(Val::Decision(EvaluationDecision::enabled(string_arg(
                args, 0, name, scope,
            )?)))
        }
        "disabled" => {
            return Ok(Val::Decision(EvaluationDecision::disabled(string_arg(
                args, 0, name, scope,
            )?)))
        }
        _ => return Err(EvalError::Runtime(format!("unknown function '{name}'"))),
    };
    Ok(Val::Json(v))
}

fn method(target: &Expr, name: &str, args: &[Expr], scope: &Scope) -> EvalResult<Val> {
    let accessor = match eval(target, scope)? {
        Val::Accessor(a) => a,
        _ => {
            return Err(EvalError::Runtime(format!(
                "method '{name}' called on a value that is not an accessor"
            )))
        }
    };
    match (name, args) {
        ("get", [key]) => {
            let key = match eval(key, scope)?.into_json("get")? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            Ok(Val::Json(accessor.get(&key).map(Value::String).unwrap_or(Value::Null)))
        }
        _ => Err(EvalError::Runtime(format!(
            "accessor '{}' has no method '{name}' taking {} argument(s)",
            accessor.name(),
            args.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::SystemPropertyAccessor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine() -> ExpressionEngine {
        let e = ExpressionEngine::new();
        let props: std::collections::HashMap<String, String> =
            [("mode".to_string(), "ci".to_string())].into_iter().collect();
        e.put_global(
            "systemProperty",
            Binding::Accessor(Arc::new(SystemPropertyAccessor::new(props))),
        );
        e
    }

    fn eval_str(src: &str, b: &Bindings) -> RawValue {
        engine().eval(src, b).unwrap()
    }

    #[test]
    fn literals_and_operators() {
        let b = Bindings::new();
        assert_eq!(eval_str("true", &b), RawValue::Boolean(true));
        assert_eq!(eval_str("'x'", &b), RawValue::Text("x".into()));
        assert_eq!(eval_str("null", &b), RawValue::Other(Value::Null));
        assert_eq!(eval_str("1 == 1.0", &b), RawValue::Boolean(true));
        assert_eq!(eval_str("2 >= 3 || !(1 < 0)", &b), RawValue::Boolean(true));
        assert_eq!(eval_str("'10' > 9 && 'a' != 'b'", &b), RawValue::Boolean(true));
    }

    #[test]
    fn accessors_and_bindings() {
        let mut b = Bindings::new();
        b.insert("testTags", json!(["fast", "db"]));
        b.insert("testDisplayName", json!("Adds Numbers"));

        assert_eq!(eval_str("systemProperty.get('mode') == 'ci'", &b), RawValue::Boolean(true));
        assert_eq!(eval_str("systemProperty.get('missing')", &b), RawValue::Other(Value::Null));
        assert_eq!(eval_str("contains(testTags, 'db')", &b), RawValue::Boolean(true));
        assert_eq!(eval_str("length(testTags)", &b), RawValue::Other(json!(2)));
        assert_eq!(
            eval_str("starts_with(lower(testDisplayName), 'adds')", &b),
            RawValue::Boolean(true)
        );
        assert_eq!(eval_str("upper(testDisplayName)", &b), RawValue::Text("ADDS NUMBERS".into()));
    }

    #[test]
    fn decision_functions() {
        let b = Bindings::new();
        assert_eq!(
            eval_str("disabled('not today')", &b),
            RawValue::Decision(EvaluationDecision::disabled("not today"))
        );
    }

    #[test]
    fn runtime_errors() {
        let e = engine();
        let b = Bindings::new();
        assert!(matches!(e.eval("missing == 1", &b), Err(EvalError::Runtime(_))));
        assert!(matches!(e.eval("systemProperty.put('a')", &b), Err(EvalError::Runtime(_))));
        assert!(matches!(e.eval("'a'.get('b')", &b), Err(EvalError::Runtime(_))));
        assert!(matches!(e.eval("systemProperty == 1", &b), Err(EvalError::Runtime(_))));
        assert!(matches!(e.eval("1 ==", &b), Err(EvalError::Parse(_))));
    }

    #[test]
    fn compiled_script_sees_later_globals() {
        let e = ExpressionEngine::new();
        let compiled = e.compile("flag").unwrap();
        e.put_global("flag", Binding::Value(json!(true)));
        assert_eq!(compiled.eval(&Bindings::new()).unwrap(), RawValue::Boolean(true));

        let mut local = Bindings::new();
        local.insert("flag", json!(false));
        assert_eq!(compiled.eval(&local).unwrap(), RawValue::Boolean(false));
    }
}
