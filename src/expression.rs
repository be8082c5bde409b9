// src/expression.rs
use crate::parser::{ParseError, Parser};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Reference to a binding, e.g. `testDisplayName`.
    Binding(String),
    Call { name: String, args: Vec<Expr> },
    /// `target.name(args)`, e.g. `systemProperty.get('os.name')`.
    Method { target: Box<Expr>, name: String, args: Vec<Expr> },
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// Built-in functions with their arity.
pub const FUNCTIONS: &[(&str, usize)] = &[
    ("lower", 1),
    ("upper", 1),
    ("length", 1),
    ("contains", 2),
    ("starts_with", 2),
    ("ends_with", 2),
    ("enabled", 1),
    ("disabled", 1),
];

pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut p = Parser::new(input);
    let node = parse_or(&mut p)?;
    p.skip_ws();
    if !p.eof() {
        return Err(p.error("trailing input"));
    }
    Ok(node)
}

fn parse_or(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut left = parse_and(p)?;
    loop {
        p.skip_ws();
        if p.consume_str("||") {
            let right = parse_and(p)?;
            left = Expr::Or(Box::new(left), Box::new(right));
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_and(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut left = parse_not(p)?;
    loop {
        p.skip_ws();
        if p.consume_str("&&") {
            let right = parse_not(p)?;
            left = Expr::And(Box::new(left), Box::new(right));
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_not(p: &mut Parser) -> Result<Expr, ParseError> {
    p.skip_ws();
    if !p.peek_str("!=") && p.consume_char('!') {
        let inner = parse_not(p)?;
        Ok(Expr::Not(Box::new(inner)))
    } else {
        parse_compare(p)
    }
}

fn parse_compare(p: &mut Parser) -> Result<Expr, ParseError> {
    let left = parse_postfix(p)?;
    p.skip_ws();
    let op = if p.consume_str("==") {
        CmpOp::Eq
    } else if p.consume_str("!=") {
        CmpOp::Ne
    } else if p.consume_str("<=") {
        CmpOp::Lte
    } else if p.consume_str(">=") {
        CmpOp::Gte
    } else if p.consume_char('<') {
        CmpOp::Lt
    } else if p.consume_char('>') {
        CmpOp::Gt
    } else {
        return Ok(left);
    };
    let right = parse_postfix(p)?;
    Ok(Expr::Compare(op, Box::new(left), Box::new(right)))
}

fn parse_postfix(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut node = parse_primary(p)?;
    loop {
        p.skip_ws();
        if !p.consume_char('.') {
            break;
        }
        p.skip_ws();
        let name = p.parse_identifier()?;
        p.skip_ws();
        p.expect('(')?;
        let args = parse_args(p)?;
        node = Expr::Method { target: Box::new(node), name, args };
    }
    Ok(node)
}

fn parse_primary(p: &mut Parser) -> Result<Expr, ParseError> {
    p.skip_ws();
    match p.peek_char() {
        Some('"') | Some('\'') => return Ok(Expr::Literal(Value::String(p.parse_quoted_string()?))),
        Some('(') => {
            p.consume_char('(');
            let inner = parse_or(p)?;
            p.skip_ws();
            p.expect(')')?;
            return Ok(inner);
        }
        Some(c) if c == '-' || c.is_ascii_digit() => {
            return Ok(Expr::Literal(p.parse_number_literal()?));
        }
        None => return Err(p.error("unexpected end of input")),
        _ => {}
    }
    if p.consume_keyword("true") {
        return Ok(Expr::Literal(Value::Bool(true)));
    }
    if p.consume_keyword("false") {
        return Ok(Expr::Literal(Value::Bool(false)));
    }
    if p.consume_keyword("null") {
        return Ok(Expr::Literal(Value::Null));
    }

    let name = p.parse_identifier()?;
    p.skip_ws();
    if !p.consume_char('(') {
        return Ok(Expr::Binding(name));
    }
    let args = parse_args(p)?;
    match FUNCTIONS.iter().find(|(f, _)| *f == name) {
        None => Err(p.error(format!("unknown function '{name}'"))),
        Some((_, arity)) if *arity != args.len() => Err(p.error(format!(
            "function '{name}' takes {arity} argument(s), got {}",
            args.len()
        ))),
        Some(_) => Ok(Expr::Call { name, args }),
    }
}

/// Parse a comma separated argument list; the opening `(` is already consumed.
fn parse_args(p: &mut Parser) -> Result<Vec<Expr>, ParseError> {
    let mut out = Vec::new();
    p.skip_ws();
    if p.consume_char(')') {
        return Ok(out);
    }
    loop {
        out.push(parse_or(p)?);
        p.skip_ws();
        if p.consume_char(',') {
            continue;
        }
        p.expect(')')?;
        break;
    }
    Ok(out)
}
