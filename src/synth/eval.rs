use crate::synth::ast::Term;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

pub type Bindings = BTreeMap<String, Value>;

const MAX_REPEAT: i64 = 4096;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("cannot evaluate an unfilled hole")]
    UnfilledHole,
    #[error("{op}: unsupported operand {actual}")]
    TypeMismatch { op: String, actual: Value },
    #[error("{op}: index {index} out of range")]
    OutOfRange { op: String, index: i64 },
    #[error("{op}: arithmetic overflow")]
    Overflow { op: String },
    #[error("{op}: {message}")]
    Invalid { op: String, message: String },
}

/// Runs a closed term against concrete variable bindings.
pub fn eval(term: &Term, bindings: &Bindings) -> Result<Value, EvalError> {
    match term {
        Term::Literal(value) => Ok(value.clone()),
        Term::VariableRef(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
        Term::Hole(_) => Err(EvalError::UnfilledHole),
        Term::MethodCall {
            receiver,
            name,
            args,
        } => {
            let receiver = eval(receiver, bindings)?;
            let args = eval_all(args, bindings)?;
            eval_method(&receiver, name, &args)
        }
        Term::FieldAccess {
            receiver,
            name,
            args,
        } => {
            let receiver = eval(receiver, bindings)?;
            let args = eval_all(args, bindings)?;
            match &receiver {
                Value::Object(map) if args.is_empty() => map
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::Invalid {
                        op: name.clone(),
                        message: "missing field".to_string(),
                    }),
                _ => eval_method(&receiver, name, &args),
            }
        }
        Term::ArrayLiteral(items) => Ok(Value::Array(eval_all(items, bindings)?)),
        Term::RecordLiteral(entries) => {
            let mut out = Map::new();
            for (key, value) in entries {
                out.insert(key.clone(), eval(value, bindings)?);
            }
            Ok(Value::Object(out))
        }
        Term::SliceExpr {
            receiver,
            start,
            end,
            reversed,
        } => {
            let receiver = eval(receiver, bindings)?;
            let start = eval_bound(start.as_deref(), bindings)?;
            let end = eval_bound(end.as_deref(), bindings)?;
            eval_slice(&receiver, start, end, *reversed)
        }
    }
}

fn eval_all(terms: &[Term], bindings: &Bindings) -> Result<Vec<Value>, EvalError> {
    terms.iter().map(|term| eval(term, bindings)).collect()
}

fn eval_bound(bound: Option<&Term>, bindings: &Bindings) -> Result<Option<i64>, EvalError> {
    let Some(term) = bound else {
        return Ok(None);
    };
    let value = eval(term, bindings)?;
    value
        .as_i64()
        .map(Some)
        .ok_or_else(|| mismatch("slice", &value))
}

fn eval_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match (name, receiver, args) {
        ("add", _, [rhs]) => eval_add(receiver, rhs),
        ("mul", _, [rhs]) => eval_mul(receiver, rhs),
        ("upper", Value::String(s), []) => Ok(Value::String(s.to_uppercase())),
        ("lower", Value::String(s), []) => Ok(Value::String(s.to_lowercase())),
        ("capitalize", Value::String(s), []) => Ok(Value::String(capitalize(s))),
        ("title", Value::String(s), []) => Ok(Value::String(title_case(s))),
        ("strip", Value::String(s), []) => Ok(Value::String(s.trim().to_string())),
        ("length", Value::String(s), []) => Ok(Value::from(s.chars().count())),
        ("length", Value::Array(items), []) => Ok(Value::from(items.len())),
        ("length", Value::Object(map), []) => Ok(Value::from(map.len())),
        ("split", Value::String(s), [Value::String(sep)]) => {
            if sep.is_empty() {
                return Err(EvalError::Invalid {
                    op: "split".to_string(),
                    message: "empty separator".to_string(),
                });
            }
            Ok(Value::Array(
                s.split(sep.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ))
        }
        ("index", Value::String(s), [index]) => {
            let index = int_arg("index", index)?;
            let chars: Vec<char> = s.chars().collect();
            let at = resolve_index(index, chars.len())
                .ok_or(EvalError::OutOfRange {
                    op: "index".to_string(),
                    index,
                })?;
            Ok(Value::String(chars[at].to_string()))
        }
        ("index", Value::Array(items), [index]) => {
            let index = int_arg("index", index)?;
            let at = resolve_index(index, items.len()).ok_or(EvalError::OutOfRange {
                op: "index".to_string(),
                index,
            })?;
            Ok(items[at].clone())
        }
        ("first", Value::Array(items), []) => items.first().cloned().ok_or(EvalError::OutOfRange {
            op: "first".to_string(),
            index: 0,
        }),
        ("last", Value::Array(items), []) => items.last().cloned().ok_or(EvalError::OutOfRange {
            op: "last".to_string(),
            index: -1,
        }),
        ("join", Value::Array(items), [Value::String(sep)]) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(match item {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => return Err(mismatch("join", other)),
                });
            }
            Ok(Value::String(parts.join(sep)))
        }
        ("to_int", Value::String(s), []) => {
            s.trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| EvalError::Invalid {
                    op: "to_int".to_string(),
                    message: err.to_string(),
                })
        }
        ("to_int", Value::Number(n), []) if n.is_i64() => Ok(receiver.clone()),
        ("to_str", Value::Number(n), []) => Ok(Value::String(n.to_string())),
        ("to_str", Value::String(_), []) => Ok(receiver.clone()),
        _ => Err(EvalError::Invalid {
            op: name.to_string(),
            message: format!("unsupported on {} with {} argument(s)", type_name(receiver), args.len()),
        }),
    }
}

fn eval_add(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x.checked_add(y).map(Value::from).ok_or(EvalError::Overflow {
                op: "add".to_string(),
            }),
            _ => float_result("add", a.as_f64(), b.as_f64(), |x, y| x + y),
        },
        (Value::Number(_), other) | (other, _) => Err(mismatch("add", other)),
    }
}

fn eval_mul(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x.checked_mul(y).map(Value::from).ok_or(EvalError::Overflow {
                op: "mul".to_string(),
            }),
            _ => float_result("mul", a.as_f64(), b.as_f64(), |x, y| x * y),
        },
        (Value::String(s), Value::Number(n)) => match n.as_i64() {
            Some(times) if (0..=MAX_REPEAT).contains(&times) => {
                Ok(Value::String(s.repeat(times as usize)))
            }
            _ => Err(mismatch("mul", rhs)),
        },
        (Value::Number(_), other) | (Value::String(_), other) | (other, _) => {
            Err(mismatch("mul", other))
        }
    }
}

fn float_result(
    op: &str,
    lhs: Option<f64>,
    rhs: Option<f64>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let (Some(x), Some(y)) = (lhs, rhs) else {
        return Err(EvalError::Overflow { op: op.to_string() });
    };
    Number::from_f64(f(x, y))
        .map(Value::Number)
        .ok_or(EvalError::Overflow { op: op.to_string() })
}

fn eval_slice(
    receiver: &Value,
    start: Option<i64>,
    end: Option<i64>,
    reversed: bool,
) -> Result<Value, EvalError> {
    match receiver {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (from, to) = slice_range(start, end, chars.len());
            let mut part: Vec<char> = chars[from..to].to_vec();
            if reversed {
                part.reverse();
            }
            Ok(Value::String(part.into_iter().collect()))
        }
        Value::Array(items) => {
            let (from, to) = slice_range(start, end, items.len());
            let mut part = items[from..to].to_vec();
            if reversed {
                part.reverse();
            }
            Ok(Value::Array(part))
        }
        other => Err(mismatch("slice", other)),
    }
}

/// Clamped half-open range; negative offsets count from the end.
fn slice_range(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let clamp = |offset: i64| -> usize {
        if offset < 0 {
            (len as i64 + offset).max(0) as usize
        } else {
            (offset as usize).min(len)
        }
    };
    let from = start.map_or(0, clamp);
    let to = end.map_or(len, clamp);
    (from, to.max(from))
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

fn int_arg(op: &str, value: &Value) -> Result<i64, EvalError> {
    value.as_i64().ok_or_else(|| mismatch(op, value))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_alpha = false;
    for ch in s.chars() {
        if previous_alpha {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        previous_alpha = ch.is_alphabetic();
    }
    out
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "record",
    }
}

fn mismatch(op: &str, actual: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.to_string(),
        actual: actual.clone(),
    }
}
