use crate::synth::ast::Term;
use crate::synth::context::Environment;
use crate::synth::eval::{Bindings, EvalError, eval};
use crate::synth::types::Type;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure of the oracle itself, as opposed to a candidate failing it.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(String),
    #[error("oracle i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Decides whether a closed candidate behaves as required.
pub trait TestOracle {
    fn test(&mut self, program: &Term) -> Result<bool, OracleError>;

    /// Number of examples behind this oracle, for instrumentation.
    fn example_count(&self) -> usize {
        0
    }
}

impl<F> TestOracle for F
where
    F: FnMut(&Term) -> Result<bool, OracleError>,
{
    fn test(&mut self, program: &Term) -> Result<bool, OracleError> {
        self(program)
    }
}

/// Wraps an infallible predicate.
pub struct PredicateOracle<F> {
    predicate: F,
}

impl<F: FnMut(&Term) -> bool> PredicateOracle<F> {
    pub fn new(predicate: F) -> PredicateOracle<F> {
        PredicateOracle { predicate }
    }
}

impl<F: FnMut(&Term) -> bool> TestOracle for PredicateOracle<F> {
    fn test(&mut self, program: &Term) -> Result<bool, OracleError> {
        Ok((self.predicate)(program))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub inputs: Vec<Value>,
    pub output: Value,
}

impl Example {
    pub fn new(inputs: Vec<Value>, output: Value) -> Example {
        Example { inputs, output }
    }

    pub fn bindings(&self) -> Bindings {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, value)| (argument_name(i), value.clone()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExampleCheck {
    pub passed: bool,
    pub actual: Option<Value>,
    pub error: Option<EvalError>,
}

/// Runs candidates through the reference evaluator against every example.
/// Evaluation errors count as a failed candidate.
#[derive(Clone, Debug)]
pub struct ExampleOracle {
    examples: Vec<Example>,
}

impl ExampleOracle {
    pub fn new(examples: Vec<Example>) -> ExampleOracle {
        ExampleOracle { examples }
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn check(&self, program: &Term) -> Vec<ExampleCheck> {
        self.examples
            .iter()
            .map(|example| match eval(program, &example.bindings()) {
                Ok(actual) => ExampleCheck {
                    passed: json_equiv(&actual, &example.output),
                    actual: Some(actual),
                    error: None,
                },
                Err(err) => ExampleCheck {
                    passed: false,
                    actual: None,
                    error: Some(err),
                },
            })
            .collect()
    }
}

impl TestOracle for ExampleOracle {
    fn test(&mut self, program: &Term) -> Result<bool, OracleError> {
        Ok(self.examples.iter().all(|example| {
            eval(program, &example.bindings())
                .is_ok_and(|actual| json_equiv(&actual, &example.output))
        }))
    }

    fn example_count(&self) -> usize {
        self.examples.len()
    }
}

pub fn argument_name(index: usize) -> String {
    format!("arg{index}")
}

/// `arg{i}` keeps its precise type when every example agrees on it, and
/// widens to the union of promoted types otherwise.
pub fn environment_from_examples(examples: &[Example]) -> Environment {
    let arity = examples.iter().map(|e| e.inputs.len()).min().unwrap_or(0);
    (0..arity)
        .map(|i| {
            let types: Vec<Type> = examples.iter().map(|e| Type::wrap(&e.inputs[i])).collect();
            (argument_name(i), agreed_or_promoted(types))
        })
        .collect()
}

/// Union of the promoted output types.
pub fn goal_from_examples(examples: &[Example]) -> Type {
    Type::union(examples.iter().map(|e| Type::wrap(&e.output).promote()))
}

fn agreed_or_promoted(types: Vec<Type>) -> Type {
    match types.split_first() {
        Some((first, rest)) if rest.iter().all(|t| t == first) => first.clone(),
        _ => Type::union(types.iter().map(Type::promote)),
    }
}

fn json_equiv(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => (x - y).abs() <= 1e-9,
                _ => a == b,
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equiv(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| json_equiv(xv, yv)))
        }
        _ => lhs == rhs,
    }
}
