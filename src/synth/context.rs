use crate::synth::ast::Term;
use crate::synth::types::Type;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub type Environment = BTreeMap<String, Type>;

/// Priority of a partial program; lower is explored first.
pub type Scorer = fn(&Term) -> usize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralPools {
    pub strings: Vec<String>,
    pub ints: Vec<i64>,
}

impl LiteralPools {
    pub fn new(strings: Vec<String>, ints: Vec<i64>) -> LiteralPools {
        LiteralPools { strings, ints }
    }

    pub fn literals(&self) -> impl Iterator<Item = Value> + '_ {
        self.ints
            .iter()
            .map(|n| Value::from(*n))
            .chain(self.strings.iter().map(|s| Value::String(s.clone())))
    }
}

/// Everything one synthesis call reads. Built before the call and never
/// mutated by the engine.
#[derive(Clone)]
pub struct Context {
    pub environment: Environment,
    pub goal: Type,
    pub pools: LiteralPools,
    pub max_size: usize,
    pub scorer: Scorer,
    pub timeout: Option<Duration>,
}

impl Context {
    pub const DEFAULT_MAX_SIZE: usize = 8;

    pub fn new(environment: Environment, goal: Type) -> Context {
        Context {
            environment,
            goal,
            pools: LiteralPools::default(),
            max_size: Context::DEFAULT_MAX_SIZE,
            scorer: Term::size,
            timeout: None,
        }
    }

    pub fn with_pools(mut self, pools: LiteralPools) -> Context {
        self.pools = pools;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Context {
        self.max_size = max_size;
        self
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Context {
        self.scorer = scorer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Context {
        self.timeout = Some(timeout);
        self
    }

    pub fn score(&self, program: &Term) -> usize {
        (self.scorer)(program)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("environment", &self.environment)
            .field("goal", &self.goal)
            .field("pools", &self.pools)
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
