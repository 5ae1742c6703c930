pub mod ast;
pub mod catalog;
pub mod context;
pub mod eval;
pub mod examples;
pub mod expand;
pub mod generator;
pub mod interp;
pub mod oracle;
pub mod search;
pub mod stats;
pub mod templates;
pub mod types;

pub use ast::{Hole, HoleCounts, HoleKind, Term};
pub use catalog::{CatalogError, Signature, SignatureCatalog};
pub use context::{Context, Environment, LiteralPools, Scorer};
pub use eval::{Bindings, EvalError, eval};
pub use examples::{DemoTask, all_tasks, find_task};
pub use expand::{
    CandidateRule, ExpansionLimits, HoleExpansion, Scope, StandardExpander, admits,
};
pub use generator::generate_value;
pub use interp::{TypeInterpretationError, interpret};
pub use oracle::{
    Example, ExampleCheck, ExampleOracle, OracleError, PredicateOracle, TestOracle,
    argument_name, environment_from_examples, goal_from_examples,
};
pub use search::{Solution, SynthError, Synthesizer};
pub use stats::SynthesisStats;
pub use templates::KeyValueTemplates;
pub use types::{Type, promote, subtype};
