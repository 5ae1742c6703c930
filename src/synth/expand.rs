use crate::synth::ast::{Hole, Term};
use crate::synth::catalog::SignatureCatalog;
use crate::synth::context::Context;
use crate::synth::templates::KeyValueTemplates;
use crate::synth::types::{ARRAY, Type};
use log::trace;
use std::fmt;

/// Produces candidate fillings for one hole. Candidates are only plausible
/// by declared type; the search loop does the checking.
pub trait HoleExpansion {
    fn expand(&self, hole: &Hole, ctx: &Context, catalog: &SignatureCatalog) -> Vec<Term>;
}

/// Bounds on the speculative templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpansionLimits {
    pub max_array_arity: usize,
    pub max_array_candidates: usize,
    pub max_record_fields: usize,
    pub max_key_value_pairs: usize,
    /// `add` triples are only emitted when there are at most this many
    /// integer operands.
    pub max_triple_operands: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        ExpansionLimits {
            max_array_arity: 3,
            max_array_candidates: 64,
            max_record_fields: 4,
            max_key_value_pairs: 3,
            max_triple_operands: 3,
        }
    }
}

/// What a rule may look at while producing candidates.
pub struct Scope<'a> {
    pub context: &'a Context,
    pub catalog: &'a SignatureCatalog,
    pub limits: &'a ExpansionLimits,
}

impl Scope<'_> {
    /// Environment variables whose type satisfies `keep`, in name order.
    pub fn variables(&self, keep: impl Fn(&Type) -> bool) -> Vec<Term> {
        self.context
            .environment
            .iter()
            .filter(|(_, ty)| keep(ty))
            .map(|(name, _)| Term::var(name.clone()))
            .collect()
    }

    pub fn pool_literals(&self, keep: impl Fn(&Type) -> bool) -> Vec<Term> {
        self.context
            .pools
            .literals()
            .filter(|value| keep(&Type::wrap(value)))
            .map(Term::Literal)
            .collect()
    }
}

pub trait CandidateRule {
    fn name(&self) -> &'static str;
    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>);
}

/// True when values of `target` may be what a hole of type `goal` wants.
/// `Top` goals never admit a template.
pub fn admits(goal: &Type, target: &Type) -> bool {
    match goal {
        Type::Top | Type::Bottom => false,
        _ => target.is_subtype_of(goal) || goal.promote().is_subtype_of(target),
    }
}

/// The ordered rule list used by [`crate::synth::search::Synthesizer::standard`].
pub struct StandardExpander {
    rules: Vec<Box<dyn CandidateRule>>,
    limits: ExpansionLimits,
}

impl StandardExpander {
    pub fn new(rules: Vec<Box<dyn CandidateRule>>, limits: ExpansionLimits) -> StandardExpander {
        StandardExpander { rules, limits }
    }

    pub fn with_limits(mut self, limits: ExpansionLimits) -> StandardExpander {
        self.limits = limits;
        self
    }

    pub fn with_rule(mut self, rule: impl CandidateRule + 'static) -> StandardExpander {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn limits(&self) -> &ExpansionLimits {
        &self.limits
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}

impl Default for StandardExpander {
    fn default() -> Self {
        StandardExpander::new(
            vec![
                Box::new(PoolLiterals),
                Box::new(ExactLiteral),
                Box::new(Variables),
                Box::new(UnionSplit),
                Box::new(ArrayLiterals),
                Box::new(RecordLiterals),
                Box::new(IntegerTemplates),
                Box::new(StringTemplates),
                Box::new(KeyValueTemplates),
                Box::new(CatalogCalls),
            ],
            ExpansionLimits::default(),
        )
    }
}

impl fmt::Debug for StandardExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardExpander")
            .field("rules", &self.rule_names())
            .field("limits", &self.limits)
            .finish()
    }
}

impl HoleExpansion for StandardExpander {
    fn expand(&self, hole: &Hole, ctx: &Context, catalog: &SignatureCatalog) -> Vec<Term> {
        let scope = Scope {
            context: ctx,
            catalog,
            limits: &self.limits,
        };
        let mut raw = Vec::new();
        for rule in &self.rules {
            let before = raw.len();
            rule.candidates(&hole.goal, &scope, &mut raw);
            if raw.len() > before {
                trace!("{} -> {} candidates for {}", rule.name(), raw.len() - before, hole.goal);
            }
        }

        let mut frontier: Vec<Term> = Vec::with_capacity(raw.len());
        for candidate in raw {
            if !frontier.contains(&candidate) {
                frontier.push(candidate);
            }
        }
        frontier
    }
}

/// Pool literals whose own type fits the goal.
pub struct PoolLiterals;

impl CandidateRule for PoolLiterals {
    fn name(&self) -> &'static str {
        "pool-literals"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        out.extend(scope.pool_literals(|ty| ty.is_subtype_of(goal)));
    }
}

pub struct ExactLiteral;

impl CandidateRule for ExactLiteral {
    fn name(&self) -> &'static str {
        "exact-literal"
    }

    fn candidates(&self, goal: &Type, _scope: &Scope<'_>, out: &mut Vec<Term>) {
        if let Type::Singleton(_) | Type::PreciseString(_) = goal
            && let Some(value) = goal.exact_literal()
        {
            out.push(Term::Literal(value));
        }
    }
}

pub struct Variables;

impl CandidateRule for Variables {
    fn name(&self) -> &'static str {
        "variables"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        out.extend(scope.variables(|ty| ty.is_subtype_of(goal)));
    }
}

/// One hole per union branch; branches pinned to a single value become
/// dependent holes.
pub struct UnionSplit;

impl CandidateRule for UnionSplit {
    fn name(&self) -> &'static str {
        "union-split"
    }

    fn candidates(&self, goal: &Type, _scope: &Scope<'_>, out: &mut Vec<Term>) {
        let Type::Union(branches) = goal else {
            return;
        };
        out.extend(branches.iter().map(|branch| {
            if branch.exact_literal().is_some() {
                Term::dependent_hole(branch.clone())
            } else {
                Term::hole(branch.clone())
            }
        }));
    }
}

/// The empty array, then every ordering of up to `max_array_arity` distinct
/// pool literals of the element type.
pub struct ArrayLiterals;

impl CandidateRule for ArrayLiterals {
    fn name(&self) -> &'static str {
        "array-literals"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        let element = match goal {
            Type::Nominal(name) if name == ARRAY => Type::Top,
            other => match other.element_type() {
                Some(element) => element.clone(),
                None => return,
            },
        };
        let pool = scope.pool_literals(|ty| ty.is_subtype_of(&element));
        let cap = scope.limits.max_array_candidates;

        let mut emitted = vec![Term::array(Vec::new())];
        for arity in 1..=scope.limits.max_array_arity.min(pool.len()) {
            permutations(&pool, arity, &mut Vec::new(), &mut vec![false; pool.len()], &mut |items: &[Term]| {
                if emitted.len() < cap {
                    emitted.push(Term::array(items.to_vec()));
                }
            });
            if emitted.len() >= cap {
                break;
            }
        }
        out.extend(emitted);
    }
}

fn permutations(
    pool: &[Term],
    arity: usize,
    current: &mut Vec<Term>,
    used: &mut [bool],
    emit: &mut impl FnMut(&[Term]),
) {
    if current.len() == arity {
        emit(current);
        return;
    }
    for i in 0..pool.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(pool[i].clone());
        permutations(pool, arity, current, used, emit);
        current.pop();
        used[i] = false;
    }
}

/// A record literal for each non-empty subset of the goal's fields.
pub struct RecordLiterals;

impl CandidateRule for RecordLiterals {
    fn name(&self) -> &'static str {
        "record-literals"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        let Type::FiniteRecord(fields) = goal else {
            return;
        };
        if fields.is_empty() || fields.len() > scope.limits.max_record_fields {
            return;
        }
        // Subsets are enumerated as u32 masks.
        let Some(subsets) = u32::try_from(fields.len())
            .ok()
            .and_then(|n| 1u32.checked_shl(n))
        else {
            trace!("record goal with {} fields exceeds the subset mask", fields.len());
            return;
        };
        let fields: Vec<(&String, &Type)> = fields.iter().collect();
        for mask in 1u32..subsets {
            let entries = fields
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, (key, ty))| {
                    let hole = if ty.exact_literal().is_some() {
                        Term::dependent_hole((*ty).clone())
                    } else {
                        Term::hole((*ty).clone())
                    };
                    ((*key).clone(), hole)
                })
                .collect();
            out.push(Term::record(entries));
        }
    }
}

/// `a.add(b)` and `a.mul(b)` over integer variables and pool literals, plus
/// `a.add(b).add(c)` when the operand set is small.
pub struct IntegerTemplates;

impl CandidateRule for IntegerTemplates {
    fn name(&self) -> &'static str {
        "integer-templates"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        if !admits(goal, &Type::int()) {
            return;
        }
        let mut operands = scope.variables(Type::is_int_like);
        operands.extend(scope.pool_literals(|ty| ty.is_int_like()));

        for a in &operands {
            for b in &operands {
                out.push(Term::call(a.clone(), "add", vec![b.clone()]));
                out.push(Term::call(a.clone(), "mul", vec![b.clone()]));
            }
        }

        if operands.len() > scope.limits.max_triple_operands {
            return;
        }
        for a in &operands {
            for b in &operands {
                for c in &operands {
                    let inner = Term::call(a.clone(), "add", vec![b.clone()]);
                    out.push(Term::call(inner, "add", vec![c.clone()]));
                }
            }
        }
    }
}

/// Concatenations, fixed-offset slices, reversal and case transforms over
/// string variables.
pub struct StringTemplates;

const CASE_TRANSFORMS: [&str; 4] = ["upper", "lower", "capitalize", "title"];

impl CandidateRule for StringTemplates {
    fn name(&self) -> &'static str {
        "string-templates"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        if !admits(goal, &Type::string()) {
            return;
        }
        let variables = scope.variables(Type::is_string_like);
        let mut operands = variables.clone();
        operands.extend(scope.pool_literals(|ty| ty.is_string_like()));

        for a in &operands {
            for b in &operands {
                out.push(Term::call(a.clone(), "add", vec![b.clone()]));
            }
        }

        let offsets = &scope.context.pools.ints;
        for var in &variables {
            for &start in offsets {
                for &end in offsets {
                    if start < end {
                        out.push(Term::slice(
                            var.clone(),
                            Some(Term::literal(start)),
                            Some(Term::literal(end)),
                        ));
                    }
                }
                if start != 0 {
                    out.push(Term::slice(var.clone(), Some(Term::literal(start)), None));
                }
            }
            out.push(Term::reverse(var.clone()));
            for method in CASE_TRANSFORMS {
                out.push(Term::call(var.clone(), method, Vec::new()));
            }
        }
    }
}

/// Calls to any catalog method whose declared return fits the goal, with a
/// fresh hole for the receiver and every argument.
pub struct CatalogCalls;

impl CandidateRule for CatalogCalls {
    fn name(&self) -> &'static str {
        "catalog-calls"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        for (receiver, method, signature) in scope.catalog.entries() {
            if !signature.ret.is_subtype_of(goal) {
                continue;
            }
            let receiver_hole = Term::hole(SignatureCatalog::receiver_type(receiver));
            let arg_holes = signature.args.iter().map(|arg| Term::hole(arg.clone())).collect();
            out.push(Term::call(receiver_hole, method, arg_holes));
        }
    }
}
