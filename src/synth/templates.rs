use crate::synth::ast::Term;
use crate::synth::expand::{CandidateRule, Scope, admits};
use crate::synth::types::Type;
use std::collections::BTreeMap;

/// Projects `key=value` or `key=value&key=value` strings into record fields
/// with split-then-index chains.
///
/// Applies to record goals of at most `max_key_value_pairs` string fields.
/// When a variable's exact text is known its keys must be exactly the goal's
/// fields, and each field reads from the position its key occupies;
/// otherwise fields are assumed to appear in key order.
pub struct KeyValueTemplates;

const PAIR_SEPARATOR: &str = "&";
const KEY_SEPARATOR: &str = "=";

impl CandidateRule for KeyValueTemplates {
    fn name(&self) -> &'static str {
        "key-value-templates"
    }

    fn candidates(&self, goal: &Type, scope: &Scope<'_>, out: &mut Vec<Term>) {
        let Type::FiniteRecord(fields) = goal else {
            return;
        };
        if fields.is_empty() || fields.len() > scope.limits.max_key_value_pairs {
            return;
        }
        if !fields.values().all(|ty| admits(ty, &Type::string())) {
            return;
        }

        for (name, ty) in &scope.context.environment {
            if !ty.is_string_like() {
                continue;
            }
            let positions = match ty {
                Type::PreciseString(text) => match key_positions(text, fields) {
                    Some(positions) => positions,
                    None => continue,
                },
                _ => fields.keys().cloned().zip(0..).collect(),
            };
            let source = Term::var(name.clone());
            let entries = positions
                .into_iter()
                .map(|(key, position)| (key, project(&source, position, fields.len())))
                .collect();
            out.push(Term::record(entries));
        }
    }
}

/// Position of every pair keyed by a goal field, or `None` when the text's
/// keys differ from the fields.
fn key_positions(text: &str, fields: &BTreeMap<String, Type>) -> Option<Vec<(String, usize)>> {
    let mut positions = BTreeMap::new();
    for (position, pair) in text.split(PAIR_SEPARATOR).enumerate() {
        let (key, _) = pair.split_once(KEY_SEPARATOR)?;
        if !fields.contains_key(key) || positions.insert(key.to_string(), position).is_some() {
            return None;
        }
    }
    (positions.len() == fields.len()).then(|| positions.into_iter().collect())
}

fn project(source: &Term, position: usize, pair_count: usize) -> Term {
    let pair = if pair_count == 1 {
        source.clone()
    } else {
        index(split(source.clone(), PAIR_SEPARATOR), position as i64)
    };
    index(split(pair, KEY_SEPARATOR), 1)
}

fn split(receiver: Term, separator: &str) -> Term {
    Term::call(receiver, "split", vec![Term::literal(separator)])
}

fn index(receiver: Term, position: i64) -> Term {
    Term::call(receiver, "index", vec![Term::literal(position)])
}
