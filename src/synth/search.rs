use crate::synth::ast::Term;
use crate::synth::catalog::SignatureCatalog;
use crate::synth::context::Context;
use crate::synth::expand::{HoleExpansion, StandardExpander};
use crate::synth::interp::{TypeInterpretationError, interpret};
use crate::synth::oracle::{OracleError, TestOracle};
use crate::synth::stats::SynthesisStats;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub program: Term,
    pub stats: SynthesisStats,
}

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("type interpretation failed: {0}")]
    TypeInterpretation(#[from] TypeInterpretationError),
    #[error("no program within the size bound passed the oracle ({stats})")]
    NoSolutionFound { stats: SynthesisStats },
    #[error("synthesis timed out ({stats})")]
    TimedOut { stats: SynthesisStats },
    #[error("oracle failed: {0}")]
    Operational(#[from] OracleError),
    #[error("search invariant violated: {0}")]
    InvariantViolation(String),
}

impl SynthError {
    pub fn stats(&self) -> Option<SynthesisStats> {
        match self {
            SynthError::NoSolutionFound { stats } | SynthError::TimedOut { stats } => Some(*stats),
            _ => None,
        }
    }
}

/// Best-first enumerative synthesizer. Holds the hole expander and the
/// signature catalog; everything mutable lives in a single call.
pub struct Synthesizer<E = StandardExpander> {
    expander: E,
    catalog: SignatureCatalog,
}

impl Synthesizer<StandardExpander> {
    pub fn standard() -> Synthesizer<StandardExpander> {
        Synthesizer::new(StandardExpander::default(), SignatureCatalog::standard())
    }
}

impl<E: HoleExpansion> Synthesizer<E> {
    pub fn new(expander: E, catalog: SignatureCatalog) -> Synthesizer<E> {
        Synthesizer { expander, catalog }
    }

    pub fn catalog(&self) -> &SignatureCatalog {
        &self.catalog
    }

    pub fn expander(&self) -> &E {
        &self.expander
    }

    /// Searches for the smallest-scoring closed program that passes `oracle`.
    pub fn synthesize<O: TestOracle + ?Sized>(
        &self,
        ctx: &Context,
        oracle: &mut O,
    ) -> Result<Solution, SynthError> {
        let search = Search {
            synth: self,
            ctx,
            queue: BinaryHeap::new(),
            next_seq: 0,
            stats: SynthesisStats::new(oracle.example_count()),
            deadline: ctx.timeout.map(|timeout| Instant::now() + timeout),
        };
        search.run(oracle)
    }
}

/// Queue entry ordered so that `BinaryHeap` pops the lowest score first and,
/// among equal scores, the earliest insertion.
struct QueueEntry {
    score: usize,
    seq: u64,
    program: Term,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Search<'a, E> {
    synth: &'a Synthesizer<E>,
    ctx: &'a Context,
    queue: BinaryHeap<QueueEntry>,
    next_seq: u64,
    stats: SynthesisStats,
    deadline: Option<Instant>,
}

impl<E: HoleExpansion> Search<'_, E> {
    fn run<O: TestOracle + ?Sized>(mut self, oracle: &mut O) -> Result<Solution, SynthError> {
        debug!(
            "synthesizing goal {} over {} variable(s), max size {}",
            self.ctx.goal,
            self.ctx.environment.len(),
            self.ctx.max_size
        );
        self.push(Term::hole(self.ctx.goal.clone()));

        loop {
            self.check_deadline()?;
            let Some(entry) = self.queue.pop() else {
                debug!("queue exhausted: {}", self.stats);
                return Err(SynthError::NoSolutionFound { stats: self.stats });
            };
            let program = entry.program;
            trace!("pop score={} {}", entry.score, program);

            let frontiers: Vec<Vec<Term>> = program
                .regular_holes()
                .into_iter()
                .map(|hole| {
                    self.synth
                        .expander
                        .expand(hole, self.ctx, &self.synth.catalog)
                })
                .collect();
            if frontiers.iter().any(Vec::is_empty) {
                trace!("dead end: a hole of {program} has no candidates");
                continue;
            }

            let mut indices = vec![0; frontiers.len()];
            loop {
                self.check_deadline()?;
                let fillings: Vec<Term> = indices
                    .iter()
                    .zip(&frontiers)
                    .map(|(&i, frontier)| frontier[i].clone())
                    .collect();
                let candidate = program.fill_regular_holes(&fillings);
                if let Some(solution) = self.consider(candidate, oracle)? {
                    return Ok(solution);
                }
                if !advance(&mut indices, &frontiers) {
                    break;
                }
            }
        }
    }

    fn consider<O: TestOracle + ?Sized>(
        &mut self,
        candidate: Term,
        oracle: &mut O,
    ) -> Result<Option<Solution>, SynthError> {
        let holes = candidate.hole_counts();

        if holes.total() > 0 {
            let ty = interpret(&self.ctx.environment, &self.synth.catalog, &candidate)?;
            if !ty.is_subtype_of(&self.ctx.goal) {
                self.stats.record_eliminated();
                trace!("eliminated {candidate} : {ty}");
                return Ok(None);
            }

            let candidate = if holes.regular == 0 {
                let (resolved, count) = candidate.resolve_dependent_holes();
                if count != holes.dependent {
                    return Err(SynthError::InvariantViolation(format!(
                        "resolved {count} of {} dependent holes in {candidate}",
                        holes.dependent
                    )));
                }
                resolved
            } else {
                candidate
            };

            if candidate.size() <= self.ctx.max_size {
                self.push(candidate);
            }
            return Ok(None);
        }

        if candidate.size() > self.ctx.max_size {
            return Ok(None);
        }
        self.stats.record_tested();
        if oracle.test(&candidate)? {
            info!("found {candidate} ({})", self.stats);
            return Ok(Some(Solution {
                program: candidate,
                stats: self.stats,
            }));
        }
        Ok(None)
    }

    fn push(&mut self, program: Term) {
        let score = self.ctx.score(&program);
        self.queue.push(QueueEntry {
            score,
            seq: self.next_seq,
            program,
        });
        self.next_seq += 1;
    }

    fn check_deadline(&self) -> Result<(), SynthError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                debug!("deadline reached: {}", self.stats);
                Err(SynthError::TimedOut { stats: self.stats })
            }
            _ => Ok(()),
        }
    }
}

/// Steps a mixed-radix counter, last position fastest. Returns `false` once
/// every combination has been produced.
fn advance(indices: &mut [usize], frontiers: &[Vec<Term>]) -> bool {
    for pos in (0..indices.len()).rev() {
        indices[pos] += 1;
        if indices[pos] < frontiers[pos].len() {
            return true;
        }
        indices[pos] = 0;
    }
    false
}
