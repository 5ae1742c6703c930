use crate::synth::types::Type;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleKind {
    /// Filled by hole expansion.
    Regular,
    /// Filled from its goal's exact literal once the surrounding candidate
    /// type-checks.
    Dependent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub goal: Type,
    pub kind: HoleKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoleCounts {
    pub regular: usize,
    pub dependent: usize,
}

impl HoleCounts {
    pub fn total(&self) -> usize {
        self.regular + self.dependent
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Term {
    Literal(Value),
    VariableRef(String),
    MethodCall {
        receiver: Box<Term>,
        name: String,
        args: Vec<Term>,
    },
    FieldAccess {
        receiver: Box<Term>,
        name: String,
        args: Vec<Term>,
    },
    ArrayLiteral(Vec<Term>),
    RecordLiteral(Vec<(String, Term)>),
    SliceExpr {
        receiver: Box<Term>,
        start: Option<Box<Term>>,
        end: Option<Box<Term>>,
        reversed: bool,
    },
    Hole(Hole),
}

impl Term {
    pub fn literal(value: impl Into<Value>) -> Term {
        Term::Literal(value.into())
    }

    pub fn var(name: impl Into<String>) -> Term {
        Term::VariableRef(name.into())
    }

    pub fn call(receiver: Term, name: impl Into<String>, args: Vec<Term>) -> Term {
        Term::MethodCall {
            receiver: Box::new(receiver),
            name: name.into(),
            args,
        }
    }

    pub fn field(receiver: Term, name: impl Into<String>) -> Term {
        Term::FieldAccess {
            receiver: Box::new(receiver),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn array(items: Vec<Term>) -> Term {
        Term::ArrayLiteral(items)
    }

    pub fn record(entries: Vec<(String, Term)>) -> Term {
        Term::RecordLiteral(entries)
    }

    pub fn slice(receiver: Term, start: Option<Term>, end: Option<Term>) -> Term {
        Term::SliceExpr {
            receiver: Box::new(receiver),
            start: start.map(Box::new),
            end: end.map(Box::new),
            reversed: false,
        }
    }

    /// `receiver[::-1]`
    pub fn reverse(receiver: Term) -> Term {
        Term::SliceExpr {
            receiver: Box::new(receiver),
            start: None,
            end: None,
            reversed: true,
        }
    }

    pub fn hole(goal: Type) -> Term {
        Term::Hole(Hole {
            goal,
            kind: HoleKind::Regular,
        })
    }

    pub fn dependent_hole(goal: Type) -> Term {
        Term::Hole(Hole {
            goal,
            kind: HoleKind::Dependent,
        })
    }

    /// Node count; every leaf (literal, variable, hole) weighs 1.
    pub fn size(&self) -> usize {
        match self {
            Term::Literal(_) | Term::VariableRef(_) | Term::Hole(_) => 1,
            Term::MethodCall { receiver, args, .. } | Term::FieldAccess { receiver, args, .. } => {
                1 + receiver.size() + args.iter().map(Term::size).sum::<usize>()
            }
            Term::ArrayLiteral(items) => 1 + items.iter().map(Term::size).sum::<usize>(),
            Term::RecordLiteral(entries) => {
                1 + entries.iter().map(|(_, v)| v.size()).sum::<usize>()
            }
            Term::SliceExpr {
                receiver,
                start,
                end,
                ..
            } => {
                1 + receiver.size()
                    + start.as_ref().map_or(0, |t| t.size())
                    + end.as_ref().map_or(0, |t| t.size())
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.hole_counts().total() == 0
    }

    pub fn hole_counts(&self) -> HoleCounts {
        let mut counts = HoleCounts::default();
        self.visit_holes(&mut |hole| match hole.kind {
            HoleKind::Regular => counts.regular += 1,
            HoleKind::Dependent => counts.dependent += 1,
        });
        counts
    }

    /// Regular holes in pre-order; this is the order `fill_regular_holes`
    /// consumes fillings in.
    pub fn regular_holes(&self) -> Vec<&Hole> {
        let mut out = Vec::new();
        self.collect_regular(&mut out);
        out
    }

    fn collect_regular<'a>(&'a self, out: &mut Vec<&'a Hole>) {
        match self {
            Term::Hole(hole) => {
                if hole.kind == HoleKind::Regular {
                    out.push(hole);
                }
            }
            Term::Literal(_) | Term::VariableRef(_) => {}
            _ => {
                for child in self.children() {
                    child.collect_regular(out);
                }
            }
        }
    }

    fn visit_holes(&self, f: &mut impl FnMut(&Hole)) {
        match self {
            Term::Hole(hole) => f(hole),
            Term::Literal(_) | Term::VariableRef(_) => {}
            _ => {
                for child in self.children() {
                    child.visit_holes(f);
                }
            }
        }
    }

    fn children(&self) -> Vec<&Term> {
        match self {
            Term::Literal(_) | Term::VariableRef(_) | Term::Hole(_) => Vec::new(),
            Term::MethodCall { receiver, args, .. } | Term::FieldAccess { receiver, args, .. } => {
                std::iter::once(receiver.as_ref()).chain(args.iter()).collect()
            }
            Term::ArrayLiteral(items) => items.iter().collect(),
            Term::RecordLiteral(entries) => entries.iter().map(|(_, v)| v).collect(),
            Term::SliceExpr {
                receiver,
                start,
                end,
                ..
            } => std::iter::once(receiver.as_ref())
                .chain(start.as_deref())
                .chain(end.as_deref())
                .collect(),
        }
    }

    /// Substitutes regular holes, in pre-order, with successive fillings.
    /// Holes past the end of `fillings` are left in place.
    pub fn fill_regular_holes(&self, fillings: &[Term]) -> Term {
        let mut cursor = fillings.iter();
        self.map_holes(&mut |hole| match hole.kind {
            HoleKind::Regular => cursor.next().cloned(),
            HoleKind::Dependent => None,
        })
    }

    /// Replaces each dependent hole whose goal pins down a single literal.
    /// Returns the rewritten term and the number of holes resolved.
    pub fn resolve_dependent_holes(&self) -> (Term, usize) {
        let mut resolved = 0;
        let term = self.map_holes(&mut |hole| {
            if hole.kind != HoleKind::Dependent {
                return None;
            }
            let value = hole.goal.exact_literal()?;
            resolved += 1;
            Some(Term::Literal(value))
        });
        (term, resolved)
    }

    fn map_holes(&self, f: &mut impl FnMut(&Hole) -> Option<Term>) -> Term {
        match self {
            Term::Hole(hole) => f(hole).unwrap_or_else(|| self.clone()),
            Term::Literal(_) | Term::VariableRef(_) => self.clone(),
            Term::MethodCall {
                receiver,
                name,
                args,
            } => Term::MethodCall {
                receiver: Box::new(receiver.map_holes(f)),
                name: name.clone(),
                args: args.iter().map(|a| a.map_holes(f)).collect(),
            },
            Term::FieldAccess {
                receiver,
                name,
                args,
            } => Term::FieldAccess {
                receiver: Box::new(receiver.map_holes(f)),
                name: name.clone(),
                args: args.iter().map(|a| a.map_holes(f)).collect(),
            },
            Term::ArrayLiteral(items) => {
                Term::ArrayLiteral(items.iter().map(|i| i.map_holes(f)).collect())
            }
            Term::RecordLiteral(entries) => Term::RecordLiteral(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.map_holes(f)))
                    .collect(),
            ),
            Term::SliceExpr {
                receiver,
                start,
                end,
                reversed,
            } => {
                let receiver = Box::new(receiver.map_holes(f));
                let start = start.as_ref().map(|t| Box::new(t.map_holes(f)));
                let end = end.as_ref().map(|t| Box::new(t.map_holes(f)));
                Term::SliceExpr {
                    receiver,
                    start,
                    end,
                    reversed: *reversed,
                }
            }
        }
    }
}

fn join_terms(items: &[Term]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Literal(value) => write!(f, "{value}"),
            Term::VariableRef(name) => write!(f, "{name}"),
            Term::MethodCall {
                receiver,
                name,
                args,
            } => write!(f, "{receiver}.{name}({})", join_terms(args)),
            Term::FieldAccess {
                receiver,
                name,
                args,
            } => {
                if args.is_empty() {
                    write!(f, "{receiver}.{name}")
                } else {
                    write!(f, "{receiver}.{name}[{}]", join_terms(args))
                }
            }
            Term::ArrayLiteral(items) => write!(f, "[{}]", join_terms(items)),
            Term::RecordLiteral(entries) => {
                let text = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {v}", Value::String(k.clone())))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{text}}}")
            }
            Term::SliceExpr {
                receiver,
                start,
                end,
                reversed,
            } => {
                let start = start.as_ref().map(ToString::to_string).unwrap_or_default();
                let end = end.as_ref().map(ToString::to_string).unwrap_or_default();
                if *reversed {
                    write!(f, "{receiver}[{start}:{end}:-1]")
                } else {
                    write!(f, "{receiver}[{start}:{end}]")
                }
            }
            Term::Hole(hole) => match hole.kind {
                HoleKind::Regular => write!(f, "?{{{}}}", hole.goal),
                HoleKind::Dependent => write!(f, "?!{{{}}}", hole.goal),
            },
        }
    }
}
