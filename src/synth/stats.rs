use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-call counters. A fresh value is created for every synthesis call and
/// handed back with its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisStats {
    pub example_count: usize,
    pub tested_programs: usize,
    pub eliminated_programs: usize,
}

impl SynthesisStats {
    pub fn new(example_count: usize) -> SynthesisStats {
        SynthesisStats {
            example_count,
            ..SynthesisStats::default()
        }
    }

    pub fn record_tested(&mut self) {
        self.tested_programs += 1;
    }

    pub fn record_eliminated(&mut self) {
        self.eliminated_programs += 1;
    }
}

impl fmt::Display for SynthesisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examples={} tested={} eliminated={}",
            self.example_count, self.tested_programs, self.eliminated_programs
        )
    }
}
