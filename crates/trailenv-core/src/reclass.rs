//! Ecosystem-type reclassification.
//!
//! The source ecosystem raster codes its classes in disjoint hundred-ranges
//! (100s = forest, 200s = alpine, …) with a finer split around 801/802/840.
//! An ordered rule list maps these onto a simple 10-class typology; rules are
//! applied first-match-wins per cell.
//!
//! The raw map leaves values outside every rule unchanged, which silently
//! smuggles unclassified codes into the categorical export. The table
//! therefore takes an explicit policy: `Strict` (default) fails loudly on the
//! first unmatched value, `PassThrough` reproduces the original behaviour and
//! logs how many cells slipped through.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailEnvError};
use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RulePredicate {
    /// Strictly between: lo < v < hi.
    Open { lo: f32, hi: f32 },
    /// Exactly one of the two codes.
    Either(f32, f32),
    /// Strictly above: v > lo.
    Above { lo: f32 },
}

impl RulePredicate {
    pub fn matches(&self, v: f32) -> bool {
        match *self {
            RulePredicate::Open { lo, hi } => v > lo && v < hi,
            RulePredicate::Either(a, b) => v == a || v == b,
            RulePredicate::Above { lo } => v > lo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReclassRule {
    pub predicate: RulePredicate,
    pub code: u8,
}

/// What to do with a valid input value no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Fail on the first unmatched value.
    #[default]
    Strict,
    /// Keep the raw value, as the source map did. Logged.
    PassThrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReclassTable {
    pub rules: Vec<ReclassRule>,
    pub policy: UnmatchedPolicy,
}

impl ReclassTable {
    pub fn new(rules: Vec<ReclassRule>, policy: UnmatchedPolicy) -> Self {
        Self { rules, policy }
    }

    /// The main-ecosystem-type table: ten codes.
    ///  1 forest, 2 alpine, 3 tundra, 4 wetland, 5 semi-natural, 6 open land,
    ///  7 sea, 8 freshwater (801/802), 9 cropland, 10 urban.
    pub fn ecosystem_types(policy: UnmatchedPolicy) -> Self {
        use RulePredicate::*;
        let rules = (1..=7)
            .map(|k| ReclassRule {
                predicate: Open { lo: k as f32 * 100.0, hi: (k + 1) as f32 * 100.0 },
                code: k as u8,
            })
            .chain([
                ReclassRule { predicate: Either(801.0, 802.0), code: 8 },
                ReclassRule { predicate: Open { lo: 802.0, hi: 840.0 }, code: 9 },
                ReclassRule { predicate: Above { lo: 840.0 }, code: 10 },
            ])
            .collect();
        Self::new(rules, policy)
    }

    /// First matching rule's code, or None.
    pub fn classify(&self, v: f32) -> Option<u8> {
        self.rules.iter().find(|r| r.predicate.matches(v)).map(|r| r.code)
    }

    /// Reclassify a grid cell by cell. No-data cells stay no-data under
    /// either policy.
    pub fn apply(&self, grid: &Grid) -> Result<Grid> {
        let mut out = grid.clone();
        let mut unmatched = 0usize;
        for row in 0..grid.height {
            for col in 0..grid.width {
                let v = grid.get(row, col);
                if v.is_nan() {
                    continue;
                }
                match self.classify(v) {
                    Some(code) => out.set(row, col, code as f32),
                    None => match self.policy {
                        UnmatchedPolicy::Strict => {
                            return Err(TrailEnvError::UnclassifiedValue { value: v, row, col });
                        }
                        UnmatchedPolicy::PassThrough => unmatched += 1,
                    },
                }
            }
        }
        if unmatched > 0 {
            warn!(
                "reclassification left {unmatched} cell(s) of {:?} unclassified (pass-through)",
                grid.name
            );
        }
        Ok(out)
    }
}
