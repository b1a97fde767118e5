//! Severity ranking of the merged finding list

use serde::{Deserialize, Serialize};

use crate::types::{Finding, FindingLevel, PatternMatch};

/// Stable sort by severity tier: fail, then warn, then info.
///
/// Equal tiers keep the order their detectors ran in. No deduplication.
pub fn rank_findings(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by_key(|f| f.level);
    findings
}

/// Stable sort of pattern matches by urgency, most urgent first
pub fn rank_patterns(mut matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
    matches.sort_by_key(|m| m.urgency);
    matches
}

/// Finding counts per severity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub fail: usize,
    pub warn: usize,
    pub info: usize,
}

impl LevelCounts {
    pub fn of(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut c, f| {
            match f.level {
                FindingLevel::Fail => c.fail += 1,
                FindingLevel::Warn => c.warn += 1,
                FindingLevel::Info => c.info += 1,
            }
            c
        })
    }

    pub const fn total(&self) -> usize {
        self.fail + self.warn + self.info
    }
}
