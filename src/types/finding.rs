//! Finding: one diagnostic observation with severity, category and message

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier of a finding.
///
/// Ordering is ranking order: `Fail` sorts before `Warn`, `Warn` before `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingLevel {
    Fail,
    Warn,
    Info,
}

impl FindingLevel {
    /// Numeric severity where larger means worse (Info=1, Warn=2, Fail=3)
    pub const fn severity(self) -> u8 {
        match self {
            Self::Fail => 3,
            Self::Warn => 2,
            Self::Info => 1,
        }
    }
}

impl fmt::Display for FindingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "FAIL"),
            Self::Warn => write!(f, "WARN"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

/// A single diagnostic observation.
///
/// Findings are independent values: no identity, no links to other findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub level: FindingLevel,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_id: Option<String>,
}

impl Finding {
    pub fn new(level: FindingLevel, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            category: category.into(),
            trip_id: None,
            message: message.into(),
            detail: None,
            parameter_id: None,
        }
    }

    pub fn fail(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingLevel::Fail, category, message)
    }

    pub fn warn(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingLevel::Warn, category, message)
    }

    pub fn info(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingLevel::Info, category, message)
    }

    #[must_use]
    pub fn trip(mut self, trip_id: impl Into<String>) -> Self {
        self.trip_id = Some(trip_id.into());
        self
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn parameter(mut self, parameter_id: impl Into<String>) -> Self {
        self.parameter_id = Some(parameter_id.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.category, self.message)?;
        if let Some(ref trip) = self.trip_id {
            write!(f, " (trip {trip})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_is_ranking_order() {
        assert!(FindingLevel::Fail < FindingLevel::Warn);
        assert!(FindingLevel::Warn < FindingLevel::Info);
        assert!(FindingLevel::Fail.severity() > FindingLevel::Info.severity());
    }

    #[test]
    fn test_builder_and_json_shape() {
        let f = Finding::warn("Cooling", "Coolant running hot")
            .trip("trip-1")
            .parameter("Engine coolant temperature");
        let json = serde_json::to_value(&f).expect("serialize");
        assert_eq!(json["level"], "warn");
        assert_eq!(json["trip_id"], "trip-1");
        assert!(json.get("detail").is_none());
    }
}
