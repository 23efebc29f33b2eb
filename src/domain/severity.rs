use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized event severity.
///
/// Variants are declared from least to most severe so that the derived
/// `Ord` sorts `Info < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a source-native severity token onto the canonical vocabulary.
///
/// Matching is case-exact: `"error"` is not `"ERROR"` and falls through to
/// `Info` like any other unknown token.
pub fn normalize(raw_token: &str) -> Severity {
    match raw_token {
        "ERROR" | "CRITICAL" | "ALERT" | "EMERGENCY" => Severity::Critical,
        "WARN" | "WARNING" => Severity::High,
        "NOTICE" => Severity::Medium,
        "DEBUG" => Severity::Low,
        _ => Severity::Info,
    }
}
