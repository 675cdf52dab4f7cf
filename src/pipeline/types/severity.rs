use serde::{Deserialize, Serialize};
use std::fmt;

/// Hazard urgency tier. Ordered so that `min` picks the less severe tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Unset,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unset => "UNSET",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }

    /// Reportable tiers. `Unset` and `Low` never reach an authority.
    pub fn is_reportable(&self) -> bool {
        matches!(self, Severity::Medium | Severity::High)
    }

    /// First tier word found in free text, e.g. an advisory model's answer
    pub fn parse_tier(text: &str) -> Option<Severity> {
        text.split(|c: char| !c.is_ascii_alphabetic())
            .find_map(|word| match word.to_ascii_uppercase().as_str() {
                "HIGH" => Some(Severity::High),
                "MEDIUM" => Some(Severity::Medium),
                "LOW" => Some(Severity::Low),
                _ => None,
            })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
