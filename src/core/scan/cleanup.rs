//! Text normalization applied before KPI matching
//!
//! Extracted paragraphs and converter output carry layout artifacts: bullet
//! glyphs on their own line, runs of spaces, words broken across lines and
//! stacked blank lines. The rules run in order; later rules assume the
//! earlier ones have already been applied.

use crate::domain::{DocsiftError, Result};
use regex::Regex;

const RULES: &[(&str, &str)] = &[
    // stray bullet or copyright glyph on its own line
    (r"\n[©•-]\n", " "),
    (r"[ \t]+", " "),
    // word broken by a line break
    (r"([A-Za-z])\n([a-z])", "${1}${2}"),
    (r"([A-Za-z]) \n\n([A-Za-z])", "${1} ${2}"),
    (r"([A-Za-z]) \n([A-Za-z])", "${1} ${2}"),
    (r"\n \n", " "),
    (r"\.\n \n", ". "),
    (r"\n\n+", "\n"),
    // leading list markers
    (r"(?m)^[-•]\s*", ""),
];

/// Ordered substitution rules
#[derive(Debug, Clone)]
pub struct CleanupRules {
    rules: Vec<(Regex, &'static str)>,
}

impl CleanupRules {
    pub fn new() -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .map(|re| (re, *replacement))
                    .map_err(|e| DocsiftError::Other(format!("Invalid cleanup rule {pattern}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Apply every rule in order
    pub fn apply(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for (pattern, replacement) in &self.rules {
            cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
        }
        cleaned
    }
}
