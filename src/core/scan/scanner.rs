//! KPI scanner
//!
//! Paragraph text is cleaned, split into lines and matched against every
//! unconfirmed definition. A match is reported as the sentence around it,
//! bounded by the nearest `". X"` (period, space, capital) on either side or
//! by the edges of the line. Spreadsheet cells are matched as a whole and
//! reported verbatim.
//!
//! Matching never fails; a line that yields no usable sentence is simply not
//! a finding.

use super::cleanup::CleanupRules;
use crate::domain::{DocsiftError, FindingSet, Result};
use regex::Regex;

const SENTENCE_BOUNDARY: &str = r"\. [A-Z]";

/// Matches text against KPI definitions and records the first sentence found
/// for each one
#[derive(Debug, Clone)]
pub struct KpiScanner {
    cleanup: CleanupRules,
    boundary: Regex,
}

impl KpiScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cleanup: CleanupRules::new()?,
            boundary: Regex::new(SENTENCE_BOUNDARY)
                .map_err(|e| DocsiftError::Other(format!("Invalid sentence boundary: {e}")))?,
        })
    }

    /// Scan a paragraph or a block of converter output
    pub fn scan_text(&self, text: &str, findings: &mut FindingSet) {
        if findings.all_found() {
            return;
        }
        let cleaned = self.cleanup.apply(text);

        for line in cleaned.split('\n') {
            if line.trim().is_empty() {
                continue;
            }
            let hits: Vec<(usize, String)> = findings
                .pending()
                .filter_map(|(index, definition)| {
                    definition
                        .patterns
                        .iter()
                        .find_map(|pattern| self.extract_sentence(line, pattern))
                        .map(|sentence| (index, sentence))
                })
                .collect();

            for (index, sentence) in hits {
                findings.record(index, &sentence);
            }
        }
    }

    /// Scan a single spreadsheet cell value
    pub fn scan_cell(&self, value: &str, findings: &mut FindingSet) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let hits: Vec<usize> = findings
            .pending()
            .filter(|(_, definition)| definition.patterns.iter().any(|p| p.is_match(value)))
            .map(|(index, _)| index)
            .collect();

        for index in hits {
            findings.record(index, value);
        }
    }

    /// The sentence of `line` containing the first match of `pattern`
    fn extract_sentence(&self, line: &str, pattern: &Regex) -> Option<String> {
        let found = pattern.find(line)?;

        let left = self
            .boundary
            .find_iter(line)
            .take_while(|b| b.start() + 2 <= found.start())
            .last()
            .map(|b| b.start() + 2)
            .unwrap_or(0);

        let right = self
            .boundary
            .find_at(line, found.end().saturating_sub(1).max(found.start()))
            .map(|b| b.start() + 1)
            .unwrap_or(line.len());

        if right <= left {
            return None;
        }
        let sentence = line[left..right].trim();
        if sentence.is_empty() {
            None
        } else {
            Some(sentence.to_string())
        }
    }
}
