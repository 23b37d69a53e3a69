//! KPI definitions, findings and package results
//!
//! A [`FindingSet`] holds one [`KpiFinding`] per definition for the duration of
//! a package scan. A finding is confirmed at most once: the first non-empty
//! sentence recorded for a definition wins and is never overwritten.

use chrono::NaiveDate;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A named, categorized set of patterns describing evidence to search for
#[derive(Debug, Clone)]
pub struct KpiDefinition {
    pub name: String,
    pub category: String,
    /// Compiled patterns, tried in declaration order
    pub patterns: Vec<Regex>,
}

impl KpiDefinition {
    pub fn new(name: impl Into<String>, category: impl Into<String>, patterns: Vec<Regex>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            patterns,
        }
    }
}

/// Per-definition result of scanning one package
#[derive(Debug, Clone)]
pub struct KpiFinding {
    definition: Arc<KpiDefinition>,
    found: bool,
    sentence: String,
}

impl KpiFinding {
    fn new(definition: Arc<KpiDefinition>) -> Self {
        Self {
            definition,
            found: false,
            sentence: String::new(),
        }
    }

    pub fn definition(&self) -> &KpiDefinition {
        &self.definition
    }

    pub fn found(&self) -> bool {
        self.found
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }
}

impl Serialize for KpiFinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("KpiFinding", 3)?;
        s.serialize_field("name", &self.definition.name)?;
        s.serialize_field("category", &self.definition.category)?;
        s.serialize_field("sentence", &self.sentence)?;
        s.end()
    }
}

/// Findings for every definition, in definition order
#[derive(Debug, Clone)]
pub struct FindingSet {
    findings: Vec<KpiFinding>,
}

impl FindingSet {
    /// Start a package scan with every finding unconfirmed
    pub fn new(definitions: &[Arc<KpiDefinition>]) -> Self {
        Self {
            findings: definitions.iter().cloned().map(KpiFinding::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Whether every definition has been confirmed
    pub fn all_found(&self) -> bool {
        self.findings.iter().all(|f| f.found)
    }

    /// Definitions that have not been confirmed yet, with their positions
    pub fn pending(&self) -> impl Iterator<Item = (usize, &KpiDefinition)> {
        self.findings
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.found)
            .map(|(i, f)| (i, f.definition.as_ref()))
    }

    /// Confirm the finding at `index` with `sentence`
    ///
    /// Returns `false` without changing anything if the finding is already
    /// confirmed or the sentence is blank.
    pub fn record(&mut self, index: usize, sentence: &str) -> bool {
        let Some(finding) = self.findings.get_mut(index) else {
            return false;
        };
        if finding.found || sentence.trim().is_empty() {
            return false;
        }
        finding.sentence = sentence.to_string();
        finding.found = true;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &KpiFinding> {
        self.findings.iter()
    }

    /// Discard the unconfirmed findings, keeping definition order
    pub fn into_found(self) -> Vec<KpiFinding> {
        self.findings.into_iter().filter(|f| f.found).collect()
    }
}

/// Hierarchical location of a package, supplied by the directory walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkPath {
    pub year: String,
    pub business_unit: String,
    pub division: String,
}

/// Confirmed findings of one package, handed to the reporting sink
#[derive(Debug, Clone, Serialize)]
pub struct PackageResult {
    pub package_name: String,
    pub date_parsed: NaiveDate,
    pub year: String,
    pub business_unit: String,
    pub division: String,
    pub findings: Vec<KpiFinding>,
}
