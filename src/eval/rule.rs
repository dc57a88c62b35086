//! A single named rule: one or more regex patterns and a block reason.

use regex::Regex;

use crate::config::RuleConfig;
use crate::error::{Error, Result};

/// A compiled rule. Matches when any of its patterns matches the raw command.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    patterns: Vec<Regex>,
    reason: String,
}

impl Rule {
    /// Compile a rule from its name, pattern sources and reason.
    pub fn new<S: AsRef<str>>(name: &str, patterns: &[S], reason: &str) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::EmptyRule(name.to_string()));
        }
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| Error::InvalidPattern {
                    rule: name.to_string(),
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            patterns,
            reason: reason.to_string(),
        })
    }

    /// Compile a rule from its configuration entry.
    pub fn from_config(cfg: &RuleConfig) -> Result<Self> {
        Self::new(&cfg.name, &cfg.patterns, &cfg.reason)
    }

    /// Name reported in `Decision::Block` and the decision log.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reason surfaced to the host when this rule blocks.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Test the raw command text. No tokenization, case-sensitive.
    pub fn matches(&self, command: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(command))
    }
}
