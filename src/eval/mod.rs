pub mod decision;
pub mod rule;

pub use decision::Decision;
pub use rule::Rule;

use crate::config::Config;
use crate::error::Result;

/// Ordered, immutable rule set. The first matching rule decides.
#[derive(Debug, Clone)]
pub struct Guard {
    rules: Vec<Rule>,
}

impl Guard {
    /// Build a guard from already-compiled rules, keeping their order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile the configured rules in order.
    pub fn from_config(config: &Config) -> Result<Self> {
        let rules = config
            .rules
            .iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate a raw command string.
    pub fn evaluate(&self, command: &str) -> Decision {
        self.rules
            .iter()
            .find(|rule| rule.matches(command))
            .map_or(Decision::Allow, |rule| Decision::Block {
                rule: rule.name().to_string(),
                reason: rule.reason().to_string(),
            })
    }
}
