/// Outcome of evaluating one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block {
        /// Name of the rule that fired.
        rule: String,
        /// Human-readable reason surfaced to the operator or agent.
        reason: String,
    },
}

impl Decision {
    /// Lowercase name used in the decision log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Block { .. } => "block",
        }
    }

    /// Uppercase name printed by `--check`.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Block { .. } => "BLOCK",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block { .. })
    }

    /// The block reason, or `None` for an allowed command.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::Block { reason, .. } => Some(reason.as_str()),
        }
    }

    /// The name of the rule that blocked, or `None` for an allowed command.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::Block { rule, .. } => Some(rule.as_str()),
        }
    }
}
